//! 作业大纲（`/courses/{c}/assignments/{a}/outline/edit`）

use scraper::Html;
use serde_json::Value;

use crate::error::{EntityType, ExtractionFailure};
use crate::extractors::text::{json_f64, json_string, react_props};
use crate::models::{Assignment, Question, QuestionId, QuestionKind};

pub const OUTLINE_ANCHOR: &str = r#"div[data-react-class="AssignmentOutline"]"#;

/// 提取题目树（顶层题目按文档顺序）
pub fn extract_outline(
    html: &str,
    assignment: &Assignment,
) -> Result<Vec<Question>, ExtractionFailure> {
    let document = Html::parse_document(html);
    let props = react_props(&document, EntityType::Question, OUTLINE_ANCHOR)?;
    let outline = props
        .get("outline")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ExtractionFailure::invalid(
                EntityType::Question,
                OUTLINE_ANCHOR,
                format!("作业 {} 缺少 outline", assignment.id),
            )
        })?;

    outline.iter().map(parse_question).collect()
}

fn parse_question(node: &Value) -> Result<Question, ExtractionFailure> {
    let id = json_string(node.get("id")).ok_or_else(|| {
        ExtractionFailure::invalid(EntityType::Question, OUTLINE_ANCHOR, "题目缺少 id")
    })?;
    let children = node
        .get("children")
        .and_then(Value::as_array)
        .map(|nodes| nodes.iter().map(parse_question).collect::<Result<Vec<_>, _>>())
        .transpose()?
        .unwrap_or_default();

    Ok(Question {
        title: json_string(node.get("title")).unwrap_or_default(),
        weight: json_f64(node.get("weight")),
        kind: json_string(node.get("type"))
            .map(|t| QuestionKind::from_type(&t))
            .unwrap_or(QuestionKind::FreeResponse),
        parent_id: json_string(node.get("parent_id")).map(QuestionId::new),
        id: QuestionId::new(id),
        children,
    })
}
