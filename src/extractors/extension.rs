//! 作业延期页（`/courses/{c}/assignments/{a}/extensions`）

use scraper::Html;
use serde_json::Value;
use tracing::debug;

use crate::error::{EntityType, ExtractionFailure};
use crate::extractors::text::{json_string, react_props};
use crate::models::{ExtensionStudent, UserId};

pub const ADD_EXTENSION_ANCHOR: &str = r#"li[data-react-class="AddExtension"]"#;

/// 可设置延期的学生列表
pub fn extract_extension_students(html: &str) -> Result<Vec<ExtensionStudent>, ExtractionFailure> {
    let entity = EntityType::Extension;
    let document = Html::parse_document(html);
    let props = react_props(&document, entity, ADD_EXTENSION_ANCHOR)?;
    let rows = props
        .get("students")
        .and_then(Value::as_array)
        .ok_or_else(|| ExtractionFailure::invalid(entity, ADD_EXTENSION_ANCHOR, "缺少 students"))?;

    let students: Vec<ExtensionStudent> = rows
        .iter()
        .filter_map(|row| {
            Some(ExtensionStudent {
                user_id: UserId::new(json_string(row.get("id"))?),
                email: json_string(row.get("email"))?,
                name: json_string(row.get("name")),
            })
        })
        .collect();

    debug!("⏰ 延期页解析到 {} 名学生", students.len());
    Ok(students)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_extension_students() {
        let html = r#"<ul><li data-react-class="AddExtension" data-react-props='{"students":[
            {"id": 7001, "email": "alan@example.edu", "name": "Alan Turing"},
            {"id": 7002, "email": "grace@example.edu"},
            {"email": "no-id@example.edu"}
        ]}'></li></ul>"#;

        let students = extract_extension_students(html).unwrap();
        assert_eq!(students.len(), 2);
        assert_eq!(students[0].user_id, "7001");
        assert_eq!(students[0].name.as_deref(), Some("Alan Turing"));
        assert_eq!(students[1].email, "grace@example.edu");
        assert_eq!(students[1].name, None);
    }

    #[test]
    fn test_missing_add_extension_component() {
        let err = extract_extension_students("<ul></ul>").unwrap_err();
        assert_eq!(err.entity_type, EntityType::Extension);
        assert_eq!(err.anchor_name, ADD_EXTENSION_ANCHOR);
    }
}
