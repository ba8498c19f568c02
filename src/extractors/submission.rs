//! 提交列表与提交详情

use scraper::Html;
use serde_json::Value;
use tracing::debug;

use crate::error::{EntityType, ExtractionFailure};
use crate::extractors::text::{
    attr, first, first_in, id_after, json_f64, json_string, parse_number, parse_timestamp,
    react_props, selector, text_of,
};
use crate::models::{
    Assignment, QuestionId, QuestionScore, Submission, SubmissionDetail, SubmissionId,
    SubmissionStatus, Submitter,
};

pub const SUBMISSIONS_TABLE_ANCHOR: &str = "table#submissions-table";
pub const SUBMISSION_ROW: &str = "table#submissions-table tbody tr";
pub const SUBMISSION_LINK: &str = r#"a[href*="/submissions/"]"#;
pub const SUBMISSION_EMAIL: &str = "td.submissionsTable--email";
pub const SUBMISSION_SCORE: &str = "td.submissionsTable--score";
pub const SUBMISSION_STATUS: &str = "td.submissionsTable--status";
pub const SUBMISSION_TIME: &str = "time[datetime]";
pub const NEXT_PAGE_ANCHOR: &str = r#"a[rel="next"]"#;
pub const SUBMISSION_VIEWER_ANCHOR: &str = r#"div[data-react-class="AssignmentSubmissionViewer"]"#;

/// 提交列表中的一页
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionPage {
    pub submissions: Vec<Submission>,
    /// 下一页链接（站内路径或完整地址）
    pub next_page: Option<String>,
}

/// 提取提交列表的一页
///
/// 没有提交链接的行（未提交的学生）不属于提交，直接跳过
pub fn extract_submissions(
    html: &str,
    assignment: &Assignment,
) -> Result<SubmissionPage, ExtractionFailure> {
    let entity = EntityType::Submission;
    let document = Html::parse_document(html);
    if first(&document, entity, SUBMISSIONS_TABLE_ANCHOR)?.is_none() {
        return Err(ExtractionFailure::missing(entity, SUBMISSIONS_TABLE_ANCHOR));
    }

    let row_sel = selector(entity, SUBMISSION_ROW)?;
    let link_sel = selector(entity, SUBMISSION_LINK)?;
    let email_sel = selector(entity, SUBMISSION_EMAIL)?;
    let score_sel = selector(entity, SUBMISSION_SCORE)?;
    let status_sel = selector(entity, SUBMISSION_STATUS)?;
    let time_sel = selector(entity, SUBMISSION_TIME)?;

    let mut submissions = Vec::new();
    for row in document.select(&row_sel) {
        let Some(link) = first_in(row, &link_sel) else {
            continue;
        };
        let href = attr(link, "href").unwrap_or_default();
        let id = id_after(&href, "submissions").ok_or_else(|| {
            ExtractionFailure::invalid(
                entity,
                SUBMISSION_LINK,
                format!("无法从链接 '{}' 解析提交 ID", href),
            )
        })?;

        let score = text_of(first_in(row, &score_sel)).and_then(|t| parse_number(&t));
        let status_text = text_of(first_in(row, &status_sel));
        submissions.push(Submission {
            id: SubmissionId::new(id),
            assignment_id: assignment.id.clone(),
            submitter: Submitter {
                name: text_of(Some(link)).unwrap_or_default(),
                email: text_of(first_in(row, &email_sel)),
            },
            submitted_at: first_in(row, &time_sel)
                .and_then(|t| attr(t, "datetime"))
                .and_then(|t| parse_timestamp(&t)),
            status: SubmissionStatus::infer(
                status_text.as_deref(),
                score,
                SubmissionStatus::Submitted,
            ),
            score,
        });
    }

    let next_page = first(&document, entity, NEXT_PAGE_ANCHOR)?.and_then(|a| attr(a, "href"));
    debug!(
        "📄 作业 {} 本页解析到 {} 条提交{}",
        assignment.id,
        submissions.len(),
        if next_page.is_some() { "，还有下一页" } else { "" }
    );
    Ok(SubmissionPage {
        submissions,
        next_page,
    })
}

/// 提取提交详情
pub fn extract_submission_detail(
    html: &str,
    assignment: &Assignment,
) -> Result<SubmissionDetail, ExtractionFailure> {
    let entity = EntityType::Submission;
    let document = Html::parse_document(html);
    let props = react_props(&document, entity, SUBMISSION_VIEWER_ANCHOR)?;

    let submission = props.get("assignment_submission").ok_or_else(|| {
        ExtractionFailure::invalid(entity, SUBMISSION_VIEWER_ANCHOR, "缺少 assignment_submission")
    })?;
    let id = json_string(submission.get("id")).ok_or_else(|| {
        ExtractionFailure::invalid(entity, SUBMISSION_VIEWER_ANCHOR, "缺少提交 ID")
    })?;

    if let Some(page_assignment) = json_string(props.pointer("/assignment/id")) {
        if page_assignment != assignment.id.as_str() {
            return Err(ExtractionFailure::invalid(
                entity,
                SUBMISSION_VIEWER_ANCHOR,
                format!(
                    "提交 {} 属于作业 {}，而不是 {}",
                    id, page_assignment, assignment.id
                ),
            ));
        }
    }

    let owners = array(&props, "submission_owners")
        .iter()
        .filter_map(|owner| {
            let name = json_string(owner.get("name"))?;
            Some(Submitter {
                name,
                email: json_string(owner.get("email")),
            })
        })
        .collect();

    let questions = array(&props, "questions");
    let question_scores = array(&props, "question_submissions")
        .iter()
        .filter_map(|qs| {
            let question_id = json_string(qs.get("question_id"))?;
            let question = questions
                .iter()
                .find(|q| json_string(q.get("id")).as_deref() == Some(question_id.as_str()));
            Some(QuestionScore {
                title: question.and_then(|q| json_string(q.get("title"))),
                max_points: question.and_then(|q| json_f64(q.get("weight"))),
                question_id: QuestionId::new(question_id),
                score: json_f64(qs.get("score")),
            })
        })
        .collect();

    let score = json_f64(submission.get("score"));
    let status_text = json_string(submission.get("status"));
    Ok(SubmissionDetail {
        id: SubmissionId::new(id),
        assignment_id: assignment.id.clone(),
        owners,
        submitted_at: submission
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(parse_timestamp),
        status: SubmissionStatus::infer(status_text.as_deref(), score, SubmissionStatus::Submitted),
        score,
        max_points: json_f64(props.pointer("/assignment/total_points"))
            .or(assignment.points_possible),
        question_scores,
    })
}

fn array<'a>(props: &'a Value, key: &str) -> &'a [Value] {
    props
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
