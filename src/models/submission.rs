use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::models::ids::{AssignmentId, QuestionId, SubmissionId};

/// 提交状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// 已批改
    Graded,
    /// 已提交，未批改
    Submitted,
    /// 迟交
    Late,
    /// 未提交
    Missing,
    /// 无法识别的状态文本（原样保留）
    Other(String),
}

impl SubmissionStatus {
    /// 从页面上的状态文本解析
    pub fn from_text(text: &str) -> Self {
        let lower = text.trim().to_lowercase();
        if lower.contains("no submission") || lower == "missing" {
            SubmissionStatus::Missing
        } else if lower.contains("late") {
            SubmissionStatus::Late
        } else if lower.contains("ungraded") || lower.contains("submitted") {
            SubmissionStatus::Submitted
        } else if lower.contains("graded") {
            SubmissionStatus::Graded
        } else {
            SubmissionStatus::Other(text.trim().to_string())
        }
    }

    /// 根据状态文本和分数推断
    ///
    /// 状态文本优先；没有文本时，有分数视为已批改，否则视为 `fallback`
    pub fn infer(text: Option<&str>, score: Option<f64>, fallback: SubmissionStatus) -> Self {
        match text {
            Some(t) if !t.trim().is_empty() => Self::from_text(t),
            _ if score.is_some() => SubmissionStatus::Graded,
            _ => fallback,
        }
    }
}

/// 提交者
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submitter {
    pub name: String,
    pub email: Option<String>,
}

/// 提交列表中的一条提交
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub id: SubmissionId,
    /// 所属作业（仅引用 ID）
    pub assignment_id: AssignmentId,
    pub submitter: Submitter,
    pub submitted_at: Option<DateTime<FixedOffset>>,
    pub status: SubmissionStatus,
    /// 未批改时为 `None`
    pub score: Option<f64>,
}

/// 单题得分
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionScore {
    pub question_id: QuestionId,
    pub title: Option<String>,
    pub score: Option<f64>,
    pub max_points: Option<f64>,
}

/// 提交详情页
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionDetail {
    pub id: SubmissionId,
    pub assignment_id: AssignmentId,
    /// 小组提交时有多个提交者
    pub owners: Vec<Submitter>,
    pub submitted_at: Option<DateTime<FixedOffset>>,
    pub status: SubmissionStatus,
    pub score: Option<f64>,
    pub max_points: Option<f64>,
    pub question_scores: Vec<QuestionScore>,
}
