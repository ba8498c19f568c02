use serde::Serialize;

use crate::models::ids::{AssignmentId, CourseId, SubmissionId};
use crate::models::submission::SubmissionStatus;

/// 学生视角的单项成绩（课程页作业表中的一行）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grade {
    pub course_id: CourseId,
    pub assignment_id: AssignmentId,
    pub assignment_name: String,
    /// 有提交时才有提交 ID
    pub submission_id: Option<SubmissionId>,
    pub score: Option<f64>,
    pub max_points: Option<f64>,
    pub status: SubmissionStatus,
}

impl Grade {
    /// 得分率（0.0 ~ 1.0），缺少分数或满分为 0 时为 `None`
    pub fn ratio(&self) -> Option<f64> {
        match (self.score, self.max_points) {
            (Some(score), Some(max)) if max > 0.0 => Some(score / max),
            _ => None,
        }
    }
}
