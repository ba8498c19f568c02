use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::models::ids::{AssignmentId, CourseId};

/// 作业
///
/// 教师视图与学生视图可获取的字段不同，缺失的字段为 `None`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub id: AssignmentId,
    /// 所属课程（仅引用 ID）
    pub course_id: CourseId,
    pub name: String,
    pub release_date: Option<DateTime<FixedOffset>>,
    pub due_date: Option<DateTime<FixedOffset>>,
    /// 迟交截止时间
    pub hard_due_date: Option<DateTime<FixedOffset>>,
    /// 限时作业的时长（分钟）
    pub time_limit_minutes: Option<u32>,
    pub points_possible: Option<f64>,
    /// 有效提交数（仅教师视图）
    pub submission_count: Option<u32>,
    /// 批改进度百分比（仅教师视图）
    pub percent_graded: Option<f64>,
    /// 是否开放复核申请（仅教师视图）
    pub regrades_enabled: Option<bool>,
}

impl Assignment {
    /// 作业页面路径
    pub fn path(&self) -> String {
        format!("/courses/{}/assignments/{}", self.course_id, self.id)
    }

    /// 提交列表路径
    pub fn submissions_path(&self) -> String {
        format!("{}/submissions", self.path())
    }

    /// 最终截止时间：没有迟交截止时间时等于截止时间
    pub fn effective_hard_due_date(&self) -> Option<DateTime<FixedOffset>> {
        self.hard_due_date.or(self.due_date)
    }
}

impl std::fmt::Display for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
