//! 单个学生的作业延期

use chrono::{DateTime, Duration, FixedOffset};
use serde_json::{json, Map, Value};

use crate::models::assignment::Assignment;
use crate::models::ids::UserId;

/// 平台接受的时间格式（不带时区，按课程时区解释）
const EXTENSION_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// 延期设置
///
/// 绝对时间与偏移量可以同时给出：先取绝对时间（缺省为作业原值），再加偏移量。
/// `Extension::default()` 表示恢复作业的原始设置，即撤销延期。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extension {
    pub release_date: Option<DateTime<FixedOffset>>,
    pub due_date: Option<DateTime<FixedOffset>>,
    /// 迟交截止时间
    pub hard_due_date: Option<DateTime<FixedOffset>>,
    pub time_limit_minutes: Option<u32>,
    pub release_delta: Option<Duration>,
    pub due_delta: Option<Duration>,
    pub hard_due_delta: Option<Duration>,
    /// 限时作业时长的倍数（如 1.5 倍时长）
    pub limit_multiplier: Option<f64>,
}

impl Extension {
    /// 截止时间与迟交截止时间都顺延 `delta`
    pub fn extend_due(delta: Duration) -> Self {
        Self {
            due_delta: Some(delta),
            hard_due_delta: Some(delta),
            ..Self::default()
        }
    }

    /// 限时作业时长乘以 `multiplier`
    pub fn time_multiplier(multiplier: f64) -> Self {
        Self {
            limit_multiplier: Some(multiplier),
            ..Self::default()
        }
    }

    /// 生成提交给平台的 `settings`
    ///
    /// 只包含与作业原值不同的字段，另外总是带上 `visible: true`
    pub fn settings(&self, assignment: &Assignment) -> Map<String, Value> {
        let shift = |time: Option<DateTime<FixedOffset>>, delta: Option<Duration>| match delta {
            Some(delta) => time.map(|t| t + delta),
            None => time,
        };

        let release = shift(self.release_date.or(assignment.release_date), self.release_delta);
        let due = shift(self.due_date.or(assignment.due_date), self.due_delta);
        let hard_due = shift(
            self.hard_due_date.or(assignment.effective_hard_due_date()),
            self.hard_due_delta,
        );
        let mut limit = self.time_limit_minutes.or(assignment.time_limit_minutes);
        if let Some(multiplier) = self.limit_multiplier {
            limit = limit.map(|minutes| (f64::from(minutes) * multiplier).round() as u32);
        }

        let mut settings = Map::new();
        settings.insert("visible".to_string(), Value::Bool(true));
        insert_date(&mut settings, "release_date", release, assignment.release_date);
        insert_date(&mut settings, "due_date", due, assignment.due_date);
        insert_date(&mut settings, "hard_due_date", hard_due, assignment.hard_due_date);
        if limit != assignment.time_limit_minutes {
            if let Some(minutes) = limit {
                settings.insert("time_limit_minutes".to_string(), json!(minutes));
            }
        }
        settings
    }
}

fn insert_date(
    settings: &mut Map<String, Value>,
    key: &str,
    value: Option<DateTime<FixedOffset>>,
    original: Option<DateTime<FixedOffset>>,
) {
    if value == original {
        return;
    }
    if let Some(time) = value {
        settings.insert(
            key.to_string(),
            json!({
                "type": "absolute",
                "value": time.format(EXTENSION_DATE_FORMAT).to_string(),
            }),
        );
    }
}

/// 延期页面中可以设置延期的学生
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionStudent {
    /// 平台用户 ID（不是成员关系 ID）
    pub user_id: UserId,
    pub email: String,
    pub name: Option<String>,
}
