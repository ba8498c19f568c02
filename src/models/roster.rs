use serde::Serialize;

use crate::models::ids::{CourseId, MembershipId};

/// 课程成员角色（数值与平台表单中的 `course_membership[role]` 一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    /// 学生
    Student = 0,
    /// 教师
    Instructor = 1,
    /// 助教
    Ta = 2,
    /// 阅卷人
    Reader = 3,
}

impl MemberRole {
    /// 获取角色代码
    pub fn code(self) -> u8 {
        self as u8
    }

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            MemberRole::Student => "Student",
            MemberRole::Instructor => "Instructor",
            MemberRole::Ta => "TA",
            MemberRole::Reader => "Reader",
        }
    }

    /// 从代码解析角色
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(MemberRole::Student),
            1 => Some(MemberRole::Instructor),
            2 => Some(MemberRole::Ta),
            3 => Some(MemberRole::Reader),
            _ => None,
        }
    }

    /// 从名称解析角色（忽略大小写）
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "student" => Some(MemberRole::Student),
            "instructor" => Some(MemberRole::Instructor),
            "ta" | "teaching assistant" => Some(MemberRole::Ta),
            "reader" => Some(MemberRole::Reader),
            _ => None,
        }
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 课程成员
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterMember {
    /// 所属课程（仅引用 ID）
    pub course_id: CourseId,
    pub membership_id: MembershipId,
    pub name: String,
    /// 邮箱，平台内唯一
    pub email: String,
    /// 学号
    pub sid: Option<String>,
    pub role: MemberRole,
}

impl RosterMember {
    /// 修改角色后的新成员记录
    pub fn with_role(&self, role: MemberRole) -> Self {
        Self {
            role,
            ..self.clone()
        }
    }

    /// 成员关系路径
    pub fn path(&self) -> String {
        format!("/courses/{}/memberships/{}", self.course_id, self.membership_id)
    }
}

/// 新增成员的参数
#[derive(Debug, Clone)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub sid: Option<String>,
    pub role: MemberRole,
    /// 是否发送邮件通知
    pub notify: bool,
}
