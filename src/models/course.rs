use serde::Serialize;

use crate::models::ids::CourseId;

/// 当前账号在课程中的身份
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseRole {
    /// 教师
    Instructor,
    /// 学生
    Student,
}

impl CourseRole {
    /// 根据课程列表标题判断身份
    ///
    /// 标题包含 "Instructor" 的课程列表属于教师身份，其余（"Student Courses"、
    /// "Your Courses"）均视为学生身份
    pub fn from_heading(heading: &str) -> Self {
        if heading.to_lowercase().contains("instructor") {
            CourseRole::Instructor
        } else {
            CourseRole::Student
        }
    }

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            CourseRole::Instructor => "Instructor",
            CourseRole::Student => "Student",
        }
    }
}

impl std::fmt::Display for CourseRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 加载课程时的过滤方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CourseSplit {
    Instructor,
    Student,
    #[default]
    All,
}

impl CourseSplit {
    /// 是否包含指定身份的课程
    pub fn includes(self, role: CourseRole) -> bool {
        match self {
            CourseSplit::All => true,
            CourseSplit::Instructor => role == CourseRole::Instructor,
            CourseSplit::Student => role == CourseRole::Student,
        }
    }
}

/// 课程
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Course {
    pub id: CourseId,
    /// 课程全称
    pub name: String,
    /// 课程简称（如 "CS 61A"）
    pub short_name: Option<String>,
    /// 学期（如 "Fall 2024"）
    pub term: Option<String>,
    pub role: CourseRole,
    /// 课程卡片上显示的作业数量
    pub assignment_count: Option<u32>,
}

impl Course {
    /// 课程页面路径
    pub fn path(&self) -> String {
        format!("/courses/{}", self.id)
    }

    /// 作业列表路径
    pub fn assignments_path(&self) -> String {
        format!("{}/assignments", self.path())
    }

    /// 成员列表路径
    pub fn memberships_path(&self) -> String {
        format!("{}/memberships", self.path())
    }

    /// 显示名称：优先使用简称
    pub fn display_name(&self) -> &str {
        self.short_name.as_deref().unwrap_or(&self.name)
    }
}

impl std::fmt::Display for Course {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.term {
            Some(term) => write!(f, "{} ({}, {}) [{}]", self.name, self.id, term, self.role),
            None => write!(f, "{} ({}) [{}]", self.name, self.id, self.role),
        }
    }
}
