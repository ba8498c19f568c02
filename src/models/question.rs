use serde::Serialize;

use crate::models::ids::QuestionId;

/// 题目类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    FreeResponse,
    /// 题组（包含子题）
    Group,
    Other(String),
}

impl QuestionKind {
    /// 从大纲中的 `type` 字段解析
    pub fn from_type(s: &str) -> Self {
        match s {
            "FreeResponseQuestion" => QuestionKind::FreeResponse,
            "QuestionGroup" => QuestionKind::Group,
            other => QuestionKind::Other(other.to_string()),
        }
    }
}

/// 作业大纲中的题目（树形结构）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    pub id: QuestionId,
    pub title: String,
    /// 分值
    pub weight: Option<f64>,
    pub kind: QuestionKind,
    pub parent_id: Option<QuestionId>,
    pub children: Vec<Question>,
}

impl Question {
    /// 在以当前题目为根的子树中查找
    pub fn find(&self, id: &str) -> Option<&Question> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// 先序遍历子树中的所有题目
    pub fn flatten(&self) -> Vec<&Question> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.flatten());
        }
        out
    }
}
