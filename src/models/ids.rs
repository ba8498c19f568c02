//! 实体 ID
//!
//! ID 只能由本 crate 的解析器构造，调用方只能使用此前解析得到的 ID，不能凭空伪造。

use serde::Serialize;
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub(crate) fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

entity_id!(
    /// 课程 ID（`/courses/{id}`）
    CourseId
);
entity_id!(
    /// 作业 ID（`/courses/{course}/assignments/{id}`）
    AssignmentId
);
entity_id!(
    /// 提交 ID
    SubmissionId
);
entity_id!(
    /// 课程成员关系 ID（用于修改角色 / 移除成员）
    MembershipId
);
entity_id!(
    /// 题目 ID
    QuestionId
);
entity_id!(
    /// 平台用户 ID（延期等按用户而不是按成员关系设置）
    UserId
);
