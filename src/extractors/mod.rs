//! 页面解析层
//!
//! 纯函数：输入 HTML 文本，输出实体或 `ExtractionFailure`。所有锚点都是具名常量，
//! 页面结构变化时错误信息会指出缺失的锚点。
//!
//! 共同规则：
//! - 可选字段缺失时为 `None`
//! - 必需锚点缺失时整体失败
//! - 多个匹配时取文档顺序中的第一个
//! - 文本去除首尾空白并合并连续空白，HTML 实体已解码

pub mod assignment;
pub mod course;
pub mod extension;
pub mod grade;
pub mod login;
pub mod outline;
pub mod roster;
pub mod submission;
mod text;

pub use assignment::{extract_instructor_assignments, extract_student_assignments};
pub use course::extract_courses;
pub use extension::extract_extension_students;
pub use grade::extract_grades;
pub use login::{extract_login_csrf, extract_page_csrf};
pub use outline::extract_outline;
pub use roster::extract_roster;
pub use submission::{extract_submission_detail, extract_submissions, SubmissionPage};
