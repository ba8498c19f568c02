//! 仓储层：以课程、作业、提交等实体为单位的操作

pub mod gradescope;
pub mod pagination;

pub use gradescope::GradescopeRepository;
pub use pagination::{PageFailure, Paged, PartialResult};
