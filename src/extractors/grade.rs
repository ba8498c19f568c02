//! 学生视图成绩（复用课程页作业表）

use tracing::debug;

use crate::error::{EntityType, ExtractionFailure};
use crate::extractors::assignment::extract_student_rows;
use crate::models::{CourseId, Grade, SubmissionStatus};

/// 提取课程页中每个作业的成绩
///
/// 没有状态文本时：有分数视为已批改，有提交视为已提交，否则视为未提交
pub fn extract_grades(html: &str, course_id: &CourseId) -> Result<Vec<Grade>, ExtractionFailure> {
    let rows = extract_student_rows(html, course_id, EntityType::Grade)?;
    let grades: Vec<Grade> = rows
        .into_iter()
        .map(|row| {
            let fallback = if row.submission_id.is_some() {
                SubmissionStatus::Submitted
            } else {
                SubmissionStatus::Missing
            };
            Grade {
                course_id: course_id.clone(),
                status: SubmissionStatus::infer(row.status_text.as_deref(), row.score, fallback),
                assignment_id: row.assignment.id,
                assignment_name: row.assignment.name,
                submission_id: row.submission_id,
                score: row.score,
                max_points: row.assignment.points_possible,
            }
        })
        .collect();

    debug!("📊 课程 {} 解析到 {} 条成绩", course_id, grades.len());
    Ok(grades)
}
