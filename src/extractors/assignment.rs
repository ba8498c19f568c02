//! 作业列表
//!
//! - 教师视图：`/courses/{id}/assignments` 中 `AssignmentsTable` 组件的 React props
//! - 学生视图：`/courses/{id}` 中的 `table#assignments-student-table`

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{EntityType, ExtractionFailure};
use crate::extractors::text::{
    attr, first, first_in, id_after, json_bool, json_f64, json_string, json_u32,
    parse_score_fraction, parse_timestamp, react_props, selector, text_of,
};
use crate::models::{Assignment, AssignmentId, CourseId, SubmissionId};

pub const INSTRUCTOR_TABLE_ANCHOR: &str = r#"div[data-react-class="AssignmentsTable"]"#;
pub const STUDENT_TABLE_ANCHOR: &str = "table#assignments-student-table";
pub const STUDENT_ROW: &str = "table#assignments-student-table tbody tr";
pub const ROW_NAME: &str = "th.table--primaryLink";
pub const ROW_LINK: &str = "a[href]";
pub const ROW_ASSIGNMENT_ID: &str = "[data-assignment-id]";
pub const ROW_SCORE: &str = ".submissionStatus--score";
pub const ROW_STATUS: &str = ".submissionStatus--text";
pub const ROW_RELEASE_DATE: &str = "time.submissionTimeChart--releaseDate";
pub const ROW_DUE_DATE: &str = "time.submissionTimeChart--dueDate";
pub const ROW_LATE_DUE_DATE: &str = "time.submissionTimeChart--lateDueDate";

/// 教师视图作业列表
pub fn extract_instructor_assignments(
    html: &str,
    course_id: &CourseId,
) -> Result<Vec<Assignment>, ExtractionFailure> {
    let document = Html::parse_document(html);
    let props = react_props(&document, EntityType::Assignment, INSTRUCTOR_TABLE_ANCHOR)?;
    let rows = props
        .get("table_data")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ExtractionFailure::invalid(
                EntityType::Assignment,
                INSTRUCTOR_TABLE_ANCHOR,
                "缺少 table_data",
            )
        })?;

    let id_re = Regex::new(r"^assignment_(\d+)$").map_err(|e| {
        ExtractionFailure::invalid(EntityType::Assignment, INSTRUCTOR_TABLE_ANCHOR, e.to_string())
    })?;

    let mut assignments = Vec::with_capacity(rows.len());
    for row in rows {
        let raw_id = json_string(row.get("id")).unwrap_or_default();
        let id = id_re
            .captures(&raw_id)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                ExtractionFailure::invalid(
                    EntityType::Assignment,
                    INSTRUCTOR_TABLE_ANCHOR,
                    format!("无法解析作业 ID '{}'", raw_id),
                )
            })?;
        let name = json_string(row.get("title")).ok_or_else(|| {
            ExtractionFailure::invalid(
                EntityType::Assignment,
                INSTRUCTOR_TABLE_ANCHOR,
                format!("作业 {} 缺少 title", id),
            )
        })?;

        let window = row.get("submission_window");
        let window_time = |key: &str| {
            window
                .and_then(|w| w.get(key))
                .and_then(Value::as_str)
                .and_then(parse_timestamp)
        };

        assignments.push(Assignment {
            id: AssignmentId::new(id),
            course_id: course_id.clone(),
            name,
            release_date: window_time("release_date"),
            due_date: window_time("due_date"),
            hard_due_date: window_time("hard_due_date"),
            time_limit_minutes: json_u32(window.and_then(|w| w.get("time_limit"))),
            points_possible: json_f64(row.get("total_points")),
            submission_count: json_u32(row.get("num_active_submissions")),
            percent_graded: json_f64(row.get("grading_progress")),
            regrades_enabled: json_bool(row.get("regrade_requests_possible")),
        });
    }

    debug!("📝 课程 {} 解析到 {} 个作业（教师视图）", course_id, assignments.len());
    Ok(assignments)
}

/// 学生视图中作业表的一行
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StudentRow {
    pub assignment: Assignment,
    pub submission_id: Option<SubmissionId>,
    pub score: Option<f64>,
    pub status_text: Option<String>,
}

/// 解析学生视图作业表
///
/// 没有作业 ID 的行（如尚未开放的作业）会被跳过
pub(crate) fn extract_student_rows(
    html: &str,
    course_id: &CourseId,
    entity: EntityType,
) -> Result<Vec<StudentRow>, ExtractionFailure> {
    let document = Html::parse_document(html);
    if first(&document, entity, STUDENT_TABLE_ANCHOR)?.is_none() {
        return Err(ExtractionFailure::missing(entity, STUDENT_TABLE_ANCHOR));
    }

    let row_sel = selector(entity, STUDENT_ROW)?;
    let mut rows = Vec::new();
    for (index, row) in document.select(&row_sel).enumerate() {
        match parse_student_row(row, course_id, entity)? {
            Some(parsed) => rows.push(parsed),
            None => warn!("⚠️ 课程 {} 作业表第 {} 行没有作业 ID，已跳过", course_id, index + 1),
        }
    }
    Ok(rows)
}

fn parse_student_row(
    row: ElementRef<'_>,
    course_id: &CourseId,
    entity: EntityType,
) -> Result<Option<StudentRow>, ExtractionFailure> {
    let name_sel = selector(entity, ROW_NAME)?;
    let link_sel = selector(entity, ROW_LINK)?;
    let data_id_sel = selector(entity, ROW_ASSIGNMENT_ID)?;
    let score_sel = selector(entity, ROW_SCORE)?;
    let status_sel = selector(entity, ROW_STATUS)?;
    let release_sel = selector(entity, ROW_RELEASE_DATE)?;
    let due_sel = selector(entity, ROW_DUE_DATE)?;
    let late_sel = selector(entity, ROW_LATE_DUE_DATE)?;

    let href = first_in(row, &link_sel).and_then(|a| attr(a, "href"));
    let assignment_id = href
        .as_deref()
        .and_then(|h| id_after(h, "assignments"))
        .or_else(|| first_in(row, &data_id_sel).and_then(|el| attr(el, "data-assignment-id")));
    let Some(assignment_id) = assignment_id else {
        return Ok(None);
    };

    let name = text_of(first_in(row, &name_sel)).ok_or_else(|| {
        ExtractionFailure::invalid(
            entity,
            ROW_NAME,
            format!("作业 {} 缺少名称", assignment_id),
        )
    })?;

    let (score, max_points) = text_of(first_in(row, &score_sel))
        .and_then(|t| parse_score_fraction(&t))
        .unwrap_or((None, None));
    let time_attr = |sel: &Selector| {
        first_in(row, sel)
            .and_then(|el| attr(el, "datetime"))
            .and_then(|t| parse_timestamp(&t))
    };

    Ok(Some(StudentRow {
        assignment: Assignment {
            id: AssignmentId::new(assignment_id),
            course_id: course_id.clone(),
            name,
            release_date: time_attr(&release_sel),
            due_date: time_attr(&due_sel),
            hard_due_date: time_attr(&late_sel),
            time_limit_minutes: None,
            points_possible: max_points,
            submission_count: None,
            percent_graded: None,
            regrades_enabled: None,
        },
        submission_id: href
            .as_deref()
            .and_then(|h| id_after(h, "submissions"))
            .map(SubmissionId::new),
        score,
        status_text: text_of(first_in(row, &status_sel)),
    }))
}

/// 学生视图作业列表
pub fn extract_student_assignments(
    html: &str,
    course_id: &CourseId,
) -> Result<Vec<Assignment>, ExtractionFailure> {
    let rows = extract_student_rows(html, course_id, EntityType::Assignment)?;
    debug!("📝 课程 {} 解析到 {} 个作业（学生视图）", course_id, rows.len());
    Ok(rows.into_iter().map(|r| r.assignment).collect())
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const STUDENT_COURSE_PAGE: &str = r#"
    <html><body>
    <table id="assignments-student-table">
      <thead><tr><th>Name</th><th>Status</th><th>Released</th></tr></thead>
      <tbody>
        <tr>
          <th class="table--primaryLink" scope="row">
            <a href="/courses/5/assignments/11/submissions/901">Homework 1</a>
          </th>
          <td class="submissionStatus"><div class="submissionStatus--score">8.0 / 10.0</div></td>
          <td class="submissionTimeChart">
            <time class="submissionTimeChart--releaseDate" datetime="2024-01-01 00:00:00 -0800">Jan 01</time>
            <time class="submissionTimeChart--dueDate" datetime="2024-01-08 23:59:00 -0800">Jan 08</time>
            <time class="submissionTimeChart--lateDueDate" datetime="2024-01-10 23:59:00 -0800">Jan 10</time>
          </td>
        </tr>
        <tr>
          <th class="table--primaryLink" scope="row">
            <button class="js-submitAssignment" data-assignment-id="12">Homework 2</button>
          </th>
          <td class="submissionStatus"><div class="submissionStatus--text">No Submission</div></td>
          <td class="submissionTimeChart">
            <time class="submissionTimeChart--dueDate" datetime="2024-01-15 23:59:00 -0800">Jan 15</time>
          </td>
        </tr>
        <tr>
          <th class="table--primaryLink" scope="row">Lab 0</th>
          <td class="submissionStatus"><div class="submissionStatus--text">Not released</div></td>
        </tr>
        <tr>
          <th class="table--primaryLink" scope="row">
            <a href="/courses/5/assignments/13/submissions/902">Project</a>
          </th>
          <td class="submissionStatus"><div class="submissionStatus--text">Submitted</div></td>
        </tr>
      </tbody>
    </table>
    </body></html>
    "#;
}

#[cfg(test)]
mod tests {
    use super::fixtures::STUDENT_COURSE_PAGE;
    use super::*;

    fn course() -> CourseId {
        CourseId::new("5")
    }

    #[test]
    fn test_student_assignments() {
        let assignments = extract_student_assignments(STUDENT_COURSE_PAGE, &course()).unwrap();
        let ids: Vec<&str> = assignments.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["11", "12", "13"]);

        let hw1 = &assignments[0];
        assert_eq!(hw1.name, "Homework 1");
        assert_eq!(hw1.points_possible, Some(10.0));
        assert_eq!(
            hw1.due_date.map(|d| d.to_rfc3339()).as_deref(),
            Some("2024-01-08T23:59:00-08:00")
        );
        assert!(hw1.hard_due_date.is_some());
        assert_eq!(hw1.path(), "/courses/5/assignments/11");

        assert_eq!(assignments[1].points_possible, None);
        assert_eq!(assignments[1].release_date, None);
        assert_eq!(assignments[2].due_date, None);
    }

    #[test]
    fn test_student_rows_keep_submission_ids() {
        let rows = extract_student_rows(STUDENT_COURSE_PAGE, &course(), EntityType::Grade).unwrap();
        assert_eq!(rows[0].submission_id.as_ref().map(|s| s.as_str()), Some("901"));
        assert_eq!(rows[0].score, Some(8.0));
        assert_eq!(rows[1].submission_id, None);
        assert_eq!(rows[1].status_text.as_deref(), Some("No Submission"));
    }

    #[test]
    fn test_missing_student_table() {
        let err = extract_student_assignments("<html></html>", &course()).unwrap_err();
        assert_eq!(err.anchor_name, STUDENT_TABLE_ANCHOR);
        assert_eq!(err.entity_type, EntityType::Assignment);
    }

    #[test]
    fn test_instructor_assignments() {
        let props = serde_json::json!({
            "table_data": [
                {
                    "id": "assignment_42",
                    "title": "Midterm",
                    "total_points": "100.0",
                    "num_active_submissions": 87,
                    "grading_progress": 55,
                    "regrade_requests_possible": true,
                    "submission_window": {
                        "release_date": "2024-02-01T09:00:00-08:00",
                        "due_date": "2024-02-01T11:00:00-08:00",
                        "hard_due_date": null,
                        "time_limit": 120
                    }
                },
                { "id": "assignment_43", "title": "Quiz 1", "total_points": 5 }
            ]
        });
        let html = format!(
            r#"<div data-react-class="AssignmentsTable" data-react-props='{}'></div>"#,
            props
        );

        let assignments = extract_instructor_assignments(&html, &course()).unwrap();
        assert_eq!(assignments.len(), 2);
        let midterm = &assignments[0];
        assert_eq!(midterm.id, "42");
        assert_eq!(midterm.points_possible, Some(100.0));
        assert_eq!(midterm.submission_count, Some(87));
        assert_eq!(midterm.percent_graded, Some(55.0));
        assert_eq!(midterm.regrades_enabled, Some(true));
        assert_eq!(midterm.time_limit_minutes, Some(120));
        assert_eq!(midterm.hard_due_date, None);
        assert_eq!(midterm.effective_hard_due_date(), midterm.due_date);

        assert_eq!(assignments[1].name, "Quiz 1");
        assert_eq!(assignments[1].due_date, None);
        assert_eq!(assignments[1].regrades_enabled, None);
    }

    #[test]
    fn test_instructor_bad_row_id() {
        let html = r#"<div data-react-class="AssignmentsTable"
            data-react-props='{"table_data":[{"id":"section_1","title":"x"}]}'></div>"#;
        let err = extract_instructor_assignments(html, &course()).unwrap_err();
        assert_eq!(err.anchor_name, INSTRUCTOR_TABLE_ANCHOR);
        assert!(err.detail.unwrap().contains("section_1"));
    }

    #[test]
    fn test_instructor_missing_component() {
        let err = extract_instructor_assignments("<div></div>", &course()).unwrap_err();
        assert_eq!(err.anchor_name, INSTRUCTOR_TABLE_ANCHOR);
        assert_eq!(err.detail, None);
    }
}
