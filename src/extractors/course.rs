//! 账户页（`/account`）课程列表
//!
//! 页面结构：
//! ```text
//! h1.pageHeading "Instructor Courses"
//! div.courseList
//!   div.courseList--term "Fall 2024"
//!   div.courseList--coursesForTerm
//!     a.courseBox[href="/courses/123"]
//!       h3.courseBox--shortname / div.courseBox--name / div.courseBox--assignments
//! h2.pageHeading "Student Courses"
//! div.courseList ...
//! ```

use scraper::{ElementRef, Html};
use tracing::debug;

use crate::error::{EntityType, ExtractionFailure};
use crate::extractors::text::{
    attr, element_text, first_in, has_class, id_after, leading_count, selector, text_of,
};
use crate::models::{Course, CourseId, CourseRole};

pub const COURSE_LIST_ANCHOR: &str = "div.courseList";
pub const HEADING_OR_LIST: &str = ".pageHeading, div.courseList";
pub const COURSE_BOX_ANCHOR: &str = "a.courseBox";
pub const COURSE_NAME: &str = ".courseBox--name";
pub const COURSE_SHORT_NAME: &str = ".courseBox--shortname";
pub const COURSE_ASSIGNMENTS: &str = ".courseBox--assignments";

const TERM_CLASS: &str = "courseList--term";

/// 提取账户页中的全部课程，按文档顺序返回
pub fn extract_courses(html: &str) -> Result<Vec<Course>, ExtractionFailure> {
    let document = Html::parse_document(html);
    let walk = selector(EntityType::Course, HEADING_OR_LIST)?;
    let boxes = selector(EntityType::Course, COURSE_BOX_ANCHOR)?;

    let mut role = CourseRole::Student;
    let mut found_list = false;
    let mut courses = Vec::new();

    for element in document.select(&walk) {
        if has_class(element, "pageHeading") {
            role = CourseRole::from_heading(&element_text(element));
            continue;
        }

        found_list = true;
        let mut term: Option<String> = None;
        for child in element.children().filter_map(ElementRef::wrap) {
            if has_class(child, TERM_CLASS) {
                term = Some(element_text(child)).filter(|t| !t.is_empty());
                continue;
            }
            if child.value().name() == "a" && has_class(child, "courseBox") {
                courses.push(parse_course_box(child, role, term.clone())?);
            }
            for course_box in child.select(&boxes) {
                courses.push(parse_course_box(course_box, role, term.clone())?);
            }
        }
    }

    if !found_list {
        return Err(ExtractionFailure::missing(
            EntityType::Course,
            COURSE_LIST_ANCHOR,
        ));
    }

    debug!("📚 解析到 {} 门课程", courses.len());
    Ok(courses)
}

fn parse_course_box(
    course_box: ElementRef<'_>,
    role: CourseRole,
    term: Option<String>,
) -> Result<Course, ExtractionFailure> {
    let href = attr(course_box, "href").unwrap_or_default();
    let id = id_after(&href, "courses").ok_or_else(|| {
        ExtractionFailure::invalid(
            EntityType::Course,
            COURSE_BOX_ANCHOR,
            format!("无法从链接 '{}' 解析课程 ID", href),
        )
    })?;

    let name_sel = selector(EntityType::Course, COURSE_NAME)?;
    let short_sel = selector(EntityType::Course, COURSE_SHORT_NAME)?;
    let count_sel = selector(EntityType::Course, COURSE_ASSIGNMENTS)?;

    let short_name = text_of(first_in(course_box, &short_sel));
    let name = text_of(first_in(course_box, &name_sel))
        .or_else(|| short_name.clone())
        .ok_or_else(|| ExtractionFailure::missing(EntityType::Course, COURSE_NAME))?;
    let assignment_count =
        text_of(first_in(course_box, &count_sel)).and_then(|t| leading_count(&t));

    Ok(Course {
        id: CourseId::new(id),
        name,
        short_name,
        term,
        role,
        assignment_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT_PAGE: &str = r#"
    <html><body>
      <h1 class="pageHeading">Instructor Courses</h1>
      <div class="courseList">
        <div class="courseList--term">Fall 2024</div>
        <div class="courseList--coursesForTerm">
          <a class="courseBox" href="/courses/101">
            <h3 class="courseBox--shortname">CS 101</h3>
            <div class="courseBox--name">Intro &amp; Programming</div>
            <div class="courseBox--assignments">4 assignments</div>
          </a>
          <a class="courseBox" href="/courses/102">
            <h3 class="courseBox--shortname">CS 102</h3>
            <div class="courseBox--name">Data Structures</div>
          </a>
        </div>
        <div class="courseList--term">Spring 2024</div>
        <div class="courseList--coursesForTerm">
          <a class="courseBox" href="/courses/90">
            <h3 class="courseBox--shortname">CS 90</h3>
            <div class="courseBox--name">  Old
               Course </div>
          </a>
        </div>
      </div>
      <h2 class="pageHeading">Student Courses</h2>
      <div class="courseList">
        <div class="courseList--term">Fall 2024</div>
        <div class="courseList--coursesForTerm">
          <a class="courseBox" href="/courses/555">
            <h3 class="courseBox--shortname">MATH 1</h3>
            <div class="courseBox--name">Calculus</div>
          </a>
        </div>
      </div>
    </body></html>
    "#;

    #[test]
    fn test_extract_courses_in_document_order() {
        let courses = extract_courses(ACCOUNT_PAGE).unwrap();
        let ids: Vec<&str> = courses.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["101", "102", "90", "555"]);

        assert_eq!(courses[0].name, "Intro & Programming");
        assert_eq!(courses[0].short_name.as_deref(), Some("CS 101"));
        assert_eq!(courses[0].term.as_deref(), Some("Fall 2024"));
        assert_eq!(courses[0].assignment_count, Some(4));
        assert_eq!(courses[0].role, CourseRole::Instructor);

        assert_eq!(courses[1].assignment_count, None);
        assert_eq!(courses[2].name, "Old Course");
        assert_eq!(courses[2].term.as_deref(), Some("Spring 2024"));

        assert_eq!(courses[3].role, CourseRole::Student);
        assert_eq!(courses[3].term.as_deref(), Some("Fall 2024"));
    }

    #[test]
    fn test_extract_courses_is_idempotent() {
        assert_eq!(
            extract_courses(ACCOUNT_PAGE).unwrap(),
            extract_courses(ACCOUNT_PAGE).unwrap()
        );
    }

    #[test]
    fn test_student_only_account() {
        let html = r#"
          <h1 class="pageHeading">Your Courses</h1>
          <div class="courseList">
            <div class="courseList--coursesForTerm">
              <a class="courseBox" href="/courses/7"><div class="courseBox--name">Physics</div></a>
            </div>
          </div>"#;
        let courses = extract_courses(html).unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].role, CourseRole::Student);
        assert_eq!(courses[0].term, None);
        assert_eq!(courses[0].short_name, None);
    }

    #[test]
    fn test_missing_course_list_names_anchor() {
        let err = extract_courses("<html><body><h1>Log In</h1></body></html>").unwrap_err();
        assert_eq!(err.entity_type, EntityType::Course);
        assert_eq!(err.anchor_name, COURSE_LIST_ANCHOR);
    }

    #[test]
    fn test_non_link_course_box_is_ignored() {
        let html = r#"
          <h1 class="pageHeading">Instructor Courses</h1>
          <div class="courseList">
            <button class="courseBox courseBox--add" type="button">Create a new course</button>
            <a class="courseBox" href="/courses/9"><div class="courseBox--name">Compilers</div></a>
          </div>"#;
        let courses = extract_courses(html).unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].id, "9");
        assert_eq!(courses[0].role, CourseRole::Instructor);
    }

    #[test]
    fn test_course_box_without_id_fails() {
        let html = r#"<div class="courseList"><div><a class="courseBox" href="/courses/new">
            <div class="courseBox--name">X</div></a></div></div>"#;
        let err = extract_courses(html).unwrap_err();
        assert_eq!(err.anchor_name, COURSE_BOX_ANCHOR);
        assert!(err.detail.is_some());
    }
}
