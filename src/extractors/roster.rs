//! 课程成员列表（`/courses/{id}/memberships`）

use scraper::Html;
use serde_json::Value;
use tracing::debug;

use crate::error::{EntityType, ExtractionFailure};
use crate::extractors::text::{attr, first_in, json_string, selector};
use crate::models::{CourseId, MemberRole, MembershipId, RosterMember};

pub const ROSTER_ROW_ANCHOR: &str = "tr.rosterRow";
pub const ROSTER_EDIT_BUTTON: &str = "button.rosterCell--editIcon";

/// 提取成员列表
///
/// 成员数据来自每行编辑按钮上的属性：`data-cm`（JSON，含 full_name / sid）、
/// `data-id`、`data-email`、`data-role`
pub fn extract_roster(
    html: &str,
    course_id: &CourseId,
) -> Result<Vec<RosterMember>, ExtractionFailure> {
    let entity = EntityType::RosterMember;
    let document = Html::parse_document(html);
    let row_sel = selector(entity, ROSTER_ROW_ANCHOR)?;
    let button_sel = selector(entity, ROSTER_EDIT_BUTTON)?;

    let mut members = Vec::new();
    for row in document.select(&row_sel) {
        let button = first_in(row, &button_sel)
            .ok_or_else(|| ExtractionFailure::missing(entity, ROSTER_EDIT_BUTTON))?;
        let invalid =
            |detail: String| ExtractionFailure::invalid(entity, ROSTER_EDIT_BUTTON, detail);

        let data_cm: Value = button
            .value()
            .attr("data-cm")
            .map(serde_json::from_str::<Value>)
            .transpose()
            .map_err(|e| invalid(format!("data-cm 解析失败: {}", e)))?
            .unwrap_or(Value::Null);

        let membership_id = attr(button, "data-id").ok_or_else(|| invalid("缺少 data-id".into()))?;
        let email = attr(button, "data-email")
            .ok_or_else(|| invalid(format!("成员 {} 缺少 data-email", membership_id)))?;
        let role_code = attr(button, "data-role").unwrap_or_default();
        let role = role_code
            .parse::<u8>()
            .ok()
            .and_then(MemberRole::from_code)
            .ok_or_else(|| invalid(format!("成员 {} 的角色 '{}' 无法识别", email, role_code)))?;

        members.push(RosterMember {
            course_id: course_id.clone(),
            membership_id: MembershipId::new(membership_id),
            name: json_string(data_cm.get("full_name")).unwrap_or_else(|| email.clone()),
            sid: json_string(data_cm.get("sid")),
            email,
            role,
        });
    }

    if members.is_empty() {
        return Err(ExtractionFailure::missing(entity, ROSTER_ROW_ANCHOR));
    }

    debug!("👥 课程 {} 解析到 {} 名成员", course_id, members.len());
    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMBERSHIPS_PAGE: &str = r#"
    <table class="js-rosterTable">
      <tbody>
        <tr class="rosterRow">
          <td>Prof. Ada</td>
          <td><button class="rosterCell--editIcon" data-id="301" data-email="ada@example.edu"
               data-role="1" data-cm='{"full_name":"Ada Lovelace","sid":null}'></button></td>
        </tr>
        <tr class="rosterRow">
          <td>Alan</td>
          <td><button class="rosterCell--editIcon" data-id="302" data-email="alan@example.edu"
               data-role="0" data-cm='{"full_name":"Alan Turing","sid":"A123"}'></button></td>
        </tr>
        <tr class="rosterRow">
          <td><button class="rosterCell--editIcon" data-id="303" data-email="ta@example.edu"
               data-role="2"></button></td>
        </tr>
      </tbody>
    </table>"#;

    #[test]
    fn test_extract_roster() {
        let members = extract_roster(MEMBERSHIPS_PAGE, &CourseId::new("5")).unwrap();
        assert_eq!(members.len(), 3);

        assert_eq!(members[0].name, "Ada Lovelace");
        assert_eq!(members[0].role, MemberRole::Instructor);
        assert_eq!(members[0].sid, None);
        assert_eq!(members[0].path(), "/courses/5/memberships/301");

        assert_eq!(members[1].sid.as_deref(), Some("A123"));
        assert_eq!(members[1].role, MemberRole::Student);

        assert_eq!(members[2].name, "ta@example.edu");
        assert_eq!(members[2].role, MemberRole::Ta);
    }

    #[test]
    fn test_row_without_edit_button() {
        let html = r#"<table><tr class="rosterRow"><td>x</td></tr></table>"#;
        let err = extract_roster(html, &CourseId::new("5")).unwrap_err();
        assert_eq!(err.anchor_name, ROSTER_EDIT_BUTTON);
        assert_eq!(err.detail, None);
    }

    #[test]
    fn test_unknown_role() {
        let html = r#"<table><tr class="rosterRow"><td><button class="rosterCell--editIcon"
            data-id="1" data-email="x@example.edu" data-role="9"></button></td></tr></table>"#;
        let err = extract_roster(html, &CourseId::new("5")).unwrap_err();
        assert!(err.detail.unwrap().contains("'9'"));
    }

    #[test]
    fn test_empty_roster_page() {
        let err = extract_roster("<html></html>", &CourseId::new("5")).unwrap_err();
        assert_eq!(err.anchor_name, ROSTER_ROW_ANCHOR);
    }
}
