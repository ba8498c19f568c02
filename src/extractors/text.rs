//! 解析器共用的文本 / 属性 / JSON 工具

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::error::{EntityType, ExtractionFailure};

/// 解析 CSS 选择器
pub(crate) fn selector(
    entity: EntityType,
    css: &'static str,
) -> Result<Selector, ExtractionFailure> {
    Selector::parse(css)
        .map_err(|e| ExtractionFailure::invalid(entity, css, format!("无效的选择器: {:?}", e)))
}

/// 文档中第一个匹配的元素
pub(crate) fn first<'a>(
    document: &'a Html,
    entity: EntityType,
    css: &'static str,
) -> Result<Option<ElementRef<'a>>, ExtractionFailure> {
    let sel = selector(entity, css)?;
    Ok(document.select(&sel).next())
}

/// 元素内第一个匹配的子元素
pub(crate) fn first_in<'a>(
    element: ElementRef<'a>,
    sel: &Selector,
) -> Option<ElementRef<'a>> {
    element.select(sel).next()
}

/// 合并连续空白并去除首尾空白
pub(crate) fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

/// 非空文本
pub(crate) fn text_of(element: Option<ElementRef<'_>>) -> Option<String> {
    element.map(element_text).filter(|t| !t.is_empty())
}

/// 非空属性值
pub(crate) fn attr(element: ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(clean_text)
        .filter(|v| !v.is_empty())
}

pub(crate) fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// 解析平台使用的时间格式
///
/// 支持 RFC3339（`2024-01-31T23:59:00-08:00`）与 `2024-01-31 23:59:00 -0800`
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z"))
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f %z"))
        .ok()
}

/// 解析数字文本（允许千分位逗号）
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().replace(',', "").parse::<f64>().ok()
}

/// 解析 "8.0 / 10.0" 形式的分数，返回 (得分, 满分)
///
/// 未批改时得分部分为 "-"，对应 `None`
pub(crate) fn parse_score_fraction(raw: &str) -> Option<(Option<f64>, Option<f64>)> {
    if let Ok(re) = Regex::new(r"^\s*([^/]*?)\s*/\s*([^/]*?)\s*$") {
        if let Some(caps) = re.captures(raw) {
            let score = caps.get(1).and_then(|m| parse_number(m.as_str()));
            let max = caps.get(2).and_then(|m| parse_number(m.as_str()));
            if score.is_some() || max.is_some() {
                return Some((score, max));
            }
        }
    }
    None
}

/// 文本中的第一个整数（如 "3 assignments"）
pub(crate) fn leading_count(raw: &str) -> Option<u32> {
    if let Ok(re) = Regex::new(r"(\d+)") {
        return re
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok());
    }
    None
}

/// 路径中紧跟在 `segment` 之后的数字 ID
///
/// `id_after("/courses/12/assignments/34", "assignments") == Some("34")`
pub(crate) fn id_after(href: &str, segment: &str) -> Option<String> {
    let path = href.split(|c: char| c == '?' || c == '#').next().unwrap_or(href);
    let mut parts = path.split('/').filter(|p| !p.is_empty());
    while let Some(part) = parts.next() {
        if part == segment {
            return parts
                .next()
                .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
                .map(str::to_string);
        }
    }
    None
}

/// 读取 `data-react-props` JSON
pub(crate) fn react_props(
    document: &Html,
    entity: EntityType,
    anchor: &'static str,
) -> Result<Value, ExtractionFailure> {
    let element =
        first(document, entity, anchor)?.ok_or_else(|| ExtractionFailure::missing(entity, anchor))?;
    let raw = element
        .value()
        .attr("data-react-props")
        .ok_or_else(|| ExtractionFailure::invalid(entity, anchor, "缺少 data-react-props"))?;
    serde_json::from_str(raw)
        .map_err(|e| ExtractionFailure::invalid(entity, anchor, format!("JSON 解析失败: {}", e)))
}

/// JSON 数字或数字字符串
pub(crate) fn json_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

pub(crate) fn json_u32(value: Option<&Value>) -> Option<u32> {
    json_f64(value)
        .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32)
}

/// JSON 字符串或数字，统一为字符串
pub(crate) fn json_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(clean_text(s)).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn json_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  CS\n  61A \t Fall "), "CS 61A Fall");
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let a = parse_timestamp("2024-01-31T23:59:00-08:00").unwrap();
        let b = parse_timestamp("2024-01-31 23:59:00 -0800").unwrap();
        assert_eq!(a, b);
        assert!(parse_timestamp("2024-01-31 23:59:00.000000 -0800").is_some());
        assert!(parse_timestamp("next tuesday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_parse_score_fraction() {
        assert_eq!(parse_score_fraction("8.0 / 10.0"), Some((Some(8.0), Some(10.0))));
        assert_eq!(parse_score_fraction("- / 10.0"), Some((None, Some(10.0))));
        assert_eq!(parse_score_fraction("Submitted"), None);
    }

    #[test]
    fn test_id_after() {
        assert_eq!(
            id_after("/courses/12/assignments/34/submissions/56?x=1", "assignments"),
            Some("34".to_string())
        );
        assert_eq!(id_after("/courses/12", "courses"), Some("12".to_string()));
        assert_eq!(id_after("/courses/new", "courses"), None);
        assert_eq!(id_after("/account", "courses"), None);
    }

    #[test]
    fn test_json_helpers() {
        let v = json!({"a": "12.5", "b": 3, "c": null, "d": "true"});
        assert_eq!(json_f64(v.get("a")), Some(12.5));
        assert_eq!(json_u32(v.get("b")), Some(3));
        assert_eq!(json_f64(v.get("c")), None);
        assert_eq!(json_string(v.get("b")), Some("3".to_string()));
        assert_eq!(json_bool(v.get("d")), Some(true));
        assert_eq!(leading_count("7 assignments"), Some(7));
    }
}
