//! Single-line classification: headings, clauses and fields

use once_cell::sync::Lazy;
use regex::Regex;

/// Labels that are signature-block furniture, never content fields
pub const FURNITURE_LABELS: &[&str] = &[
    "甲方（盖章）",
    "乙方（盖章）",
    "法定代表人（或授权代表）签字",
    "甲方送达地址",
    "乙方送达地址",
    "证据组",
    "证据组名称",
];

/// Label fragments that mark signature, seal or date furniture
pub const FURNITURE_FRAGMENTS: &[&str] = &["盖章", "签字", "签章", "签名", "日期", "联系人"];

/// Longest label, in characters, accepted for a field
pub const MAX_LABEL_CHARS: usize = 24;

const SENTENCE_PUNCTUATION: &[char] = &['，', '。', '；', '！', '？', ',', ';', '!', '?'];

static MARKDOWN_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+?)\s*#*$").expect("valid regex"));
static BRACKET_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^【\s*([^】]*\S)\s*】$").expect("valid regex"));
static ARTICLE_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:第[一二三四五六七八九十百零〇0-9]+条|Article\s+\d+)(?:\s|$|[：:.、])").expect("valid regex")
});
static GROUP_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^证据组\s*\d+\s*[：:]").expect("valid regex"));
static CLAUSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(?:\.\d+)+\s+\S").expect("valid regex"));
static FIELD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^：:]+)[：:]\s*(.*)$").expect("valid regex"));

/// Heading text and level, if the trimmed line is a heading
///
/// - `# …` markdown: level = number of hashes
/// - `【…】` on its own line: level 2
/// - `证据组 N：…`: level 2
/// - `第N条 …` / `Article N …`: level 3, text kept whole
#[must_use]
pub fn heading(line: &str) -> Option<(String, u8)> {
    if let Some(caps) = MARKDOWN_HEADING.captures(line) {
        let level = u8::try_from(caps[1].len()).unwrap_or(6);
        return Some((caps[2].to_string(), level));
    }
    if let Some(caps) = BRACKET_HEADING.captures(line) {
        return Some((caps[1].to_string(), 2));
    }
    if GROUP_HEADING.is_match(line) {
        return Some((line.to_string(), 2));
    }
    if ARTICLE_HEADING.is_match(line) {
        return Some((line.to_string(), 3));
    }
    None
}

/// Whether the trimmed line is a numbered contract clause (`3.2 租金支付…`)
#[must_use]
pub fn is_clause(line: &str) -> bool {
    CLAUSE.is_match(line)
}

/// Why a `label: value` candidate was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRejection {
    /// No colon, or nothing after it
    NotAField,
    /// Label is furniture (signature, seal, date)
    Furniture,
}

/// Split a trimmed line into a field at its first colon
///
/// # Errors
/// [`FieldRejection::NotAField`] when the line does not have a field shape,
/// [`FieldRejection::Furniture`] when the label is on the furniture blacklist.
pub fn field(line: &str) -> Result<(String, String), FieldRejection> {
    let caps = FIELD.captures(line).ok_or(FieldRejection::NotAField)?;
    let label = caps[1].trim();
    let value = caps[2].trim();

    let shaped = !label.is_empty()
        && !value.is_empty()
        && label.chars().count() <= MAX_LABEL_CHARS
        && !label.contains(SENTENCE_PUNCTUATION)
        && !label.chars().all(|c| c.is_ascii_digit())
        && !value.starts_with("//");
    if !shaped {
        return Err(FieldRejection::NotAField);
    }
    if is_furniture(label) {
        return Err(FieldRejection::Furniture);
    }
    Ok((label.to_string(), value.to_string()))
}

/// Whether a label names signature-block furniture
#[must_use]
pub fn is_furniture(label: &str) -> bool {
    FURNITURE_LABELS.contains(&label) || FURNITURE_FRAGMENTS.iter().any(|f| label.contains(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_levels() {
        assert_eq!(heading("## 证据清单 ##"), Some(("证据清单".into(), 2)));
        assert_eq!(heading("【租赁物清单】"), Some(("租赁物清单".into(), 2)));
        assert_eq!(heading("第三条 租金支付"), Some(("第三条 租金支付".into(), 3)));
        assert_eq!(heading("Article 4 Term"), Some(("Article 4 Term".into(), 3)));
        assert_eq!(heading("证据组 1：融资租赁基础法律关系"), Some(("证据组 1：融资租赁基础法律关系".into(), 2)));
        assert_eq!(heading("第三条约定的租金"), None);
        assert_eq!(heading("【 】"), None);
        assert_eq!(heading("#标签"), None);
    }

    #[test]
    fn clause_lines() {
        assert!(is_clause("3.2 承租人应按期支付租金"));
        assert!(is_clause("10.1.3 违约金"));
        assert!(!is_clause("3. 承租人"));
        assert!(!is_clause("3.2承租人"));
    }

    #[test]
    fn field_split_on_first_colon() {
        assert_eq!(
            field("签约地点：上海市：浦东新区"),
            Ok(("签约地点".into(), "上海市：浦东新区".into()))
        );
        assert_eq!(field("Lessee: Harbor Leasing Co."), Ok(("Lessee".into(), "Harbor Leasing Co.".into())));
    }

    #[test]
    fn field_shape_rules() {
        assert_eq!(field("出租人："), Err(FieldRejection::NotAField));
        assert_eq!(field("根据双方约定，承租人应当支付：租金"), Err(FieldRejection::NotAField));
        assert_eq!(field("10:30"), Err(FieldRejection::NotAField));
        assert_eq!(field("http://example.com"), Err(FieldRejection::NotAField));
        assert_eq!(field("这是一个非常非常非常非常非常非常非常非常长的标签名称：值"), Err(FieldRejection::NotAField));
    }

    #[test]
    fn furniture_labels_rejected() {
        assert_eq!(field("甲方（盖章）：东方公司"), Err(FieldRejection::Furniture));
        assert_eq!(field("签订日期：2021年3月15日"), Err(FieldRejection::Furniture));
        assert_eq!(field("联系人：王建国"), Err(FieldRejection::Furniture));
    }
}
