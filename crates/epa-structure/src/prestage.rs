//! Pre-parse cleanup stages
//!
//! Each stage is a pure `&str -> String` function. [`prepare`] runs them in
//! [`PRE_STAGES`] order:
//!
//! 1. [`strip_preamble`]
//! 2. [`strip_quality_report`]
//! 3. [`strip_markdown_decoration`]
//! 4. [`split_inline_headings`]

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading phrases generation prepends before the document proper
pub const PREAMBLE_PREFIXES: &[&str] = &["好的，", "好的,", "当然，", "当然可以", "Sure,", "Okay,"];

/// Headings that open the self-check block generation appends
pub const QUALITY_REPORT_HEADINGS: &[&str] = &[
    "质量检查报告",
    "数据一致性验证报告",
    "数据一致性检查",
    "生成后质量检查",
    "即时检查",
    "生成完成",
    "生成结论",
    "质量检查",
];

/// Named pre-parse stage
pub type PreStage = (&'static str, fn(&str) -> String);

/// Pre-parse stages in execution order
pub const PRE_STAGES: [PreStage; 4] = [
    ("strip_preamble", strip_preamble),
    ("strip_quality_report", strip_quality_report),
    ("strip_markdown_decoration", strip_markdown_decoration),
    ("split_inline_headings", split_inline_headings),
];

/// Run every pre-parse stage
#[must_use]
pub fn prepare(raw: &str) -> String {
    PRE_STAGES
        .iter()
        .fold(raw.replace("\r\n", "\n"), |text, (_, stage)| stage(&text))
}

/// Drop leading boilerplate lines such as `好的，作为专业的法律文书助手…`
///
/// Only lines before the first real content line are considered.
#[must_use]
pub fn strip_preamble(text: &str) -> String {
    let mut lines = text.lines().peekable();
    while let Some(line) = lines.peek() {
        let trimmed = line.trim();
        if trimmed.is_empty() || PREAMBLE_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
            lines.next();
        } else {
            break;
        }
    }
    lines.collect::<Vec<_>>().join("\n")
}

/// Remove the trailing self-check block and any dangling rules before it
///
/// The block opens at a heading past the first line whose text, ignoring
/// markdown markers, begins with one of [`QUALITY_REPORT_HEADINGS`], and runs
/// to the end. A field line (`质量检查：合格`) or a long sentence starting with
/// such a word is content. A heading opens the block when it is decorated
/// (`#`, `**` or `【】`) and names a report, or when every line after it
/// reads like a checklist item.
#[must_use]
pub fn strip_quality_report(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let cut = (1..lines.len())
        .find(|&i| opens_report(&lines[i..]))
        .unwrap_or(lines.len());

    let mut kept = &lines[..cut];
    while let Some((last, rest)) = kept.split_last() {
        if last.trim().is_empty() || is_rule(last) {
            kept = rest;
        } else {
            break;
        }
    }
    kept.join("\n")
}

fn opens_report(block: &[&str]) -> bool {
    let Some((heading, tail)) = block.split_first() else {
        return false;
    };
    let Some(bare) = report_heading(heading) else {
        return false;
    };
    let decorated = {
        let t = heading.trim();
        t.starts_with('#') || t.starts_with("**") || t.starts_with('【')
    };
    (decorated && bare.contains("报告"))
        || tail
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .all(|l| is_checklist_item(l) || report_heading(l).is_some())
}

fn report_heading(line: &str) -> Option<&str> {
    let bare = line
        .trim()
        .trim_start_matches(['#', '*', '-', '>', '【', ' ', '\t'])
        .trim_end_matches(['#', '*', '】', '：', ':', ' ', '\t']);
    if bare.contains(['：', ':']) {
        return None;
    }
    QUALITY_REPORT_HEADINGS
        .iter()
        .any(|h| bare.starts_with(h) && bare.chars().count() <= h.chars().count() + 8)
        .then_some(bare)
}

static NUMBERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[.、．)）]").expect("valid regex"));

const CHECK_GLYPHS: &[char] = &['✅', '✔', '✓', '☑', '❌', '✗', '⚠'];

fn is_checklist_item(line: &str) -> bool {
    line.contains(CHECK_GLYPHS)
        || line.starts_with(['-', '*', '•', '·'])
        || NUMBERED_ITEM.is_match(line)
        || is_rule(line)
}

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*```[^\n]*\n?").expect("valid regex"));
static LINE_BREAK_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[A-Za-z][^<>\n]*>").expect("valid regex"));
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]\n]+)\]\([^)\n]*\)").expect("valid regex"));
static STRONG_EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*\*([^*\n]+)\*\*\*").expect("valid regex"));
static STRONG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*\n]+)\*\*").expect("valid regex"));
static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*\n]+)\*").expect("valid regex"));
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]+)`").expect("valid regex"));
static BLOCKQUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*>[ \t]?").expect("valid regex"));

fn is_rule(line: &str) -> bool {
    let t = line.trim();
    t.len() >= 3
        && (t.chars().all(|c| c == '-') || t.chars().all(|c| c == '*') || t.chars().all(|c| c == '='))
}

/// Remove markdown and HTML decoration, keeping the text it wraps
///
/// Code fences lose their fence lines but keep their content. Horizontal
/// rules become blank lines. Heading hashes and table pipes are kept for the
/// parser.
#[must_use]
pub fn strip_markdown_decoration(text: &str) -> String {
    let text = CODE_FENCE.replace_all(text, "");
    let text = LINE_BREAK_TAG.replace_all(&text, "\n");
    let text = HTML_TAG.replace_all(&text, "");
    let text = LINK.replace_all(&text, "$1");
    let text = STRONG_EMPHASIS.replace_all(&text, "$1");
    let text = STRONG.replace_all(&text, "$1");
    let text = EMPHASIS.replace_all(&text, "$1");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = BLOCKQUOTE.replace_all(&text, "");
    text.lines()
        .map(|line| if is_rule(line) { "" } else { line })
        .collect::<Vec<_>>()
        .join("\n")
}

static INLINE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([ \t]*【[^】\s][^】]*】)[ \t]*(\S.*)$").expect("valid regex"));

/// Put text following a bracketed heading on its own line
///
/// `【租赁物】挖掘机一台` becomes `【租赁物】` and `挖掘机一台`.
#[must_use]
pub fn split_inline_headings(text: &str) -> String {
    text.lines()
        .map(|line| match INLINE_HEADING.captures(line) {
            Some(caps) => format!("{}\n{}", caps[1].trim(), &caps[2]),
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
