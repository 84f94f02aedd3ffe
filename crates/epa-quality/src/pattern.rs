//! Placeholder pattern library

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Family of residual placeholder shapes
///
/// Variant order is reporting order: when two classes match the same span,
/// the earlier class keeps it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternClass {
    /// Literal case marker registered on the gate
    CaseMarker,
    /// Upper-case snake template token (`DATE_PLACEHOLDER`, `SLOT_A`)
    TemplateToken,
    /// Generic filler name prefix (`某某公司`, `某甲`)
    FillerPrefix,
    /// Letter-digit slot (`X1`, `×3%`)
    NumericSlot,
    /// Date with unfilled components or mixed numerals
    DateTemplate,
    /// Empty bracket or parenthesis pair
    EmptyBracket,
    /// Leftover signature-block filler phrase
    SignatureFiller,
}

impl PatternClass {
    /// Built-in classes, excluding [`PatternClass::CaseMarker`]
    pub const BUILT_IN: [Self; 6] = [
        Self::TemplateToken,
        Self::FillerPrefix,
        Self::NumericSlot,
        Self::DateTemplate,
        Self::EmptyBracket,
        Self::SignatureFiller,
    ];

    /// Stable snake-case label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CaseMarker => "case_marker",
            Self::TemplateToken => "template_token",
            Self::FillerPrefix => "filler_prefix",
            Self::NumericSlot => "numeric_slot",
            Self::DateTemplate => "date_template",
            Self::EmptyBracket => "empty_bracket",
            Self::SignatureFiller => "signature_filler",
        }
    }
}

impl Display for PatternClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Compiled regex for one built-in class
pub(crate) struct ClassPattern {
    pub(crate) class: PatternClass,
    regex: Regex,
    accept: fn(&str) -> bool,
}

impl ClassPattern {
    /// Byte spans of accepted matches, in position order
    pub(crate) fn spans<'a>(&'a self, text: &'a str) -> impl Iterator<Item = (usize, &'a str)> + 'a {
        self.regex.captures_iter(text).filter_map(move |caps| {
            let m = caps.name("tok").or_else(|| caps.get(0))?;
            (self.accept)(m.as_str()).then_some((m.start(), m.as_str()))
        })
    }
}

fn always(_: &str) -> bool {
    true
}

fn has_blank_date_part(token: &str) -> bool {
    token.starts_with("二〇") || token.contains(['X', '×', '_', '○'])
}

fn compile(class: PatternClass, source: &str, accept: fn(&str) -> bool) -> ClassPattern {
    ClassPattern {
        class,
        regex: Regex::new(source).expect("valid built-in pattern"),
        accept,
    }
}

pub(crate) static BUILT_IN_PATTERNS: Lazy<Vec<ClassPattern>> = Lazy::new(|| {
    vec![
        compile(
            PatternClass::TemplateToken,
            r"(?:^|[^A-Za-z0-9_])(?P<tok>[A-Z][A-Z0-9]*(?:_[A-Z0-9]+)+)",
            always,
        ),
        compile(
            PatternClass::FillerPrefix,
            r"某某[\p{Han}--[某与和及或的在于向]]{0,6}[0-9０-９A-Za-z]*|某[\p{Han}--[某与和及或的在于向]]{1,3}",
            always,
        ),
        compile(PatternClass::NumericSlot, r"[X×]\d+%?", always),
        compile(
            PatternClass::DateTemplate,
            r"二〇\d{2}年\d{1,2}月\d{1,2}日|(?:(?:\d{4}|[X×_○]+)年)?(?:\d{1,2}|[X×_○]+)月(?:\d{1,2}|[X×_○]+)日",
            has_blank_date_part,
        ),
        compile(PatternClass::EmptyBracket, r"【\s*】|（\s*）|\(\s*\)", always),
        compile(PatternClass::SignatureFiller, r"或授权代表", always),
    ]
});
