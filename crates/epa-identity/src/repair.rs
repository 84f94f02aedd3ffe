//! Ordered text repair pipeline
//!
//! Resolution runs as an explicit sequence of pure `text -> text` stages:
//!
//! 1. [`LiteralSubstitution`] - longest-marker-first literal replacement
//! 2. [`MarkerNumberRepair`] - spaced or bracketed slot numbers (`某某公司 5`)
//! 3. [`FillerSuffixRepair`] - real names followed by filler glyphs (`Harbor Leasing Co.某`)
//! 4. [`EmptyBracketClosure`] - brackets emptied by substitution
//! 5. [`PartialDateNormalization`] - unfilled date components become `X`
//!
//! The pipeline repeats until a pass changes nothing, so applying it to its
//! own output is a no-op. Literal substitution copies shields through
//! unchanged, so a replacement that contains a marker is never expanded twice.

use crate::map::IdentityMap;
use crate::marker::Marker;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fmt;

/// One pure stage of the resolution pipeline
pub trait RepairStage: Send + Sync {
    /// Stage name for logs and diagnostics
    fn name(&self) -> &'static str;

    /// Apply the stage
    fn apply(&self, map: &IdentityMap, text: &str) -> String;
}

/// Greedy longest-marker-first literal substitution
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralSubstitution;

impl RepairStage for LiteralSubstitution {
    fn name(&self) -> &'static str {
        "literal_substitution"
    }

    fn apply(&self, map: &IdentityMap, text: &str) -> String {
        map.substitute_literal(text)
    }
}

/// Slot markers whose number was spaced, bracketed or written full-width
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerNumberRepair;

impl RepairStage for MarkerNumberRepair {
    fn name(&self) -> &'static str {
        "marker_number_repair"
    }

    fn apply(&self, map: &IdentityMap, text: &str) -> String {
        map.slot_patterns()
            .iter()
            .fold(text.to_string(), |acc, slot| slot.repair(map, &acc))
    }
}

/// Real names suffixed with filler glyphs or slot annotations
#[derive(Debug, Clone, Copy, Default)]
pub struct FillerSuffixRepair;

impl RepairStage for FillerSuffixRepair {
    fn name(&self) -> &'static str {
        "filler_suffix_repair"
    }

    fn apply(&self, map: &IdentityMap, text: &str) -> String {
        map.name_patterns()
            .iter()
            .fold(text.to_string(), |acc, name| name.repair(&acc))
    }
}

static EMPTY_BRACKET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([ \t\u{3000}]*)(?:【\s*】|（\s*）|\(\s*\))([ \t\u{3000}]*)").expect("valid regex")
});

/// Removal of `【 】`, `（ ）` and `( )` left behind after substitution
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyBracketClosure;

impl RepairStage for EmptyBracketClosure {
    fn name(&self) -> &'static str {
        "empty_bracket_closure"
    }

    fn apply(&self, _map: &IdentityMap, text: &str) -> String {
        // Removing an inner pair can empty an outer one: repeat until stable.
        let mut current = text.to_string();
        loop {
            let next = EMPTY_BRACKET
                .replace_all(&current, |caps: &Captures<'_>| {
                    let spaced = !caps[1].is_empty() || !caps[2].is_empty();
                    if spaced { " " } else { "" }
                })
                .into_owned();
            if next == current {
                return current;
            }
            current = next;
        }
    }
}

const BLANK_COMPONENT: &str = r"X+|×+|_+|○+";

static PARTIAL_DATE: Lazy<Regex> = Lazy::new(|| {
    let component = |digits: &str| format!(r"[ \t]*({digits}|{BLANK_COMPONENT})[ \t]*");
    Regex::new(&format!(
        "{}年{}月{}日",
        component(r"\d{4}"),
        component(r"\d{1,2}"),
        component(r"\d{1,2}")
    ))
    .expect("valid regex")
});

/// Canonicalises unfilled date components to a single `X`
///
/// `2021年XX月__日` becomes `2021年X月X日`. Fully numeric dates are left
/// untouched apart from whitespace inside the date.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialDateNormalization;

impl RepairStage for PartialDateNormalization {
    fn name(&self) -> &'static str {
        "partial_date_normalization"
    }

    fn apply(&self, _map: &IdentityMap, text: &str) -> String {
        PARTIAL_DATE
            .replace_all(text, |caps: &Captures<'_>| {
                let part = |i: usize| {
                    let c = &caps[i];
                    if c.starts_with(|ch: char| ch.is_ascii_digit()) {
                        c.to_string()
                    } else {
                        "X".to_string()
                    }
                };
                format!("{}年{}月{}日", part(1), part(2), part(3))
            })
            .into_owned()
    }
}

/// Ordered list of repair stages
pub struct ResolutionPipeline {
    stages: Vec<Box<dyn RepairStage>>,
}

impl fmt::Debug for ResolutionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionPipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl Default for ResolutionPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl ResolutionPipeline {
    /// Pipeline with no stages
    #[must_use]
    pub fn empty() -> Self {
        Self { stages: Vec::new() }
    }

    /// The five standard stages in their fixed order
    #[must_use]
    pub fn standard() -> Self {
        Self::empty()
            .with_stage(LiteralSubstitution)
            .with_stage(MarkerNumberRepair)
            .with_stage(FillerSuffixRepair)
            .with_stage(EmptyBracketClosure)
            .with_stage(PartialDateNormalization)
    }

    /// Append a stage
    #[must_use]
    pub fn with_stage(mut self, stage: impl RepairStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Stage names in execution order
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order, repeating the pass until the text is stable
    ///
    /// A later stage can expose work for an earlier one (removing `【】` from
    /// `某某【】公司5` forms a marker), so passes repeat up to [`MAX_PASSES`].
    #[must_use]
    pub fn run(&self, map: &IdentityMap, text: &str) -> String {
        let mut current = self.run_once(map, text);
        for _ in 1..MAX_PASSES {
            let next = self.run_once(map, &current);
            if next == current {
                return current;
            }
            current = next;
        }
        tracing::warn!(passes = MAX_PASSES, "resolution did not reach a fixed point");
        current
    }

    fn run_once(&self, map: &IdentityMap, text: &str) -> String {
        self.stages.iter().fold(text.to_string(), |acc, stage| {
            let next = stage.apply(map, &acc);
            if next != acc {
                tracing::trace!(stage = stage.name(), "stage rewrote text");
            }
            next
        })
    }
}

/// Upper bound on full pipeline passes
pub const MAX_PASSES: usize = 4;

pub(crate) static STANDARD_PIPELINE: Lazy<ResolutionPipeline> = Lazy::new(ResolutionPipeline::standard);

/// Compiled repair patterns for one real name
#[derive(Debug, Clone)]
pub(crate) struct NamePattern {
    name: String,
    filler_suffix: Regex,
    slot_annotation: Regex,
}

impl NamePattern {
    pub(crate) fn compile(name: &str) -> Option<Self> {
        let escaped = regex::escape(name);
        let built = Regex::new(&format!(r"{escaped}某+(\W|$)")).and_then(|suffix| {
            Regex::new(&format!(r"{escaped}[ \t]*[(（]公司\d+[)）]")).map(|annotation| (suffix, annotation))
        });
        match built {
            Ok((filler_suffix, slot_annotation)) => Some(Self {
                name: name.to_string(),
                filler_suffix,
                slot_annotation,
            }),
            Err(err) => {
                tracing::warn!(name, error = %err, "name too large for repair pattern");
                None
            }
        }
    }

    fn repair(&self, text: &str) -> String {
        let text = self
            .filler_suffix
            .replace_all(text, |caps: &Captures<'_>| format!("{}{}", self.name, &caps[1]));
        self.slot_annotation
            .replace_all(&text, regex::NoExpand(self.name.as_str()))
            .into_owned()
    }
}

/// Compiled slot-number repair for one marker prefix
#[derive(Debug, Clone)]
pub(crate) struct SlotPattern {
    prefix: String,
    pattern: Regex,
}

impl SlotPattern {
    pub(crate) fn compile_all<'a>(markers: impl Iterator<Item = &'a Marker>) -> Vec<Self> {
        let mut prefixes: Vec<&str> = markers.filter_map(|m| m.slot().map(|(p, _)| p)).collect();
        prefixes.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
        prefixes.dedup();
        prefixes.into_iter().filter_map(Self::compile).collect()
    }

    fn compile(prefix: &str) -> Option<Self> {
        let escaped = regex::escape(prefix);
        let source = format!(
            r"{escaped}(?:[ \t\u{{3000}}]+([0-9０-９]+)|[ \t]*[(（][ \t]*([0-9０-９]+)[ \t]*[)）]|([０-９]+))"
        );
        match Regex::new(&source) {
            Ok(pattern) => Some(Self {
                prefix: prefix.to_string(),
                pattern,
            }),
            Err(err) => {
                tracing::warn!(prefix, error = %err, "prefix too large for slot pattern");
                None
            }
        }
    }

    fn repair(&self, map: &IdentityMap, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures<'_>| {
                let digits = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .or_else(|| caps.get(3))
                    .map_or("", |m| m.as_str());
                let number: String = digits.chars().map(ascii_digit).collect();
                match map.resolve(&format!("{}{number}", self.prefix)) {
                    Some(replacement) => replacement.to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

fn ascii_digit(c: char) -> char {
    match c {
        '０'..='９' => char::from_u32(u32::from(c) - u32::from('０') + u32::from('0')).unwrap_or(c),
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::IdentityMapBuilder;
    use crate::profile::EntityProfile;

    fn map() -> IdentityMap {
        IdentityMapBuilder::new()
            .with_profile(EntityProfile::company(
                Marker::new("某某公司5").unwrap(),
                "东方国际融资租赁有限公司",
            ))
            .with_profile(EntityProfile::person(Marker::new("张某").unwrap(), "张伟"))
            .build()
            .unwrap()
    }

    #[test]
    fn standard_order() {
        assert_eq!(
            ResolutionPipeline::standard().stage_names(),
            vec![
                "literal_substitution",
                "marker_number_repair",
                "filler_suffix_repair",
                "empty_bracket_closure",
                "partial_date_normalization",
            ]
        );
    }

    #[test]
    fn marker_number_repair_variants() {
        let map = map();
        let stage = MarkerNumberRepair;
        assert_eq!(stage.apply(&map, "某某公司 5"), "东方国际融资租赁有限公司");
        assert_eq!(stage.apply(&map, "某某公司（5）"), "东方国际融资租赁有限公司");
        assert_eq!(stage.apply(&map, "某某公司５"), "东方国际融资租赁有限公司");
        assert_eq!(stage.apply(&map, "某某公司 7"), "某某公司 7");
    }

    #[test]
    fn filler_suffix_repair() {
        let map = map();
        let stage = FillerSuffixRepair;
        assert_eq!(stage.apply(&map, "张伟某，男"), "张伟，男");
        assert_eq!(stage.apply(&map, "签约方张伟某某"), "签约方张伟");
        assert_eq!(stage.apply(&map, "张伟 (公司3) 签字"), "张伟 签字");
        // 张伟某人 is a different word, left alone
        assert_eq!(stage.apply(&map, "张伟某人"), "张伟某人");
    }

    #[test]
    fn empty_bracket_closure_nested() {
        let map = map();
        let stage = EmptyBracketClosure;
        assert_eq!(stage.apply(&map, "甲方 【 】 签字"), "甲方 签字");
        assert_eq!(stage.apply(&map, "甲方（【】）签字"), "甲方签字");
        assert_eq!(stage.apply(&map, "甲方（盖章）"), "甲方（盖章）");
    }

    #[test]
    fn partial_date_normalization() {
        let map = map();
        let stage = PartialDateNormalization;
        assert_eq!(stage.apply(&map, "2021年XX月__日"), "2021年X月X日");
        assert_eq!(stage.apply(&map, "××××年○○月1日"), "X年X月1日");
        assert_eq!(stage.apply(&map, "2021年3月15日"), "2021年3月15日");
    }

    #[test]
    fn bracket_removal_exposes_marker() {
        let map = map();
        assert_eq!(map.apply("某某【】公司5"), "东方国际融资租赁有限公司");
        assert_eq!(map.apply("张伟【】某，"), "张伟，");
    }

    #[test]
    fn empty_pipeline_is_identity() {
        let map = map();
        let text = "某某公司5与张某";
        assert_eq!(map.apply_with(&ResolutionPipeline::empty(), text), text);
    }
}
