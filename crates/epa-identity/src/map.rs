//! Identity map construction and lookup
//!
//! The map is built once per case from three sources with fixed precedence:
//!
//! 1. explicit override table
//! 2. profiles whose legal name is populated
//! 3. fallback pairs for institutions generation tends to invent
//!
//! A later source never overwrites a marker an earlier source already set.
//! Pairs are kept sorted longest-marker-first so a short marker contained in
//! a longer one can never pre-empt it.
//!
//! A replacement that itself contains a marker (alias `宏昌租赁` for
//! `宏昌租赁有限公司`) is a *shield*: wherever it already appears in the text
//! it is copied through untouched, so resolved text never resolves again.

use crate::error::{IdentityError, IdentityResult};
use crate::marker::Marker;
use crate::profile::EntityProfile;
use crate::repair::{NamePattern, ResolutionPipeline, SlotPattern, STANDARD_PIPELINE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Institution names substituted when generation invents an unlisted entity
pub const DEFAULT_FALLBACKS: &[(&str, &str)] = &[
    ("某某律师事务所", "上海中伦律师事务所"),
    ("上海XX律师事务所", "上海中伦律师事务所"),
    ("某某公证处", "上海市东方公证处"),
    ("某某银行", "中国工商银行"),
];

/// Which source contributed a substitution pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairSource {
    /// Explicit override table
    Override,
    /// Entity profile
    Profile,
    /// Hand-curated fallback table
    Fallback,
}

/// One marker → replacement pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionPair {
    marker: String,
    replacement: String,
    source: PairSource,
}

impl SubstitutionPair {
    /// Marker text
    #[inline]
    #[must_use]
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Replacement text
    #[inline]
    #[must_use]
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Contributing source
    #[inline]
    #[must_use]
    pub fn source(&self) -> PairSource {
        self.source
    }
}

/// Immutable per-case substitution table
///
/// Shared read-only by every document of a case. There are no mutators:
/// a profile added after construction requires a full rebuild through
/// [`IdentityMapBuilder`].
#[derive(Debug, Clone)]
pub struct IdentityMap {
    pairs: Vec<SubstitutionPair>,
    by_marker: HashMap<String, usize>,
    by_first_char: HashMap<char, Vec<usize>>,
    shields: Vec<String>,
    shield_by_first_char: HashMap<char, Vec<usize>>,
    profiles: Vec<EntityProfile>,
    profile_by_marker: HashMap<String, usize>,
    real_names: Vec<String>,
    name_patterns: Vec<NamePattern>,
    slot_patterns: Vec<SlotPattern>,
}

impl IdentityMap {
    /// Number of substitution pairs
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the map has no pairs
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in application order (longest marker first)
    #[inline]
    #[must_use]
    pub fn pairs(&self) -> &[SubstitutionPair] {
        &self.pairs
    }

    /// Every marker the map can resolve
    pub fn markers(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|p| p.marker.as_str())
    }

    /// Markers whose presence in resolved text means resolution missed them
    ///
    /// A marker occurring inside some replacement is left out: after
    /// [`apply`](Self::apply) it can only survive as part of that replacement.
    pub fn residual_markers(&self) -> impl Iterator<Item = &str> {
        self.markers()
            .filter(move |m| !self.shields.iter().any(|s| s.contains(m)))
    }

    /// Replacements that contain a marker, longest first
    #[inline]
    #[must_use]
    pub fn shields(&self) -> &[String] {
        &self.shields
    }

    /// Replacement for an exact marker
    #[must_use]
    pub fn resolve(&self, marker: &str) -> Option<&str> {
        self.by_marker
            .get(marker)
            .map(|&i| self.pairs[i].replacement.as_str())
    }

    /// Profile owning a marker (primary, alias or field marker)
    #[must_use]
    pub fn profile(&self, marker: &str) -> Option<&EntityProfile> {
        self.profile_by_marker
            .get(marker)
            .map(|&i| &self.profiles[i])
    }

    /// Profiles that contributed to the map, in input order
    #[inline]
    #[must_use]
    pub fn profiles(&self) -> &[EntityProfile] {
        &self.profiles
    }

    /// Legal names of contributing profiles, longest first
    #[inline]
    #[must_use]
    pub fn real_names(&self) -> &[String] {
        &self.real_names
    }

    /// Resolve markers and repair malformed leftovers using the standard pipeline
    ///
    /// Pure: the same input always yields the same output, and applying the
    /// map to already-resolved text leaves it unchanged.
    #[must_use]
    pub fn apply(&self, text: &str) -> String {
        STANDARD_PIPELINE.run(self, text)
    }

    /// Resolve using a custom pipeline
    #[must_use]
    pub fn apply_with(&self, pipeline: &ResolutionPipeline, text: &str) -> String {
        pipeline.run(self, text)
    }

    /// Single greedy pass of literal, non-overlapping substitution
    ///
    /// At each position the longest matching marker wins; replacement text is
    /// emitted as-is and never rescanned. A shield at least as long as the
    /// marker found at the same position is copied through unchanged. A
    /// marker ending in an ASCII letter or digit does not match when the next
    /// character is one too, so `某某公司1` never eats the front of `某某公司12`.
    #[must_use]
    pub fn substitute_literal(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(c) = rest.chars().next() {
            match (self.match_at(rest), self.shield_at(rest)) {
                (Some(pair), Some(shield)) if pair.marker.len() > shield.len() => {
                    out.push_str(&pair.replacement);
                    rest = &rest[pair.marker.len()..];
                }
                (_, Some(shield)) => {
                    out.push_str(shield);
                    rest = &rest[shield.len()..];
                }
                (Some(pair), None) => {
                    out.push_str(&pair.replacement);
                    rest = &rest[pair.marker.len()..];
                }
                (None, None) => {
                    out.push(c);
                    rest = &rest[c.len_utf8()..];
                }
            }
        }
        out
    }

    fn shield_at(&self, rest: &str) -> Option<&str> {
        let first = rest.chars().next()?;
        self.shield_by_first_char
            .get(&first)?
            .iter()
            .map(|&i| self.shields[i].as_str())
            .find(|s| rest.starts_with(s))
    }

    fn match_at(&self, rest: &str) -> Option<&SubstitutionPair> {
        let first = rest.chars().next()?;
        self.by_first_char
            .get(&first)?
            .iter()
            .map(|&i| &self.pairs[i])
            .find(|p| rest.starts_with(&p.marker) && at_boundary(&p.marker, &rest[p.marker.len()..]))
    }

    pub(crate) fn name_patterns(&self) -> &[NamePattern] {
        &self.name_patterns
    }

    pub(crate) fn slot_patterns(&self) -> &[SlotPattern] {
        &self.slot_patterns
    }
}

fn at_boundary(marker: &str, after: &str) -> bool {
    match (marker.chars().last(), after.chars().next()) {
        (Some(last), Some(next)) => !(last.is_ascii_alphanumeric() && next.is_ascii_alphanumeric()),
        _ => true,
    }
}

/// Builder collecting the three map sources
#[derive(Debug, Clone)]
pub struct IdentityMapBuilder {
    overrides: Vec<(String, String)>,
    profiles: Vec<EntityProfile>,
    fallbacks: Vec<(String, String)>,
}

impl Default for IdentityMapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityMapBuilder {
    /// Create builder with the default fallback table
    #[must_use]
    pub fn new() -> Self {
        Self {
            overrides: Vec::new(),
            profiles: Vec::new(),
            fallbacks: DEFAULT_FALLBACKS
                .iter()
                .map(|(m, r)| ((*m).to_string(), (*r).to_string()))
                .collect(),
        }
    }

    /// Add an override pair (highest precedence)
    #[must_use]
    pub fn with_override(mut self, marker: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.overrides.push((marker.into(), replacement.into()));
        self
    }

    /// Add several override pairs
    #[must_use]
    pub fn with_overrides<I, M, R>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (M, R)>,
        M: Into<String>,
        R: Into<String>,
    {
        self.overrides
            .extend(pairs.into_iter().map(|(m, r)| (m.into(), r.into())));
        self
    }

    /// Add a profile
    #[must_use]
    pub fn with_profile(mut self, profile: EntityProfile) -> Self {
        self.profiles.push(profile);
        self
    }

    /// Add several profiles
    #[must_use]
    pub fn with_profiles(mut self, profiles: impl IntoIterator<Item = EntityProfile>) -> Self {
        self.profiles.extend(profiles);
        self
    }

    /// Replace the fallback table
    #[must_use]
    pub fn with_fallbacks<I, M, R>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (M, R)>,
        M: Into<String>,
        R: Into<String>,
    {
        self.fallbacks = pairs.into_iter().map(|(m, r)| (m.into(), r.into())).collect();
        self
    }

    /// Drop the fallback table
    #[must_use]
    pub fn without_fallbacks(mut self) -> Self {
        self.fallbacks.clear();
        self
    }

    /// Build the immutable map
    ///
    /// # Errors
    /// - [`IdentityError::EmptyMarker`] for an override or fallback with a blank marker
    /// - [`IdentityError::DuplicateMarker`] when two distinct profiles claim one marker
    pub fn build(&self) -> IdentityResult<IdentityMap> {
        let profiles: Vec<EntityProfile> = self
            .profiles
            .iter()
            .filter(|p| {
                if !p.has_identity() {
                    tracing::debug!(marker = %p.marker, "skipping profile without legal name");
                }
                p.has_identity()
            })
            .cloned()
            .collect();

        let profile_by_marker = claim_markers(&profiles)?;

        let mut table = PairTable::default();
        for (marker, replacement) in &self.overrides {
            table.insert(marker, replacement, PairSource::Override)?;
        }
        for profile in &profiles {
            table.insert(profile.marker.as_str(), &profile.legal_name, PairSource::Profile)?;
            for alias in &profile.aliases {
                table.insert(alias.as_str(), &profile.legal_name, PairSource::Profile)?;
            }
            for field_marker in &profile.field_markers {
                match profile.field(field_marker.field) {
                    Some(value) => {
                        table.insert(field_marker.marker.as_str(), &value, PairSource::Profile)?;
                    }
                    None => tracing::warn!(
                        marker = %field_marker.marker,
                        field = ?field_marker.field,
                        "field marker points at an empty profile field"
                    ),
                }
            }
        }
        for (marker, replacement) in &self.fallbacks {
            table.insert(marker, replacement, PairSource::Fallback)?;
        }

        let mut pairs = table.pairs;
        pairs.sort_by(|a, b| {
            b.marker
                .chars()
                .count()
                .cmp(&a.marker.chars().count())
                .then_with(|| a.marker.cmp(&b.marker))
        });

        let by_marker = pairs
            .iter()
            .enumerate()
            .map(|(i, p)| (p.marker.clone(), i))
            .collect();
        let mut by_first_char: HashMap<char, Vec<usize>> = HashMap::new();
        for (i, pair) in pairs.iter().enumerate() {
            if let Some(first) = pair.marker.chars().next() {
                by_first_char.entry(first).or_default().push(i);
            }
        }

        let mut shields: Vec<String> = pairs
            .iter()
            .map(|p| p.replacement.clone())
            .filter(|r| pairs.iter().any(|p| r.contains(p.marker.as_str())))
            .collect();
        shields.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        shields.dedup();
        let mut shield_by_first_char: HashMap<char, Vec<usize>> = HashMap::new();
        for (i, shield) in shields.iter().enumerate() {
            if let Some(first) = shield.chars().next() {
                shield_by_first_char.entry(first).or_default().push(i);
            }
        }
        if !shields.is_empty() {
            tracing::debug!(shields = shields.len(), "replacements containing markers");
        }

        let mut real_names: Vec<String> = profiles.iter().map(|p| p.legal_name.clone()).collect();
        real_names.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
        real_names.dedup();

        let name_patterns = real_names.iter().filter_map(|n| NamePattern::compile(n)).collect();
        let slot_patterns = SlotPattern::compile_all(profiles.iter().flat_map(EntityProfile::claimed_markers));

        tracing::debug!(
            pairs = pairs.len(),
            profiles = profiles.len(),
            "built identity map"
        );

        Ok(IdentityMap {
            pairs,
            by_marker,
            by_first_char,
            shields,
            shield_by_first_char,
            profiles,
            profile_by_marker,
            real_names,
            name_patterns,
            slot_patterns,
        })
    }
}

/// Build a map from profiles and an explicit override table
///
/// The default fallback table applies with lowest precedence.
///
/// # Errors
/// See [`IdentityMapBuilder::build`]
pub fn build(profiles: &[EntityProfile], extra_pairs: &[(String, String)]) -> IdentityResult<IdentityMap> {
    IdentityMapBuilder::new()
        .with_overrides(extra_pairs.iter().cloned())
        .with_profiles(profiles.iter().cloned())
        .build()
}

#[derive(Default)]
struct PairTable {
    pairs: Vec<SubstitutionPair>,
    seen: HashMap<String, PairSource>,
}

impl PairTable {
    fn insert(&mut self, marker: &str, replacement: &str, source: PairSource) -> IdentityResult<()> {
        let marker = Marker::new(marker)?;
        if let Some(existing) = self.seen.get(marker.as_str()) {
            tracing::trace!(%marker, ?existing, ?source, "marker already mapped, keeping earlier source");
            return Ok(());
        }
        self.seen.insert(marker.as_str().to_string(), source);
        self.pairs.push(SubstitutionPair {
            marker: marker.into(),
            replacement: replacement.to_string(),
            source,
        });
        Ok(())
    }
}

fn claim_markers(profiles: &[EntityProfile]) -> IdentityResult<HashMap<String, usize>> {
    let mut claims: HashMap<String, usize> = HashMap::new();
    for (idx, profile) in profiles.iter().enumerate() {
        for marker in profile.claimed_markers() {
            match claims.get(marker.as_str()) {
                Some(&owner) if owner != idx && profiles[owner] != *profile => {
                    return Err(IdentityError::duplicate(
                        marker.as_str(),
                        profiles[owner].marker.as_str(),
                        profile.marker.as_str(),
                    ));
                }
                Some(_) => {}
                None => {
                    claims.insert(marker.as_str().to_string(), idx);
                }
            }
        }
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileField;

    fn marker(s: &str) -> Marker {
        Marker::new(s).unwrap()
    }

    fn lessor() -> EntityProfile {
        EntityProfile::company(marker("某某公司1"), "东方国际融资租赁有限公司")
            .with_address("上海市浦东新区世纪大道100号")
            .with_field_marker(marker("某某公司1地址"), ProfileField::Address)
    }

    fn lessee() -> EntityProfile {
        EntityProfile::company(marker("某某公司12"), "南昌宏昌商业零售有限公司")
    }

    #[test]
    fn pairs_sorted_longest_first() {
        let map = build(&[lessor(), lessee()], &[]).unwrap();
        let lens: Vec<usize> = map.pairs().iter().map(|p| p.marker().chars().count()).collect();
        let mut sorted = lens.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(lens, sorted);
    }

    #[test]
    fn override_beats_profile_beats_fallback() {
        let profile = EntityProfile::company(marker("某某银行"), "上海浦东发展银行");
        let map = IdentityMapBuilder::new()
            .with_override("某某公司1", "覆盖名称")
            .with_profile(lessor())
            .with_profile(profile)
            .build()
            .unwrap();

        assert_eq!(map.resolve("某某公司1"), Some("覆盖名称"));
        assert_eq!(map.resolve("某某银行"), Some("上海浦东发展银行"));
        assert_eq!(map.resolve("某某公证处"), Some("上海市东方公证处"));

        let source = map
            .pairs()
            .iter()
            .find(|p| p.marker() == "某某公司1")
            .map(SubstitutionPair::source);
        assert_eq!(source, Some(PairSource::Override));
    }

    #[test]
    fn profile_without_name_is_skipped() {
        let blank = EntityProfile::company(marker("某某公司9"), "");
        let map = build(&[blank], &[]).unwrap();
        assert_eq!(map.resolve("某某公司9"), None);
        assert!(map.profiles().is_empty());
    }

    #[test]
    fn distinct_profiles_sharing_marker_rejected() {
        let a = EntityProfile::company(marker("某某公司3"), "甲公司");
        let b = EntityProfile::company(marker("某某公司3"), "乙公司");
        let err = build(&[a, b], &[]).unwrap_err();
        assert!(matches!(err, IdentityError::DuplicateMarker { .. }));
    }

    #[test]
    fn identical_profile_twice_is_tolerated() {
        let map = build(&[lessee(), lessee()], &[]).unwrap();
        assert_eq!(map.resolve("某某公司12"), Some("南昌宏昌商业零售有限公司"));
    }

    #[test]
    fn alias_colliding_with_other_primary_rejected() {
        let a = EntityProfile::company(marker("某某公司3"), "甲公司");
        let b = EntityProfile::company(marker("某某公司4"), "乙公司").with_alias(marker("某某公司3"));
        assert!(build(&[a, b], &[]).is_err());
    }

    #[test]
    fn empty_override_marker_rejected() {
        let err = IdentityMapBuilder::new().with_override(" ", "x").build().unwrap_err();
        assert_eq!(err, IdentityError::EmptyMarker);
    }

    #[test]
    fn field_marker_resolves_to_field() {
        let map = build(&[lessor()], &[]).unwrap();
        assert_eq!(map.resolve("某某公司1地址"), Some("上海市浦东新区世纪大道100号"));
        assert_eq!(
            map.profile("某某公司1地址").map(|p| p.legal_name.as_str()),
            Some("东方国际融资租赁有限公司")
        );
    }

    #[test]
    fn literal_substitution_respects_digit_boundary() {
        let map = IdentityMapBuilder::new()
            .without_fallbacks()
            .with_profile(lessor())
            .build()
            .unwrap();
        // 某某公司12 is not mapped here; 某某公司1 must not eat its prefix
        assert_eq!(map.substitute_literal("某某公司12与某某公司1"), "某某公司12与东方国际融资租赁有限公司");
    }

    #[test]
    fn literal_substitution_longest_wins() {
        let map = build(&[lessor(), lessee()], &[]).unwrap();
        assert_eq!(
            map.substitute_literal("出租人某某公司1，承租人某某公司12。"),
            "出租人东方国际融资租赁有限公司，承租人南昌宏昌商业零售有限公司。"
        );
    }

    fn aliased() -> IdentityMap {
        IdentityMapBuilder::new()
            .without_fallbacks()
            .with_profile(
                EntityProfile::company(marker("某某公司1"), "宏昌租赁有限公司").with_alias(marker("宏昌租赁")),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn alias_inside_its_own_name_resolves_once() {
        let map = aliased();
        assert_eq!(map.shields(), ["宏昌租赁有限公司".to_string()]);

        let once = map.apply("出租人宏昌租赁与承租人签约");
        assert_eq!(once, "出租人宏昌租赁有限公司与承租人签约");
        assert_eq!(map.apply(&once), once);
        assert_eq!(map.substitute_literal("宏昌租赁有限公司、宏昌租赁"), "宏昌租赁有限公司、宏昌租赁有限公司");
    }

    #[test]
    fn residual_markers_skip_shielded_alias() {
        let map = aliased();
        let mut residual: Vec<&str> = map.residual_markers().collect();
        residual.sort_unstable();
        assert_eq!(residual, vec!["某某公司1"]);
    }

    #[test]
    fn without_fallbacks_leaves_institutions() {
        let map = IdentityMapBuilder::new().without_fallbacks().build().unwrap();
        assert!(map.is_empty());
        assert_eq!(map.apply("某某银行"), "某某银行");
    }
}
