//! Evidence package generator
//!
//! Per exhibit: prompt context → retry loop (resolution applied to every
//! reply before gating) → persisted artifact → manifest entry. Exhibits are
//! generated one after another in group order; an exhausted exhibit is still
//! written and reported, never dropped.

use crate::config::PackageConfig;
use crate::error::{PackageError, PackageResult};
use crate::index::{EntryStatus, EvidenceIndex, IndexEntry};
use crate::model::{EvidenceGroup, EvidenceItem};
use crate::naming::{self, NameRegistry};
use crate::policy::FabricationPolicy;
use crate::prompt::PromptContext;
use crate::report::{GenerationReport, IdentityGap, ItemReport};
use crate::store::{ArtifactStore, StoredArtifact};
use epa_identity::IdentityMap;
use epa_quality::QualityGate;
use epa_retry::{CancellationToken, GenerationOutcome, Generator, RetryOrchestrator};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// One generated exhibit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    /// The planned exhibit
    pub item: EvidenceItem,
    /// How generation ended; content is already resolved
    pub outcome: GenerationOutcome,
    /// Where it was written
    pub stored: StoredArtifact,
}

/// Everything a package run produced
#[derive(Debug, Clone)]
pub struct EvidencePackage {
    /// Manifest
    pub index: EvidenceIndex,
    /// Generation report
    pub report: GenerationReport,
    /// Exhibits in generation order
    pub artifacts: Vec<GeneratedArtifact>,
}

impl EvidencePackage {
    /// Exhibits grouped by group id, groups in generation order
    #[must_use]
    pub fn groups(&self) -> Vec<(u32, Vec<&GeneratedArtifact>)> {
        let mut groups: IndexMap<u32, Vec<&GeneratedArtifact>> = IndexMap::new();
        for artifact in &self.artifacts {
            groups.entry(artifact.item.group).or_default().push(artifact);
        }
        groups.into_iter().collect()
    }

    /// Display name of a group, as recorded in the manifest
    #[must_use]
    pub fn group_name(&self, group: u32) -> Option<&str> {
        self.index
            .groups
            .iter()
            .find(|g| g.group_id == group)
            .map(|g| g.group_name.as_str())
    }
}

/// Drives generation for a whole package
pub struct EvidencePackageGenerator<S> {
    config: PackageConfig,
    identity: Arc<IdentityMap>,
    store: S,
    policy: FabricationPolicy,
    gate: QualityGate,
    groups: Vec<EvidenceGroup>,
    cancel: Option<CancellationToken>,
    sleeper: Option<Arc<dyn Fn(Duration) + Send + Sync>>,
}

impl<S: ArtifactStore> EvidencePackageGenerator<S> {
    /// Generator writing to `store`, gating with the map's markers registered
    #[must_use]
    pub fn new(config: PackageConfig, identity: Arc<IdentityMap>, store: S) -> Self {
        let gate = QualityGate::new().with_literal_markers(identity.residual_markers());
        Self {
            config,
            identity,
            store,
            policy: FabricationPolicy::default(),
            gate,
            groups: Vec::new(),
            cancel: None,
            sleeper: None,
        }
    }

    /// With fabrication policy
    #[must_use]
    pub fn with_policy(mut self, policy: FabricationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Declare a named group
    ///
    /// Once any group is declared, every item must belong to a declared one.
    #[must_use]
    pub fn with_group(mut self, group: EvidenceGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// With cancellation, checked before every generation attempt
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// With custom sleep for transport backoff
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        self.sleeper = Some(Arc::new(sleeper));
        self
    }

    /// Artifact store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Gate used on every reply
    #[inline]
    #[must_use]
    pub fn gate(&self) -> &QualityGate {
        &self.gate
    }

    fn orchestrator(&self) -> RetryOrchestrator {
        let mut orchestrator =
            RetryOrchestrator::new(self.config.retry_policy()).with_gate(self.gate.clone());
        if let Some(token) = &self.cancel {
            orchestrator = orchestrator.with_cancellation(token.clone());
        }
        if let Some(sleeper) = &self.sleeper {
            let sleeper = Arc::clone(sleeper);
            orchestrator = orchestrator.with_sleeper(move |d| sleeper(d));
        }
        orchestrator
    }

    fn group_name(&self, group: u32) -> String {
        self.groups
            .iter()
            .find(|g| g.id == group)
            .map_or_else(|| self.config.group_label(group), |g| g.name.clone())
    }

    /// Check every item before anything is generated
    ///
    /// # Errors
    /// [`PackageError::Policy`] for an invented verbatim value,
    /// [`PackageError::UnknownGroup`] for an undeclared group
    pub fn validate(&self, items: &[EvidenceItem]) -> PackageResult<()> {
        for item in items {
            self.policy.enforce(item)?;
            if !self.groups.is_empty() && !self.groups.iter().any(|g| g.id == item.group) {
                return Err(PackageError::UnknownGroup(item.group));
            }
        }
        Ok(())
    }

    /// Generate, persist and index every item
    ///
    /// # Errors
    /// Planning defects (see [`validate`](Self::validate)) abort before any
    /// generation. Store failures abort the run. Exhibits that never produced
    /// clean text do not: they are written, flagged and reported.
    pub fn generate<G>(&self, items: &[EvidenceItem], generator: &mut G) -> PackageResult<EvidencePackage>
    where
        G: Generator + ?Sized,
    {
        self.validate(items)?;

        let mut grouped: IndexMap<u32, Vec<&EvidenceItem>> = IndexMap::new();
        for item in items {
            grouped.entry(item.group).or_default().push(item);
        }

        let orchestrator = self.orchestrator();
        let registry = NameRegistry::new();
        let mut report = GenerationReport::start();
        let mut index = EvidenceIndex::builder();
        for group in &self.groups {
            index = index.with_group_name(group.id, group.name.clone());
        }
        let mut artifacts = Vec::with_capacity(items.len());

        tracing::info!(
            run_id = %report.run_id,
            items = items.len(),
            groups = grouped.len(),
            "generating evidence package"
        );

        for (group, members) in &grouped {
            let group_label = self.config.group_label(*group);
            let group_name = self.group_name(*group);
            tracing::info!(group, items = members.len(), "generating evidence group");

            for (loop_index, item) in members.iter().enumerate() {
                let evidence_id = item.id();
                let context =
                    PromptContext::build(item, &group_name, &self.identity, &self.gate, &self.policy);
                if context.has_gaps() {
                    tracing::warn!(
                        evidence_id = %evidence_id,
                        withheld = ?context.unresolved,
                        "identity gaps withheld from prompt"
                    );
                    report.record_gaps(context.unresolved.iter().map(|marker| IdentityGap {
                        evidence_id: evidence_id.clone(),
                        marker: marker.clone(),
                    }));
                }

                let prompt = context.render();
                let identity = &self.identity;
                let outcome: GenerationOutcome = orchestrator
                    .run(|| generator.generate(&prompt).map(|raw| identity.apply(&raw)))
                    .into();

                let short_name = naming::short_name(&item.name);
                let stem = registry.claim(
                    *group,
                    &naming::artifact_stem(&group_label, &evidence_id, &short_name),
                    loop_index,
                );
                let relative: PathBuf = Path::new(&group_label).join(format!("{stem}.{}", item.extension));
                let stored = self.store.write(&relative, outcome.content_or_empty().as_bytes())?;

                let status = if outcome.success {
                    EntryStatus::Clean
                } else {
                    tracing::warn!(
                        evidence_id = %evidence_id,
                        attempts = outcome.attempts,
                        unresolved = outcome.unresolved.len(),
                        "exhibit flagged for review"
                    );
                    EntryStatus::Flagged
                };
                index.push(
                    IndexEntry {
                        id: evidence_id.clone(),
                        group: *group,
                        name: item.name.clone(),
                        short_name,
                        declared_type: item.declared_type(),
                        party: item.party,
                        path: stored.path.clone(),
                        byte_size: stored.byte_size,
                        status,
                        attempts: outcome.attempts,
                        unresolved: outcome.unresolved.clone(),
                        digest: stored.digest,
                    },
                    &item.proof_purpose,
                );
                report.record(ItemReport::from_outcome(&evidence_id, &item.name, &outcome));
                artifacts.push(GeneratedArtifact {
                    item: (*item).clone(),
                    outcome,
                    stored,
                });
            }
        }

        let index = index.finish(&self.config.group_label_prefix);
        report.finish();
        self.store
            .write(Path::new(&self.config.manifest_file_name), index.to_json()?.as_bytes())?;
        self.store
            .write(Path::new(&self.config.report_file_name), report.to_json()?.as_bytes())?;

        tracing::info!(
            run_id = %report.run_id,
            clean = report.clean,
            flagged = report.flagged,
            "evidence package complete"
        );
        Ok(EvidencePackage {
            index,
            report,
            artifacts,
        })
    }
}
