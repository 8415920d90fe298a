//! Normalises user input into the desired state of one policy.

use std::collections::HashSet;

use tracing::debug;
use uuid::Uuid;

use crate::accessor::PolicyAccessor;
use crate::audit::{AuditEvent, AuditSink};
use crate::error::ApplyError;
use crate::input::PolicyInput;
use crate::model::{ConditionSpec, PolicyOperator, Tag, ViolationState};

const RESOLVE_STAGE: &str = "resolve projects";

/// Target configuration for one policy, built fresh for every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredState {
    pub policy_name: String,
    pub operator: PolicyOperator,
    pub violation_state: ViolationState,
    /// Deduplicated, first occurrence wins.
    pub tags: Vec<Tag>,
    /// Deduplicated after resolution, first occurrence wins.
    pub project_uuids: Vec<Uuid>,
    /// As supplied; duplicates collapse when diffed.
    pub conditions: Vec<ConditionSpec>,
}

/// A parsed `--policy-projects` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectRef<'a> {
    /// `name:version`, resolving to at most one project.
    NameVersion { name: &'a str, version: &'a str },
    /// `name`, resolving to every version of that project.
    Name(&'a str),
}

impl<'a> ProjectRef<'a> {
    /// Splits on the first `:`. Returns `None` for blank specifiers.
    pub fn parse(specifier: &'a str) -> Option<Self> {
        let specifier = specifier.trim();
        if specifier.is_empty() {
            return None;
        }
        Some(match specifier.split_once(':') {
            Some((name, version)) => Self::NameVersion { name, version },
            None => Self::Name(specifier),
        })
    }
}

/// Deduplicates tag names, keeping the first occurrence and dropping blanks.
pub fn normalize_tags<S: AsRef<str>>(names: &[S]) -> Vec<Tag> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|n| n.as_ref().trim())
        .filter(|n| !n.is_empty() && seen.insert(*n))
        .map(Tag::new)
        .collect()
}

/// Resolves project specifiers to a deduplicated list of project UUIDs.
///
/// Specifiers that match nothing are reported to `audit` as skips and left out.
///
/// # Errors
///
/// Returns the first error other than `NotFound` raised by the remote.
pub async fn resolve_projects<S: AsRef<str>>(
    remote: &dyn PolicyAccessor,
    specifiers: &[S],
    audit: &dyn AuditSink,
) -> Result<Vec<Uuid>, ApplyError> {
    let mut seen = HashSet::new();
    let mut uuids = Vec::new();

    for raw in specifiers {
        let raw = raw.as_ref();
        let Some(reference) = ProjectRef::parse(raw) else {
            audit.record(AuditEvent::Skipped {
                stage: RESOLVE_STAGE,
                reason: "blank project specifier".to_string(),
            });
            continue;
        };

        let found = match reference {
            ProjectRef::NameVersion { name, version } => {
                debug!(name, version, "looking up project version");
                match remote.project_by_name_version(name, version).await {
                    Ok(project) => vec![project],
                    Err(e) if e.is_not_found() => Vec::new(),
                    Err(e) => return Err(e),
                }
            }
            ProjectRef::Name(name) => {
                debug!(name, "looking up project versions");
                match remote.projects_by_name(name).await {
                    Ok(projects) => projects,
                    Err(e) if e.is_not_found() => Vec::new(),
                    Err(e) => return Err(e),
                }
            }
        };

        if found.is_empty() {
            audit.record(AuditEvent::Skipped {
                stage: RESOLVE_STAGE,
                reason: format!("project not found {raw:?}"),
            });
            continue;
        }

        uuids.extend(
            found
                .into_iter()
                .map(|p| p.uuid)
                .filter(|uuid| seen.insert(*uuid)),
        );
    }

    Ok(uuids)
}

impl DesiredState {
    /// Builds the desired state, resolving project specifiers against `remote`.
    ///
    /// # Errors
    ///
    /// Returns any non-`NotFound` error raised while resolving projects.
    pub async fn build(
        remote: &dyn PolicyAccessor,
        input: &PolicyInput,
        audit: &dyn AuditSink,
    ) -> Result<Self, ApplyError> {
        let project_uuids = resolve_projects(remote, &input.projects, audit).await?;
        Ok(Self {
            policy_name: input.policy_name.clone(),
            operator: input.operator,
            violation_state: input.violation_state,
            tags: normalize_tags(&input.tags),
            project_uuids,
            conditions: input.conditions.clone(),
        })
    }
}
