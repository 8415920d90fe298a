//! Applies a [`DesiredState`] to the remote policy.
//!
//! The policy itself is converged first (created or updated), then each
//! collection pass runs in [`Pass::ORDER`]. Within a pass removals are issued
//! before additions. A fatal error stops the run where it is; everything
//! applied up to that point stays applied and a re-run picks up from there.

use std::future::Future;

use tracing::{debug, info};
use uuid::Uuid;

use crate::accessor::PolicyAccessor;
use crate::audit::{AuditEvent, AuditSink};
use crate::desired::DesiredState;
use crate::differ::{Delta, diff};
use crate::error::ApplyError;
use crate::model::{Policy, PolicyCondition};

/// What a pass does when a single remote call reports `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundPolicy {
    /// Warn, record a skip and carry on with the next call.
    Tolerate,
    /// Abort the run.
    Fatal,
}

/// Collection passes, run after the policy attributes are converged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    /// Tags attached to the policy.
    Tags,
    /// Projects the policy is limited to.
    Projects,
    /// The policy's conditions, matched on value.
    Conditions,
}

impl Pass {
    /// Execution order of the passes within one run.
    pub const ORDER: [Self; 3] = [Self::Tags, Self::Projects, Self::Conditions];

    /// Prefix used in audit messages.
    #[must_use]
    pub const fn stage(self) -> &'static str {
        match self {
            Self::Tags => "apply tags",
            Self::Projects => "apply projects",
            Self::Conditions => "apply policyConditions",
        }
    }

    /// How a `NotFound` from this pass's remote calls is handled.
    #[must_use]
    pub const fn not_found_policy(self) -> NotFoundPolicy {
        match self {
            Self::Tags => NotFoundPolicy::Tolerate,
            Self::Projects | Self::Conditions => NotFoundPolicy::Fatal,
        }
    }
}

/// What happened to the policy entity itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PolicyChange {
    /// Fetched with matching attributes; nothing written.
    #[default]
    Unchanged,
    /// Created, then given its operator and violation state.
    Created,
    /// Operator or violation state rewritten.
    Updated,
}

/// Calls issued by one collection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassCounts {
    /// Entries detached or deleted.
    pub removed: usize,
    /// Entries attached or created.
    pub added: usize,
    /// Calls that answered `NotFound` and were tolerated.
    pub skipped: usize,
}

impl PassCounts {
    /// Removals plus additions that went through.
    #[must_use]
    pub const fn changes(&self) -> usize {
        self.removed + self.added
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// UUID of the converged policy; nil in a dry run that would create it.
    pub policy_uuid: Uuid,
    /// What happened to the policy entity.
    pub policy: PolicyChange,
    /// Tag pass counts.
    pub tags: PassCounts,
    /// Project pass counts.
    pub projects: PassCounts,
    /// Condition pass counts.
    pub conditions: PassCounts,
}

impl ApplyReport {
    /// Counts for one pass.
    #[must_use]
    pub fn pass(&self, pass: Pass) -> PassCounts {
        match pass {
            Pass::Tags => self.tags,
            Pass::Projects => self.projects,
            Pass::Conditions => self.conditions,
        }
    }

    fn pass_mut(&mut self, pass: Pass) -> &mut PassCounts {
        match pass {
            Pass::Tags => &mut self.tags,
            Pass::Projects => &mut self.projects,
            Pass::Conditions => &mut self.conditions,
        }
    }

    /// Number of mutations that went through, tolerated skips excluded.
    #[must_use]
    pub fn changes(&self) -> usize {
        let policy = match self.policy {
            PolicyChange::Unchanged => 0,
            PolicyChange::Created | PolicyChange::Updated => 1,
        };
        policy + Pass::ORDER.iter().map(|p| self.pass(*p).changes()).sum::<usize>()
    }

    /// Number of tolerated `NotFound` responses.
    #[must_use]
    pub fn skipped(&self) -> usize {
        Pass::ORDER.iter().map(|p| self.pass(*p).skipped).sum()
    }

    /// Returns `true` when the remote policy already matched.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.changes() == 0 && self.skipped() == 0
    }
}

enum Outcome {
    Applied,
    Skipped,
}

/// Drives one reconciliation run against a remote accessor.
pub struct Synchronizer<'a> {
    remote: &'a dyn PolicyAccessor,
    audit: &'a dyn AuditSink,
}

impl<'a> Synchronizer<'a> {
    /// Every change is recorded to `audit` before it is sent to `remote`.
    pub fn new(remote: &'a dyn PolicyAccessor, audit: &'a dyn AuditSink) -> Self {
        Self { remote, audit }
    }

    /// Converges the remote policy to `desired`.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error; no later call is issued after it.
    pub async fn apply(&self, desired: &DesiredState) -> Result<ApplyReport, ApplyError> {
        info!(policy = %desired.policy_name, "starting reconciliation");

        let mut report = ApplyReport::default();
        let policy = self.apply_policy(desired, &mut report).await?;
        report.policy_uuid = policy.uuid;

        for pass in Pass::ORDER {
            let counts = match pass {
                Pass::Tags => self.apply_tags(&policy, desired).await?,
                Pass::Projects => self.apply_projects(&policy, desired).await?,
                Pass::Conditions => self.apply_conditions(&policy, desired).await?,
            };
            *report.pass_mut(pass) = counts;
        }

        info!(
            policy = %desired.policy_name,
            changes = report.changes(),
            skipped = report.skipped(),
            "reconciliation complete"
        );
        Ok(report)
    }

    async fn apply_policy(
        &self,
        desired: &DesiredState,
        report: &mut ApplyReport,
    ) -> Result<Policy, ApplyError> {
        match self.remote.policy_by_name(&desired.policy_name).await {
            Ok(policy) => {
                if !policy.needs_attribute_update(desired.operator, desired.violation_state) {
                    debug!(policy = %policy.name, "policy attributes already match");
                    return Ok(policy);
                }
                self.audit.record(AuditEvent::PolicyUpdated {
                    name: policy.name.clone(),
                    operator: desired.operator,
                    violation_state: desired.violation_state,
                });
                report.policy = PolicyChange::Updated;
                self.write_attributes(policy, desired).await
            }
            Err(e) if e.is_not_found() => {
                self.audit.record(AuditEvent::PolicyCreated {
                    name: desired.policy_name.clone(),
                });
                let created = self.remote.create_policy(&desired.policy_name).await?;
                report.policy = PolicyChange::Created;
                self.apply_initial_attributes(created, desired).await
            }
            Err(e) => Err(e),
        }
    }

    /// Dependency-Track ignores operator and violation state when a policy is
    /// created (DependencyTrack/dependency-track#2365), so they are written
    /// with a separate update right after creation.
    async fn apply_initial_attributes(
        &self,
        created: Policy,
        desired: &DesiredState,
    ) -> Result<Policy, ApplyError> {
        self.write_attributes(created, desired).await
    }

    async fn write_attributes(
        &self,
        mut policy: Policy,
        desired: &DesiredState,
    ) -> Result<Policy, ApplyError> {
        policy.operator = desired.operator;
        policy.violation_state = desired.violation_state;
        self.remote.update_policy(&policy).await
    }

    async fn apply_tags(
        &self,
        policy: &Policy,
        desired: &DesiredState,
    ) -> Result<PassCounts, ApplyError> {
        let delta = diff(&policy.tags, &desired.tags, |t| t.name.clone());
        log_delta(Pass::Tags, &delta);

        let mut counts = PassCounts::default();
        for tag in &delta.to_remove {
            let event = AuditEvent::TagDetached {
                tag: tag.name.clone(),
            };
            let outcome = self
                .issue(Pass::Tags, event, self.remote.detach_tag(policy.uuid, &tag.name))
                .await?;
            tally(&mut counts, outcome, Change::Remove);
        }
        for tag in &delta.to_add {
            let event = AuditEvent::TagAttached {
                tag: tag.name.clone(),
            };
            let outcome = self
                .issue(Pass::Tags, event, self.remote.attach_tag(policy.uuid, &tag.name))
                .await?;
            tally(&mut counts, outcome, Change::Add);
        }
        Ok(counts)
    }

    async fn apply_projects(
        &self,
        policy: &Policy,
        desired: &DesiredState,
    ) -> Result<PassCounts, ApplyError> {
        let delta = diff(&policy.project_uuids(), &desired.project_uuids, |u| *u);
        log_delta(Pass::Projects, &delta);

        let mut counts = PassCounts::default();
        for project in &delta.to_remove {
            let event = AuditEvent::ProjectDetached { project: *project };
            let outcome = self
                .issue(
                    Pass::Projects,
                    event,
                    self.remote.detach_project(policy.uuid, *project),
                )
                .await?;
            tally(&mut counts, outcome, Change::Remove);
        }
        for project in &delta.to_add {
            let event = AuditEvent::ProjectAttached { project: *project };
            let outcome = self
                .issue(
                    Pass::Projects,
                    event,
                    self.remote.attach_project(policy.uuid, *project),
                )
                .await?;
            tally(&mut counts, outcome, Change::Add);
        }
        Ok(counts)
    }

    async fn apply_conditions(
        &self,
        policy: &Policy,
        desired: &DesiredState,
    ) -> Result<PassCounts, ApplyError> {
        let wanted: Vec<PolicyCondition> = desired
            .conditions
            .iter()
            .map(PolicyCondition::unsaved)
            .collect();
        let delta = diff(&policy.policy_conditions, &wanted, |c| c.value.clone());
        log_delta(Pass::Conditions, &delta);

        let mut counts = PassCounts::default();
        for condition in &delta.to_remove {
            let event = AuditEvent::ConditionDeleted {
                condition: condition.clone(),
            };
            let outcome = self
                .issue(
                    Pass::Conditions,
                    event,
                    self.remote.delete_condition(condition.uuid),
                )
                .await?;
            tally(&mut counts, outcome, Change::Remove);
        }
        for condition in &delta.to_add {
            // The differ keeps the first desired entry per value.
            let Some(spec) = desired
                .conditions
                .iter()
                .find(|c| c.value == condition.value)
            else {
                continue;
            };
            let event = AuditEvent::ConditionCreated {
                condition: spec.clone(),
            };
            let call = async {
                self.remote
                    .create_condition(policy.uuid, spec)
                    .await
                    .map(|_| ())
            };
            let outcome = self.issue(Pass::Conditions, event, call).await?;
            tally(&mut counts, outcome, Change::Add);
        }
        Ok(counts)
    }

    /// Records `event`, awaits the remote call and classifies its failure
    /// according to the pass's [`NotFoundPolicy`].
    async fn issue<F>(&self, pass: Pass, event: AuditEvent, call: F) -> Result<Outcome, ApplyError>
    where
        F: Future<Output = Result<(), ApplyError>>,
    {
        let description = event.to_string();
        self.audit.record(event);

        match call.await {
            Ok(()) => Ok(Outcome::Applied),
            Err(e) if e.is_not_found() && pass.not_found_policy() == NotFoundPolicy::Tolerate => {
                self.audit.record(AuditEvent::Skipped {
                    stage: pass.stage(),
                    reason: format!("{description}: {e}"),
                });
                Ok(Outcome::Skipped)
            }
            Err(e) => Err(e),
        }
    }
}

enum Change {
    Remove,
    Add,
}

fn tally(counts: &mut PassCounts, outcome: Outcome, change: Change) {
    match (outcome, change) {
        (Outcome::Skipped, _) => counts.skipped += 1,
        (Outcome::Applied, Change::Remove) => counts.removed += 1,
        (Outcome::Applied, Change::Add) => counts.added += 1,
    }
}

fn log_delta<T>(pass: Pass, delta: &Delta<T>) {
    debug!(
        stage = pass.stage(),
        remove = delta.to_remove.len(),
        add = delta.to_add.len(),
        "computed delta"
    );
}
