//! An accessor that reads through to the real remote and fakes every write.

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::accessor::PolicyAccessor;
use crate::error::ApplyError;
use crate::model::{
    ConditionSpec, Policy, PolicyCondition, PolicyOperator, Project, ViolationState,
};

/// Wraps an accessor so a run reports what it would change without changing it.
///
/// Lookups go to the inner accessor. Mutations succeed immediately: a created
/// policy comes back empty with a nil UUID, an updated policy is echoed.
pub struct DryRunAccessor<A> {
    inner: A,
}

impl<A: PolicyAccessor> DryRunAccessor<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> A {
        self.inner
    }
}

#[async_trait]
impl<A: PolicyAccessor> PolicyAccessor for DryRunAccessor<A> {
    async fn policy_by_name(&self, name: &str) -> Result<Policy, ApplyError> {
        self.inner.policy_by_name(name).await
    }

    async fn create_policy(&self, name: &str) -> Result<Policy, ApplyError> {
        debug!(name, "dry run: create policy suppressed");
        Ok(Policy {
            uuid: Uuid::nil(),
            name: name.to_string(),
            operator: PolicyOperator::Any,
            violation_state: ViolationState::Info,
            policy_conditions: Vec::new(),
            projects: Vec::new(),
            tags: Vec::new(),
        })
    }

    async fn update_policy(&self, policy: &Policy) -> Result<Policy, ApplyError> {
        debug!(name = %policy.name, "dry run: update policy suppressed");
        Ok(policy.clone())
    }

    async fn attach_tag(&self, _policy: Uuid, tag: &str) -> Result<(), ApplyError> {
        debug!(tag, "dry run: attach tag suppressed");
        Ok(())
    }

    async fn detach_tag(&self, _policy: Uuid, tag: &str) -> Result<(), ApplyError> {
        debug!(tag, "dry run: detach tag suppressed");
        Ok(())
    }

    async fn project_by_name_version(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Project, ApplyError> {
        self.inner.project_by_name_version(name, version).await
    }

    async fn projects_by_name(&self, name: &str) -> Result<Vec<Project>, ApplyError> {
        self.inner.projects_by_name(name).await
    }

    async fn attach_project(&self, _policy: Uuid, project: Uuid) -> Result<(), ApplyError> {
        debug!(%project, "dry run: attach project suppressed");
        Ok(())
    }

    async fn detach_project(&self, _policy: Uuid, project: Uuid) -> Result<(), ApplyError> {
        debug!(%project, "dry run: detach project suppressed");
        Ok(())
    }

    async fn create_condition(
        &self,
        _policy: Uuid,
        condition: &ConditionSpec,
    ) -> Result<PolicyCondition, ApplyError> {
        debug!(%condition, "dry run: create condition suppressed");
        Ok(PolicyCondition::unsaved(condition))
    }

    async fn delete_condition(&self, condition: Uuid) -> Result<(), ApplyError> {
        debug!(%condition, "dry run: delete condition suppressed");
        Ok(())
    }
}
