//! The boundary between the reconciliation engine and the remote service.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ApplyError;
use crate::model::{ConditionSpec, Policy, PolicyCondition, Project};

/// Remote operations the engine needs from Dependency-Track.
///
/// Implementations perform one request per call and never retry. Missing
/// entities must be reported as [`ApplyError::NotFound`] so callers can
/// decide whether to tolerate them; every other failure is reported as
/// [`ApplyError::Transport`] or [`ApplyError::Service`].
///
/// # Example
///
/// ```ignore
/// use dtrack_policy_core::{ApplyError, Policy, PolicyAccessor};
///
/// async fn fetch_or_create(remote: &dyn PolicyAccessor, name: &str) -> Result<Policy, ApplyError> {
///     match remote.policy_by_name(name).await {
///         Err(e) if e.is_not_found() => remote.create_policy(name).await,
///         other => other,
///     }
/// }
/// ```
#[async_trait]
pub trait PolicyAccessor: Send + Sync {
    // ==================== Policies ====================

    /// Fetches a policy, with its tags, projects and conditions, by exact name.
    ///
    /// # Errors
    ///
    /// Returns `ApplyError::NotFound` if no policy has this name.
    async fn policy_by_name(&self, name: &str) -> Result<Policy, ApplyError>;

    /// Creates an empty policy. The service ignores operator and violation
    /// state on creation, so callers must follow up with
    /// [`PolicyAccessor::update_policy`].
    ///
    /// # Errors
    ///
    /// Returns an error for transport or service failures.
    async fn create_policy(&self, name: &str) -> Result<Policy, ApplyError>;

    /// Writes the policy's operator and violation state.
    ///
    /// # Errors
    ///
    /// Returns an error for transport or service failures.
    async fn update_policy(&self, policy: &Policy) -> Result<Policy, ApplyError>;

    // ==================== Tags ====================

    /// Attaches a tag to a policy.
    ///
    /// # Errors
    ///
    /// Returns `ApplyError::NotFound` if the policy or tag is missing.
    async fn attach_tag(&self, policy: Uuid, tag: &str) -> Result<(), ApplyError>;

    /// Detaches a tag from a policy without deleting the tag.
    ///
    /// # Errors
    ///
    /// Returns `ApplyError::NotFound` if the policy, tag or association is missing.
    async fn detach_tag(&self, policy: Uuid, tag: &str) -> Result<(), ApplyError>;

    // ==================== Projects ====================

    /// Looks up exactly one project version.
    ///
    /// # Errors
    ///
    /// Returns `ApplyError::NotFound` if no project has this name and version.
    async fn project_by_name_version(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Project, ApplyError>;

    /// Returns every version of the projects with this name; empty if none.
    ///
    /// # Errors
    ///
    /// Returns an error for transport or service failures.
    async fn projects_by_name(&self, name: &str) -> Result<Vec<Project>, ApplyError>;

    /// Associates a project with a policy.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure, including missing entities.
    async fn attach_project(&self, policy: Uuid, project: Uuid) -> Result<(), ApplyError>;

    /// Removes a project association from a policy.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure, including missing entities.
    async fn detach_project(&self, policy: Uuid, project: Uuid) -> Result<(), ApplyError>;

    // ==================== Conditions ====================

    /// Creates a condition owned by the policy.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure.
    async fn create_condition(
        &self,
        policy: Uuid,
        condition: &ConditionSpec,
    ) -> Result<PolicyCondition, ApplyError>;

    /// Hard-deletes a condition.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure.
    async fn delete_condition(&self, condition: Uuid) -> Result<(), ApplyError>;
}
