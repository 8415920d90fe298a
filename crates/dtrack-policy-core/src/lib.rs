//! # dtrack-policy-core
//!
//! Reconciliation engine for OWASP Dependency-Track policies.
//!
//! Given the declared state of one policy (operator, violation state, tags,
//! projects and conditions) the engine fetches the policy's current state and
//! issues only the create/update/attach/detach/delete calls needed to make
//! the two agree. Running it twice in a row issues nothing the second time.
//!
//! ## Overview
//!
//! - [`diff`] computes keyed add/remove sets and is shared by every pass.
//! - [`DesiredState::build`] deduplicates tags and resolves project
//!   specifiers (`name` or `name:version`) to UUIDs.
//! - [`Synchronizer::apply`] converges the policy attributes, then tags,
//!   projects and conditions, in that order.
//! - [`PolicyAccessor`] is the remote boundary; the HTTP implementation lives
//!   in `dtrack-policy-client`. [`DryRunAccessor`] wraps any accessor and
//!   suppresses its writes.
//! - [`AuditSink`] receives one [`AuditEvent`] per issued change or
//!   tolerated skip.
//!
//! ## Example
//!
//! ```ignore
//! use dtrack_policy_core::prelude::*;
//!
//! async fn run(remote: &dyn PolicyAccessor, input: &PolicyInput) -> Result<ApplyReport, ApplyError> {
//!     let audit = TracingAuditSink::new();
//!     let desired = DesiredState::build(remote, input, &audit).await?;
//!     Synchronizer::new(remote, &audit).apply(&desired).await
//! }
//! ```

mod accessor;
mod audit;
mod desired;
mod differ;
mod dry_run;
mod error;
mod input;
mod model;
mod sync;

pub use accessor::PolicyAccessor;
pub use audit::{AuditEvent, AuditSink, RecordingAuditSink, TracingAuditSink};
pub use desired::{DesiredState, ProjectRef, normalize_tags, resolve_projects};
pub use differ::{Delta, diff};
pub use dry_run::DryRunAccessor;
pub use error::{ApplyError, ErrorCategory};
pub use input::{PolicyInput, parse_conditions};
pub use model::{
    ConditionOperator, ConditionSpec, ConditionSubject, ParseEnumError, Policy, PolicyCondition,
    PolicyOperator, Project, Tag, ViolationState,
};
pub use sync::{ApplyReport, NotFoundPolicy, Pass, PassCounts, PolicyChange, Synchronizer};

/// Type alias for an apply result.
pub type ApplyResult<T> = Result<T, ApplyError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use dtrack_policy_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::accessor::PolicyAccessor;
    pub use crate::audit::{AuditEvent, AuditSink, RecordingAuditSink, TracingAuditSink};
    pub use crate::desired::DesiredState;
    pub use crate::dry_run::DryRunAccessor;
    pub use crate::error::ApplyError;
    pub use crate::input::{PolicyInput, parse_conditions};
    pub use crate::model::{
        ConditionOperator, ConditionSpec, ConditionSubject, Policy, PolicyCondition,
        PolicyOperator, Project, Tag, ViolationState,
    };
    pub use crate::sync::{ApplyReport, Synchronizer};
    pub use crate::ApplyResult;
}
