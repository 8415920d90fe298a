//! Audit trail of applied changes and tolerated skips.

use std::fmt;
use std::sync::Mutex;

use uuid::Uuid;

use crate::model::{ConditionSpec, PolicyCondition, PolicyOperator, ViolationState};

/// One change issued against the remote policy, or one tolerated skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    PolicyCreated {
        name: String,
    },
    PolicyUpdated {
        name: String,
        operator: PolicyOperator,
        violation_state: ViolationState,
    },
    TagDetached {
        tag: String,
    },
    TagAttached {
        tag: String,
    },
    ProjectDetached {
        project: Uuid,
    },
    ProjectAttached {
        project: Uuid,
    },
    ConditionDeleted {
        condition: PolicyCondition,
    },
    ConditionCreated {
        condition: ConditionSpec,
    },
    /// A tolerated `NotFound`; the run continued.
    Skipped {
        stage: &'static str,
        reason: String,
    },
}

impl AuditEvent {
    /// Returns `true` for events that describe a tolerated skip.
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PolicyCreated { name } => write!(f, "apply policy: create policy: {name}"),
            Self::PolicyUpdated {
                name,
                operator,
                violation_state,
            } => write!(
                f,
                "apply policy: update policy: {name} (operator={operator}, violationState={violation_state})"
            ),
            Self::TagDetached { tag } => write!(f, "apply tags: remove tag {tag:?}"),
            Self::TagAttached { tag } => write!(f, "apply tags: add tag {tag:?}"),
            Self::ProjectDetached { project } => {
                write!(f, "apply projects: remove project {project}")
            }
            Self::ProjectAttached { project } => write!(f, "apply projects: add project {project}"),
            Self::ConditionDeleted { condition } => {
                write!(f, "apply policyConditions: remove policyCondition: {condition}")
            }
            Self::ConditionCreated { condition } => {
                write!(f, "apply policyConditions: add policyCondition: {condition}")
            }
            Self::Skipped { stage, reason } => write!(f, "{stage}: skipped: {reason}"),
        }
    }
}

/// Receives audit events as they happen.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Writes every event through `tracing`: changes at info, skips at warn.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink {
    dry_run: bool,
}

impl TracingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks every change as planned rather than applied.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        if event.is_skip() {
            tracing::warn!("{event}");
        } else if self.dry_run {
            tracing::info!(dry_run = true, "{event}");
        } else {
            tracing::info!("{event}");
        }
    }
}

/// Keeps events in memory, for tests and for callers that want a summary.
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far, in order.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: AuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
