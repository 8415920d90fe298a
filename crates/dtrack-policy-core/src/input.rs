//! Raw user input, before normalisation.

use crate::error::ApplyError;
use crate::model::{ConditionSpec, PolicyOperator, ViolationState};

/// Everything the caller supplied for one run, as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyInput {
    pub policy_name: String,
    pub operator: PolicyOperator,
    pub violation_state: ViolationState,
    /// Project specifiers, `name` or `name:version`.
    pub projects: Vec<String>,
    pub tags: Vec<String>,
    pub conditions: Vec<ConditionSpec>,
}

/// Parses the JSON condition document read from stdin.
///
/// The document must be an array of `{subject, operator, value}` objects.
/// A literal `null` is accepted as an empty list.
///
/// # Errors
///
/// Returns [`ApplyError::MalformedInput`] when the document is not valid JSON,
/// is not an array, misses a field, or names an unknown subject or operator.
pub fn parse_conditions(document: &[u8]) -> Result<Vec<ConditionSpec>, ApplyError> {
    serde_json::from_slice::<Option<Vec<ConditionSpec>>>(document)
        .map(Option::unwrap_or_default)
        .map_err(|e| ApplyError::malformed_input(format!("policy conditions: {e}")))
}
