//! Dependency-Track entities as seen by the reconciliation engine.
//!
//! Field names follow the REST API wire format (camelCase); enumerations
//! serialise as their upper-case API names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Returned when a string is not one of an enumeration's API names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} {value:?}, expected one of: {expected}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
    expected: String,
}

/// Declares a closed string enumeration with serde, `Display` and `FromStr`
/// all agreeing on the API spelling.
macro_rules! api_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant),+
        }

        impl $name {
            /// Every variant, in API documentation order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The API spelling of this value.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                        expected: Self::ALL
                            .iter()
                            .map(|v| v.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }
    };
}

api_enum! {
    /// How a policy combines its conditions.
    PolicyOperator, "policy operator" {
        Any => "ANY",
        All => "ALL",
    }
}

api_enum! {
    /// Severity of the violation a matching policy raises.
    ViolationState, "violation state" {
        Fail => "FAIL",
        Warn => "WARN",
        Info => "INFO",
    }
}

api_enum! {
    /// What a policy condition inspects.
    ConditionSubject, "condition subject" {
        Age => "AGE",
        Coordinates => "COORDINATES",
        Cpe => "CPE",
        License => "LICENSE",
        LicenseGroup => "LICENSE_GROUP",
        PackageUrl => "PACKAGE_URL",
        Severity => "SEVERITY",
        SwidTagId => "SWID_TAGID",
        Version => "VERSION",
        ComponentHash => "COMPONENT_HASH",
        Cwe => "CWE",
        VulnerabilityId => "VULNERABILITY_ID",
    }
}

api_enum! {
    /// How a policy condition compares its subject against its value.
    ConditionOperator, "condition operator" {
        Is => "IS",
        IsNot => "IS_NOT",
        Matches => "MATCHES",
        NoMatch => "NO_MATCH",
        NumericGreaterThan => "NUMERIC_GREATER_THAN",
        NumericLessThan => "NUMERIC_LESS_THAN",
        NumericEqual => "NUMERIC_EQUAL",
        NumericNotEqual => "NUMERIC_NOT_EQUAL",
        NumericGreaterThanOrEqual => "NUMERIC_GREATER_THAN_OR_EQUAL",
        NumericLesserThanOrEqual => "NUMERIC_LESSER_THAN_OR_EQUAL",
        ContainsAll => "CONTAINS_ALL",
        ContainsAny => "CONTAINS_ANY",
    }
}

/// A tag attached to a policy. Tags are global; identity is the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A project known to the remote system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub uuid: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A condition as supplied by the user, before it exists remotely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConditionSpec {
    pub subject: ConditionSubject,
    pub operator: ConditionOperator,
    pub value: String,
}

impl ConditionSpec {
    pub fn new(
        subject: ConditionSubject,
        operator: ConditionOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            subject,
            operator,
            value: value.into(),
        }
    }
}

impl fmt::Display for ConditionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.subject, self.operator, self.value)
    }
}

/// A condition owned by a remote policy.
///
/// Subject and operator stay in their wire spelling: the service may know
/// subjects this tool does not, and other policies on the same server must
/// still decode. Only user input is held to the closed enumerations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyCondition {
    pub uuid: Uuid,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub value: String,
}

impl PolicyCondition {
    /// A condition that does not exist remotely yet; its UUID is nil until
    /// the service assigns one.
    #[must_use]
    pub fn unsaved(spec: &ConditionSpec) -> Self {
        Self {
            uuid: Uuid::nil(),
            subject: spec.subject.as_str().to_string(),
            operator: spec.operator.as_str().to_string(),
            value: spec.value.clone(),
        }
    }
}

impl fmt::Display for PolicyCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.subject, self.operator, self.value)
    }
}

/// A policy with everything attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub uuid: Uuid,
    pub name: String,
    pub operator: PolicyOperator,
    pub violation_state: ViolationState,
    #[serde(default)]
    pub policy_conditions: Vec<PolicyCondition>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Policy {
    /// UUIDs of the projects currently associated with this policy.
    #[must_use]
    pub fn project_uuids(&self) -> Vec<Uuid> {
        self.projects.iter().map(|p| p.uuid).collect()
    }

    /// Whether operator or violation state differ from the desired values.
    #[must_use]
    pub fn needs_attribute_update(
        &self,
        operator: PolicyOperator,
        violation_state: ViolationState,
    ) -> bool {
        self.operator != operator || self.violation_state != violation_state
    }
}
