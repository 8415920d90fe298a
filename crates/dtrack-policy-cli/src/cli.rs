use clap::{Parser, ValueEnum};
use dtrack_policy_core::{PolicyOperator, ViolationState};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8081/";

#[derive(Parser, Debug)]
#[command(name = "dependency-track-policy-applier")]
#[command(about = "Manage OWASP Dependency-Track policies idempotently")]
#[command(long_about = "Manage OWASP Dependency-Track policies idempotently.

Reads a JSON list of policy conditions from stdin and applies only the
difference between it and the named policy:

    $ echo '[{\"subject\": \"VULNERABILITY_ID\", \"operator\": \"IS\", \"value\": \"CVE-2023-11111\"}]' \\
        | DT_API_KEY=... dependency-track-policy-applier --policy-name kev --policy-tags foo

Subjects: AGE, COORDINATES, CPE, LICENSE, LICENSE_GROUP, PACKAGE_URL, SEVERITY,
SWID_TAGID, VERSION, COMPONENT_HASH, CWE, VULNERABILITY_ID.

Operators: IS, IS_NOT, MATCHES, NO_MATCH, NUMERIC_GREATER_THAN, NUMERIC_LESS_THAN,
NUMERIC_EQUAL, NUMERIC_NOT_EQUAL, NUMERIC_GREATER_THAN_OR_EQUAL,
NUMERIC_LESSER_THAN_OR_EQUAL, CONTAINS_ALL, CONTAINS_ANY.")]
#[command(version)]
pub struct Cli {
    /// Dependency-Track base URL
    #[arg(short = 'u', long, env = "DT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Dependency-Track API key
    #[arg(short = 'k', long, env = "DT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Name of the policy to manage
    #[arg(long, env = "DT_POLICY_NAME")]
    pub policy_name: Option<String>,

    /// How conditions combine
    #[arg(long, env = "DT_POLICY_OPERATOR", value_enum, default_value_t = OperatorArg::Any)]
    pub policy_operator: OperatorArg,

    /// Violation raised when the policy matches
    #[arg(
        long,
        env = "DT_POLICY_VIOLATION_STATE",
        value_enum,
        default_value_t = ViolationStateArg::Fail
    )]
    pub policy_violation_state: ViolationStateArg,

    /// Projects to assign, as name or name:version (comma separated)
    #[arg(long, env = "DT_POLICY_PROJECTS", value_delimiter = ',')]
    pub policy_projects: Vec<String>,

    /// Tags to assign (comma separated)
    #[arg(long, env = "DT_POLICY_TAGS", value_delimiter = ',')]
    pub policy_tags: Vec<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "DT_TIMEOUT", default_value_t = 10)]
    pub timeout: u64,

    /// Print the changes without applying them
    #[arg(long, env = "DT_DRY_RUN")]
    pub dry_run: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, env = "DT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
#[value(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatorArg {
    /// A match on any condition violates the policy
    #[default]
    Any,
    /// Every condition must match
    All,
}

impl From<OperatorArg> for PolicyOperator {
    fn from(arg: OperatorArg) -> Self {
        match arg {
            OperatorArg::Any => Self::Any,
            OperatorArg::All => Self::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
#[value(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationStateArg {
    #[default]
    Fail,
    Warn,
    Info,
}

impl From<ViolationStateArg> for ViolationState {
    fn from(arg: ViolationStateArg) -> Self {
        match arg {
            ViolationStateArg::Fail => Self::Fail,
            ViolationStateArg::Warn => Self::Warn,
            ViolationStateArg::Info => Self::Info,
        }
    }
}
