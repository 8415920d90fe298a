use std::time::Duration;

use dtrack_policy_core::{
    ApplyError, ConditionSpec, PolicyInput, PolicyOperator, ViolationState,
};

use crate::cli::Cli;

/// Validated settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub dry_run: bool,
    pub policy_name: String,
    pub policy_operator: PolicyOperator,
    pub policy_violation_state: ViolationState,
    pub policy_projects: Vec<String>,
    pub policy_tags: Vec<String>,
}

impl AppConfig {
    /// Checks the parsed flags before anything touches the network.
    pub fn from_cli(cli: &Cli) -> Result<Self, ApplyError> {
        let api_key = required(cli.api_key.as_deref(), "--api-key (DT_API_KEY)")?;
        let policy_name = required(cli.policy_name.as_deref(), "--policy-name (DT_POLICY_NAME)")?;
        if cli.base_url.trim().is_empty() {
            return Err(ApplyError::invalid_config("--base-url (DT_BASE_URL) is required"));
        }
        if cli.timeout == 0 {
            return Err(ApplyError::invalid_config(
                "--timeout (DT_TIMEOUT) must be at least 1 second",
            ));
        }

        Ok(Self {
            base_url: cli.base_url.trim().to_string(),
            api_key,
            timeout: Duration::from_secs(cli.timeout),
            dry_run: cli.dry_run,
            policy_name,
            policy_operator: cli.policy_operator.into(),
            policy_violation_state: cli.policy_violation_state.into(),
            policy_projects: cli.policy_projects.clone(),
            policy_tags: cli.policy_tags.clone(),
        })
    }

    pub fn into_input(self, conditions: Vec<ConditionSpec>) -> PolicyInput {
        PolicyInput {
            policy_name: self.policy_name,
            operator: self.policy_operator,
            violation_state: self.policy_violation_state,
            projects: self.policy_projects,
            tags: self.policy_tags,
            conditions,
        }
    }
}

fn required(value: Option<&str>, flag: &str) -> Result<String, ApplyError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ApplyError::invalid_config(format!("{flag} is required"))),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("applier").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_valid_config() {
        let cli = parse(&[
            "-k",
            "secret",
            "--policy-name",
            " kev ",
            "--policy-tags",
            "a,a",
            "--timeout",
            "3",
        ]);
        let config = AppConfig::from_cli(&cli).unwrap();
        assert_eq!(config.policy_name, "kev");
        assert_eq!(config.timeout, Duration::from_secs(3));

        let input = config.into_input(Vec::new());
        assert_eq!(input.tags, vec!["a", "a"]);
        assert_eq!(input.operator, PolicyOperator::Any);
    }

    #[test]
    fn test_missing_required_settings() {
        let err = AppConfig::from_cli(&parse(&["--policy-name", "kev", "-k", ""])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: --api-key (DT_API_KEY) is required"
        );

        let err = AppConfig::from_cli(&parse(&["-k", "secret"])).unwrap_err();
        assert!(err.to_string().contains("--policy-name"));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let cli = parse(&["-k", "secret", "--policy-name", "kev", "--timeout", "0"]);
        assert!(matches!(
            AppConfig::from_cli(&cli),
            Err(ApplyError::InvalidConfig { .. })
        ));
    }
}
