use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    pub name: String,
    pub inputs: InputsConfig,
    #[serde(default)]
    pub join: JoinOptions,
    #[serde(default)]
    pub criteria: CriteriaRules,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Input file paths, resolved relative to the config file's directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputsConfig {
    pub cdk: String,
    pub d2c2: String,
    pub removed: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default)]
    pub csv: Option<String>,
    #[serde(default)]
    pub json: Option<String>,
}

// ---------------------------------------------------------------------------
// Join
// ---------------------------------------------------------------------------

/// What to do when a join key occurs more than once within one source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail the run, listing every duplicated key.
    #[default]
    Reject,
    /// Keep the first occurrence, drop (and log) the rest.
    FirstWins,
    /// Emit one joined row per combination.
    FanOut,
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reject => write!(f, "reject"),
            Self::FirstWins => write!(f, "first_wins"),
            Self::FanOut => write!(f, "fan_out"),
        }
    }
}

/// Normalization applied to VINs and stock numbers before comparing them.
/// Output always shows the original value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyTransform {
    #[default]
    None,
    Trim,
}

impl KeyTransform {
    pub fn apply(&self, raw: &str) -> String {
        match self {
            Self::None => raw.to_string(),
            Self::Trim => raw.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JoinOptions {
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
    #[serde(default)]
    pub key_transform: KeyTransform,
}

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// Values the criteria and removed-list rules compare against.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CriteriaRules {
    #[serde(default = "default_stock_types")]
    pub stock_types: Vec<String>,
    #[serde(default = "default_statuses")]
    pub statuses: Vec<String>,
    #[serde(default = "default_in_transit")]
    pub in_transit_status: String,
    #[serde(default = "default_removed_status")]
    pub removed_status: String,
}

fn default_stock_types() -> Vec<String> {
    vec!["NEW".into(), "USED".into(), "F".into()]
}

fn default_statuses() -> Vec<String> {
    vec!["S".into(), "T".into()]
}

fn default_in_transit() -> String {
    "InTransit".into()
}

fn default_removed_status() -> String {
    "G".into()
}

impl Default for CriteriaRules {
    fn default() -> Self {
        Self {
            stock_types: default_stock_types(),
            statuses: default_statuses(),
            in_transit_status: default_in_transit(),
            removed_status: default_removed_status(),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine options
// ---------------------------------------------------------------------------

/// Everything the engine needs besides the data. The default reproduces the
/// standard CDK / D2C2 rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconOptions {
    pub join: JoinOptions,
    pub rules: CriteriaRules,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        for (role, path) in [
            ("cdk", &self.inputs.cdk),
            ("d2c2", &self.inputs.d2c2),
            ("removed", &self.inputs.removed),
        ] {
            if path.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "inputs.{role} must not be empty"
                )));
            }
        }

        self.criteria.validate()
    }

    pub fn options(&self) -> ReconOptions {
        ReconOptions {
            join: self.join,
            rules: self.criteria.clone(),
        }
    }
}

impl CriteriaRules {
    pub fn validate(&self) -> Result<(), ReconError> {
        if self.stock_types.is_empty() {
            return Err(ReconError::ConfigValidation(
                "criteria.stock_types must list at least one stock type".into(),
            ));
        }
        if self.statuses.is_empty() {
            return Err(ReconError::ConfigValidation(
                "criteria.statuses must list at least one status".into(),
            ));
        }
        if self.in_transit_status.is_empty() {
            return Err(ReconError::ConfigValidation(
                "criteria.in_transit_status must not be empty".into(),
            ));
        }
        if self.removed_status.is_empty() {
            return Err(ReconError::ConfigValidation(
                "criteria.removed_status must not be empty".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
name = "May close"

[inputs]
cdk = "cdk.csv"
d2c2 = "d2c2.csv"
removed = "removed.csv"
"#;

    #[test]
    fn parse_minimal_uses_defaults() {
        let config = ReconConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.name, "May close");
        assert_eq!(config.inputs.removed, "removed.csv");
        assert_eq!(config.join.duplicates, DuplicatePolicy::Reject);
        assert_eq!(config.join.key_transform, KeyTransform::None);
        assert_eq!(config.criteria, CriteriaRules::default());
        assert!(config.output.csv.is_none());
        assert_eq!(config.options(), ReconOptions::default());
    }

    #[test]
    fn parse_full() {
        let input = format!(
            r#"{MINIMAL}
[join]
duplicates = "fan_out"
key_transform = "trim"

[criteria]
stock_types = ["NEW", "USED", "F", "DEMO"]
removed_status = "R"

[output]
csv = "out.csv"
json = "out.json"
"#
        );
        let config = ReconConfig::from_toml(&input).unwrap();
        assert_eq!(config.join.duplicates, DuplicatePolicy::FanOut);
        assert_eq!(config.join.key_transform, KeyTransform::Trim);
        assert_eq!(config.criteria.stock_types.len(), 4);
        assert_eq!(config.criteria.statuses, vec!["S", "T"]);
        assert_eq!(config.criteria.in_transit_status, "InTransit");
        assert_eq!(config.criteria.removed_status, "R");
        assert_eq!(config.output.csv.as_deref(), Some("out.csv"));
        assert_eq!(config.output.json.as_deref(), Some("out.json"));
    }

    #[test]
    fn reject_unknown_duplicate_policy() {
        let input = format!("{MINIMAL}\n[join]\nduplicates = \"last_wins\"\n");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_missing_inputs() {
        let err = ReconConfig::from_toml("name = \"x\"\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_empty_name() {
        let input = MINIMAL.replace("May close", " ");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("name must not be empty"));
    }

    #[test]
    fn reject_empty_input_path() {
        let input = MINIMAL.replace("\"d2c2.csv\"", "\"\"");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("inputs.d2c2"));
    }

    #[test]
    fn reject_empty_status_list() {
        let input = format!("{MINIMAL}\n[criteria]\nstatuses = []\n");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("criteria.statuses"));
    }

    #[test]
    fn key_transform_apply() {
        assert_eq!(KeyTransform::None.apply(" 1FA1 "), " 1FA1 ");
        assert_eq!(KeyTransform::Trim.apply(" 1FA1 "), "1FA1");
    }
}
