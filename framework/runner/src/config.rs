use crate::types::TimeItResult;
use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use time_it_core::prelude::VariableResolver;
use time_it_instruments::OutlierPolicy;
use time_it_summary_model::ConfigSource;

/// Command line arguments for a process.
///
/// Either a single string, which is split on spaces, or a list of tokens that are passed as they
/// are. Use the list form for arguments that contain spaces.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Arguments {
    Line(String),
    List(Vec<String>),
}

impl Arguments {
    pub fn is_empty(&self) -> bool {
        match self {
            Arguments::Line(line) => line.trim().is_empty(),
            Arguments::List(list) => list.is_empty(),
        }
    }

    /// Resolve variables and split into the tokens passed to the process.
    ///
    /// Quoting is not supported in the string form, empty tokens from repeated spaces are dropped.
    pub fn to_tokens(&self, resolver: &VariableResolver) -> Vec<String> {
        match self {
            Arguments::Line(line) => resolver
                .resolve(line)
                .split(' ')
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect(),
            Arguments::List(list) => list.iter().map(|token| resolver.resolve(token)).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeoutConfig {
    /// Maximum duration of a single run in seconds, `0` disables the timeout
    pub max_duration: u64,
    /// Command to run when the timeout fires, before the process is killed.
    ///
    /// `%pid%` in the command or its arguments is replaced with the PID of the timed out process.
    pub process_name: Option<String>,
    pub process_arguments: Option<Arguments>,
}

/// The fields that can be set globally and overridden per scenario.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessConfig {
    pub process_name: Option<String>,
    pub process_arguments: Option<Arguments>,
    pub working_directory: Option<String>,
    pub environment_variables: BTreeMap<String, String>,
    pub timeout: TimeoutConfig,
    pub tags: BTreeMap<String, String>,
    /// Path or glob pattern of the JSON metrics file(s) written by the process.
    ///
    /// Relative paths are resolved against the working directory.
    pub metrics_file_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScenarioConfig {
    pub name: String,
    #[serde(flatten)]
    pub process: ProcessConfig,
}

/// The benchmark configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalConfig {
    #[serde(flatten)]
    pub process: ProcessConfig,
    /// Runs per scenario that are executed first and discarded
    pub warm_up_count: usize,
    /// Measured runs per scenario
    pub count: usize,
    #[serde(alias = "enableDatadog")]
    pub enable_telemetry: bool,
    /// Emit one child span per run as well as the span for each scenario
    pub telemetry_run_spans: bool,
    pub json_exporter_file_path: Option<String>,
    pub outliers: OutlierPolicy,
    pub scenarios: Vec<ScenarioConfig>,
    /// Where this configuration was loaded from, set by [load_config].
    #[serde(skip)]
    pub source: ConfigSource,
}

impl GlobalConfig {
    /// Parse a configuration from TOML when `path` has a `.toml` extension and from JSON otherwise.
    pub fn parse(path: &Path, content: &str) -> TimeItResult<Self> {
        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let mut config: GlobalConfig = if is_toml {
            toml::from_str(content).context("Invalid TOML configuration")?
        } else {
            serde_json::from_str(content).context("Invalid JSON configuration")?
        };
        config.source = ConfigSource::from_path(path);

        Ok(config)
    }

    /// The JSON export path, relative paths are resolved against the configuration directory.
    ///
    /// `override_path` takes precedence over the configured path.
    pub fn json_output_path(&self, override_path: Option<&Path>) -> Option<PathBuf> {
        let path = override_path.map(Path::to_path_buf).or_else(|| {
            self.json_exporter_file_path
                .as_deref()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
        })?;

        if path.is_absolute() {
            Some(path)
        } else {
            Some(self.source.directory.join(path))
        }
    }
}

/// Load the benchmark configuration from a file.
pub fn load_config(path: impl AsRef<Path>) -> TimeItResult<GlobalConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file '{}'", path.display()))?;

    GlobalConfig::parse(path, &content)
        .with_context(|| format!("Failed to load configuration file '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const JSON: &str = r#"{
        "processName": "dotnet",
        "processArguments": "--version",
        "workingDirectory": "$(CWD)/app",
        "environmentVariables": { "MODE": "global", "LEVEL": "1" },
        "timeout": { "maxDuration": 5, "processName": "kill", "processArguments": "-9 %pid%" },
        "metricsFilePath": "metrics*.json",
        "warmUpCount": 2,
        "count": 10,
        "enableDatadog": true,
        "scenarios": [
            { "name": "baseline" },
            { "name": "list-args", "processArguments": ["run", "my app"], "tags": { "team": "apm" } }
        ]
    }"#;

    #[test]
    fn parses_json_configuration() {
        let config = GlobalConfig::parse(Path::new("bench/config.json"), JSON).unwrap();

        assert_eq!(Some("dotnet".to_string()), config.process.process_name);
        assert_eq!(2, config.warm_up_count);
        assert_eq!(10, config.count);
        assert!(config.enable_telemetry);
        assert!(!config.telemetry_run_spans);
        assert_eq!(OutlierPolicy::Extreme, config.outliers);
        assert_eq!(5, config.process.timeout.max_duration);
        assert_eq!(2, config.scenarios.len());
        assert_eq!(
            Some(Arguments::List(vec!["run".to_string(), "my app".to_string()])),
            config.scenarios[1].process.process_arguments
        );
        assert_eq!("apm", config.scenarios[1].process.tags["team"]);
        assert_eq!("config.json", config.source.file_name);
        assert_eq!(PathBuf::from("bench"), config.source.directory);
    }

    #[test]
    fn parses_toml_configuration() {
        let content = r#"
            processName = "sleep"
            processArguments = "0"
            count = 3
            enableTelemetry = true
            outliers = "mild"

            [[scenarios]]
            name = "short"

            [scenarios.timeout]
            maxDuration = 1
        "#;

        let config = GlobalConfig::parse(Path::new("config.toml"), content).unwrap();

        assert_eq!(3, config.count);
        assert!(config.enable_telemetry);
        assert_eq!(OutlierPolicy::Mild, config.outliers);
        assert_eq!("short", config.scenarios[0].name);
        assert_eq!(1, config.scenarios[0].process.timeout.max_duration);
    }

    #[test]
    fn invalid_configuration_is_an_error() {
        assert!(GlobalConfig::parse(Path::new("config.json"), "{ not json").is_err());
        assert!(load_config("/definitely/not/here.json").is_err());
    }

    #[test]
    fn string_arguments_split_on_spaces() {
        let resolver = VariableResolver::with_working_dir("/work");
        let args = Arguments::Line("run  $(CWD)/app.dll --fast".to_string());

        assert_eq!(
            vec!["run", "/work/app.dll", "--fast"],
            args.to_tokens(&resolver)
        );
        assert!(Arguments::Line("  ".to_string()).is_empty());
    }

    #[test]
    fn json_output_path_is_relative_to_config_directory() {
        let mut config = GlobalConfig::parse(Path::new("bench/config.json"), "{}").unwrap();
        assert_eq!(None, config.json_output_path(None));

        config.json_exporter_file_path = Some("out/results.json".to_string());
        assert_eq!(
            Some(PathBuf::from("bench/out/results.json")),
            config.json_output_path(None)
        );
        assert_eq!(
            Some(PathBuf::from("/tmp/override.json")),
            config.json_output_path(Some(Path::new("/tmp/override.json")))
        );
    }
}
