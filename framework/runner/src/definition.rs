use crate::config::{Arguments, GlobalConfig, ProcessConfig, ScenarioConfig};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use time_it_core::prelude::VariableResolver;

/// Returned when neither the scenario nor the global configuration names a process to run.
#[derive(derive_more::Error, derive_more::Display, Debug)]
#[display("No process configured for scenario '{scenario}'")]
pub struct NoProcessConfigured {
    scenario: String,
}

/// A command run when a process times out.
///
/// `%pid%` is still present in the name and arguments, it can only be replaced once the process
/// has been started.
#[derive(Debug, Clone, PartialEq)]
pub struct KillCommand {
    pub process_name: String,
    pub process_arguments: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeoutSpec {
    /// Zero when the timeout is disabled
    pub max_duration: Duration,
    pub kill_command: Option<KillCommand>,
}

impl TimeoutSpec {
    pub fn is_enabled(&self) -> bool {
        !self.max_duration.is_zero()
    }
}

/// A scenario with every field merged from the global configuration and every `$(CWD)` expanded.
///
/// Built once per scenario before any run starts. Nothing is looked up again while running.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveScenario {
    pub name: String,
    pub process_name: String,
    pub process_arguments: Vec<String>,
    /// `None` to run in the current directory
    pub working_directory: Option<PathBuf>,
    /// Overrides applied on top of the host environment
    pub environment: BTreeMap<String, String>,
    pub timeout: TimeoutSpec,
    pub tags: BTreeMap<String, String>,
    pub metrics_file_path: Option<String>,
}

/// The scenario value when it is set and not empty, otherwise the global one.
fn pick<'a>(scenario: &'a Option<String>, global: &'a Option<String>) -> Option<&'a str> {
    scenario
        .as_deref()
        .filter(|value| !value.is_empty())
        .or_else(|| global.as_deref().filter(|value| !value.is_empty()))
}

fn pick_arguments<'a>(
    scenario: &'a Option<Arguments>,
    global: &'a Option<Arguments>,
) -> Option<&'a Arguments> {
    scenario
        .as_ref()
        .filter(|args| !args.is_empty())
        .or_else(|| global.as_ref().filter(|args| !args.is_empty()))
}

fn merge_maps(
    global: &BTreeMap<String, String>,
    scenario: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    global
        .iter()
        .chain(scenario.iter())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

impl EffectiveScenario {
    /// Merge a scenario with the global defaults.
    pub fn resolve(
        global: &GlobalConfig,
        scenario: &ScenarioConfig,
        resolver: &VariableResolver,
    ) -> Result<Self, NoProcessConfigured> {
        let g: &ProcessConfig = &global.process;
        let s: &ProcessConfig = &scenario.process;

        let process_name = pick(&s.process_name, &g.process_name)
            .map(|name| resolver.resolve(name))
            .ok_or_else(|| NoProcessConfigured {
                scenario: scenario.name.clone(),
            })?;

        let process_arguments = pick_arguments(&s.process_arguments, &g.process_arguments)
            .map(|args| args.to_tokens(resolver))
            .unwrap_or_default();

        let working_directory = pick(&s.working_directory, &g.working_directory)
            .map(|dir| PathBuf::from(resolver.resolve(dir)));

        let environment = merge_maps(&g.environment_variables, &s.environment_variables)
            .into_iter()
            .map(|(k, v)| {
                let v = resolver.resolve(&v);
                (k, v)
            })
            .collect();

        let max_duration = if s.timeout.max_duration > 0 {
            s.timeout.max_duration
        } else {
            g.timeout.max_duration
        };
        let kill_command = pick(&s.timeout.process_name, &g.timeout.process_name).map(|name| {
            KillCommand {
                process_name: resolver.resolve(name),
                process_arguments: pick_arguments(
                    &s.timeout.process_arguments,
                    &g.timeout.process_arguments,
                )
                .map(|args| args.to_tokens(resolver))
                .unwrap_or_default(),
            }
        });

        Ok(Self {
            name: scenario.name.clone(),
            process_name,
            process_arguments,
            working_directory,
            environment,
            timeout: TimeoutSpec {
                max_duration: Duration::from_secs(max_duration),
                kill_command,
            },
            tags: merge_maps(&g.tags, &s.tags),
            metrics_file_path: pick(&s.metrics_file_path, &g.metrics_file_path)
                .map(|path| resolver.resolve(path)),
        })
    }

    /// The directory relative metrics file paths are resolved against.
    pub fn base_directory(&self, resolver: &VariableResolver) -> PathBuf {
        self.working_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(resolver.working_dir()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn global() -> GlobalConfig {
        GlobalConfig {
            process: ProcessConfig {
                process_name: Some("$(CWD)/bin/app".to_string()),
                process_arguments: Some(Arguments::Line("--global".to_string())),
                working_directory: Some("$(CWD)".to_string()),
                environment_variables: BTreeMap::from([
                    ("MODE".to_string(), "global".to_string()),
                    ("HOME_DIR".to_string(), "$(CWD)/home".to_string()),
                ]),
                timeout: crate::config::TimeoutConfig {
                    max_duration: 10,
                    process_name: Some("kill".to_string()),
                    process_arguments: Some(Arguments::Line("-9 %pid%".to_string())),
                },
                tags: BTreeMap::from([
                    ("team".to_string(), "core".to_string()),
                    ("env".to_string(), "ci".to_string()),
                ]),
                metrics_file_path: Some("metrics.json".to_string()),
            },
            count: 3,
            ..Default::default()
        }
    }

    fn scenario(process: ProcessConfig) -> ScenarioConfig {
        ScenarioConfig {
            name: "scenario".to_string(),
            process,
        }
    }

    #[test]
    fn inherits_global_values() {
        let resolver = VariableResolver::with_working_dir("/work");
        let effective =
            EffectiveScenario::resolve(&global(), &scenario(ProcessConfig::default()), &resolver)
                .unwrap();

        assert_eq!("/work/bin/app", effective.process_name);
        assert_eq!(vec!["--global"], effective.process_arguments);
        assert_eq!(Some(PathBuf::from("/work")), effective.working_directory);
        assert_eq!("/work/home", effective.environment["HOME_DIR"]);
        assert_eq!(Duration::from_secs(10), effective.timeout.max_duration);
        assert_eq!(
            Some(KillCommand {
                process_name: "kill".to_string(),
                process_arguments: vec!["-9".to_string(), "%pid%".to_string()],
            }),
            effective.timeout.kill_command
        );
        assert_eq!(Some("metrics.json".to_string()), effective.metrics_file_path);
    }

    #[test]
    fn scenario_values_win_when_set() {
        let resolver = VariableResolver::with_working_dir("/work");
        let overrides = ProcessConfig {
            process_name: Some("other".to_string()),
            process_arguments: Some(Arguments::List(vec!["a b".to_string()])),
            working_directory: Some(String::new()),
            environment_variables: BTreeMap::from([("MODE".to_string(), "scenario".to_string())]),
            tags: BTreeMap::from([("team".to_string(), "apm".to_string())]),
            timeout: crate::config::TimeoutConfig {
                max_duration: 1,
                ..Default::default()
            },
            ..Default::default()
        };

        let effective =
            EffectiveScenario::resolve(&global(), &scenario(overrides), &resolver).unwrap();

        assert_eq!("other", effective.process_name);
        assert_eq!(vec!["a b"], effective.process_arguments);
        // An empty scenario value falls back to the global one
        assert_eq!(Some(PathBuf::from("/work")), effective.working_directory);
        assert_eq!("scenario", effective.environment["MODE"]);
        assert_eq!(2, effective.environment.len());
        assert_eq!("apm", effective.tags["team"]);
        assert_eq!("ci", effective.tags["env"]);
        assert_eq!(Duration::from_secs(1), effective.timeout.max_duration);
    }

    #[test]
    fn missing_process_is_an_error() {
        let resolver = VariableResolver::with_working_dir("/work");
        let err = EffectiveScenario::resolve(
            &GlobalConfig::default(),
            &scenario(ProcessConfig::default()),
            &resolver,
        )
        .unwrap_err();

        assert_eq!("No process configured for scenario 'scenario'", err.to_string());
    }

    #[test]
    fn timeout_disabled_by_default() {
        let resolver = VariableResolver::with_working_dir("/work");
        let effective = EffectiveScenario::resolve(
            &GlobalConfig::default(),
            &scenario(ProcessConfig {
                process_name: Some("true".to_string()),
                ..Default::default()
            }),
            &resolver,
        )
        .unwrap();

        assert!(!effective.timeout.is_enabled());
        assert_eq!(None, effective.timeout.kill_command);
        assert_eq!(PathBuf::from("/work"), effective.base_directory(&resolver));
    }
}
