use crate::config::schema::{self, DashboardConfig, OutputConfig};
use crate::error::{Error, Result};
use crate::output::{console::ConsoleOutput, csv::CsvOutput, json::JsonOutput, OutputHandler};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use validator::Validate;

/// Environment variables named `DASHBOARD_<FIELD>` override file values.
pub const ENV_PREFIX: &str = "DASHBOARD";

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DashboardConfig> {
        let mut visited = HashSet::new();
        let config = Self::load_with_inheritance(path.as_ref(), &mut visited)?;
        Self::finish(config)
    }

    /// Like [`ConfigLoader::load`], falling back to built-in defaults when no
    /// file is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<DashboardConfig> {
        match path {
            Some(path) => Self::load(path),
            None => Self::finish(DashboardConfig::default()),
        }
    }

    pub fn validate(config: &DashboardConfig) -> Result<()> {
        config.validate()?;
        Ok(())
    }

    fn finish(mut config: DashboardConfig) -> Result<DashboardConfig> {
        Self::apply_env(&mut config, ::config::Environment::with_prefix(ENV_PREFIX))?;
        Self::validate(&config)?;
        Ok(config)
    }

    fn load_with_inheritance(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<DashboardConfig> {
        let path = fs::canonicalize(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        if !visited.insert(path.clone()) {
            return Err(Error::Config(format!(
                "Circular inheritance detected involving {}",
                path.display()
            )));
        }

        let config = Self::load_file(&path)?;

        match &config.extends {
            Some(parent) => {
                let parent_path = path
                    .parent()
                    .ok_or_else(|| {
                        Error::Config(format!("Cannot determine parent directory for {}", path.display()))
                    })?
                    .join(parent);
                let parent_config = Self::load_with_inheritance(&parent_path, visited)?;
                Ok(Self::merge_configs(parent_config, config))
            }
            None => Ok(config),
        }
    }

    fn load_file(path: &Path) -> Result<DashboardConfig> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            Some("toml") => Ok(toml::from_str(&content)?),
            _ => Err(Error::Config(format!(
                "Unsupported file extension: {}",
                path.display()
            ))),
        }
    }

    /// Child values win whenever they differ from the defaults.
    fn merge_configs(mut parent: DashboardConfig, child: DashboardConfig) -> DashboardConfig {
        if child.base_url != schema::default_base_url() {
            parent.base_url = child.base_url;
        }
        if child.refresh_path != schema::default_refresh_path() {
            parent.refresh_path = child.refresh_path;
        }
        if child.data_path != schema::default_data_path() {
            parent.data_path = child.data_path;
        }
        if child.health_path != schema::default_health_path() {
            parent.health_path = child.health_path;
        }
        if child.refresh_interval_secs != schema::default_refresh_interval() {
            parent.refresh_interval_secs = child.refresh_interval_secs;
        }
        if child.request_timeout_secs != schema::default_request_timeout() {
            parent.request_timeout_secs = child.request_timeout_secs;
        }
        if child.time_format != schema::default_time_format() {
            parent.time_format = child.time_format;
        }
        if child.output.is_some() {
            parent.output = child.output;
        }

        parent.extends = None;
        parent
    }

    pub fn apply_env(config: &mut DashboardConfig, env: ::config::Environment) -> Result<()> {
        let env = ::config::Config::builder().add_source(env).build()?;

        if let Some(v) = lookup(&env, "base_url")? {
            config.base_url = v;
        }
        if let Some(v) = lookup(&env, "refresh_path")? {
            config.refresh_path = v;
        }
        if let Some(v) = lookup(&env, "data_path")? {
            config.data_path = v;
        }
        if let Some(v) = lookup(&env, "health_path")? {
            config.health_path = v;
        }
        if let Some(v) = lookup(&env, "refresh_interval_secs")? {
            config.refresh_interval_secs = v;
        }
        if let Some(v) = lookup(&env, "request_timeout_secs")? {
            config.request_timeout_secs = v;
        }
        if let Some(v) = lookup(&env, "time_format")? {
            config.time_format = v;
        }
        Ok(())
    }

    pub fn create_output(
        config: &DashboardConfig,
        multi: Option<Arc<indicatif::MultiProgress>>,
    ) -> Box<dyn OutputHandler> {
        match &config.output {
            Some(OutputConfig::Json { path }) => Box::new(JsonOutput::new(PathBuf::from(path))),
            Some(OutputConfig::Csv { path }) => Box::new(CsvOutput::new(PathBuf::from(path))),
            Some(OutputConfig::Console) | None => Box::new(ConsoleOutput::new(multi)),
        }
    }
}

fn lookup<T: DeserializeOwned>(env: &::config::Config, key: &str) -> Result<Option<T>> {
    match env.get::<T>(key) {
        Ok(v) => Ok(Some(v)),
        Err(::config::ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
