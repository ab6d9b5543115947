use crate::clock;
use crate::error::AppError;
use crate::model::{Task, TaskTemplate};
use crate::templates::{DEFAULT_FINISH_BY, RoutineTemplates};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "ROUTINE_CONFIG_PATH";
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Finish time used when no routine has been stored yet.
    #[serde(default)]
    pub default_finish_by: Option<String>,
    #[serde(default)]
    pub morning_templates: Option<Vec<TaskTemplate>>,
    #[serde(default)]
    pub evening_tasks: Option<Vec<Task>>,
    /// `tracing` filter directive, e.g. `debug` or `routine_core=debug`.
    #[serde(default)]
    pub log_filter: Option<String>,
}

impl Config {
    pub fn finish_by(&self) -> &str {
        self.default_finish_by.as_deref().unwrap_or(DEFAULT_FINISH_BY)
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    pub fn templates(&self) -> RoutineTemplates {
        let defaults = RoutineTemplates::default();
        RoutineTemplates {
            morning: self.morning_templates.clone().unwrap_or(defaults.morning),
            evening: self.evening_tasks.clone().unwrap_or(defaults.evening),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub default_finish_by: Option<String>,
    pub log_filter: Option<String>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("routine")
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("routine")
            .join(CONFIG_FILE_NAME))
    }
}

/// Never fails: a missing file yields defaults, a broken one yields defaults
/// plus the error for the caller to report.
pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    validate_config(&config)
        .map_err(|err| AppError::invalid_data(format!("{}: {}", path.display(), err.message())))?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), AppError> {
    if let Some(finish_by) = config.default_finish_by.as_deref() {
        clock::to_minutes(finish_by)?;
    }
    for task in config.evening_tasks.iter().flatten() {
        clock::to_minutes(&task.time)?;
    }
    Ok(())
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Result<Config, AppError> {
    let mut merged = base.clone();
    if let Some(finish_by) = overrides.default_finish_by.as_ref() {
        clock::to_minutes(finish_by)?;
        merged.default_finish_by = Some(finish_by.clone());
    }
    if let Some(filter) = overrides.log_filter.as_ref() {
        merged.log_filter = Some(filter.clone());
    }
    Ok(merged)
}
