use clap::{Parser, Subcommand, ValueEnum};
use routine_core::RoutineKind;

#[derive(Parser, Debug)]
#[command(author, version, about = "Morning and evening routine tracker", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show finish time, sleep times and both routines
    ///
    /// Example: routine status
    Status,
    /// List one routine's tasks
    ///
    /// Example: routine list evening
    List { routine: RoutineArg },
    /// Mark a task done, or not done again
    ///
    /// Example: routine toggle run
    /// Example: routine toggle reading --evening
    Toggle {
        id: String,
        #[arg(long)]
        evening: bool,
    },
    /// Append a task to a routine
    ///
    /// Example: routine add "Tea" --evening --time 21:45 --duration 10
    Add {
        title: String,
        #[arg(long)]
        evening: bool,
        /// Start time (HH:MM); defaults to the finish-by time
        #[arg(long)]
        time: Option<String>,
        /// Minutes
        #[arg(long, default_value_t = 0)]
        duration: u32,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        icon: Option<String>,
    },
    /// Change fields of a task
    ///
    /// Example: routine edit run --title "Long Run" --duration 90
    Edit {
        id: String,
        #[arg(long)]
        evening: bool,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        icon: Option<String>,
    },
    /// Delete a task
    ///
    /// Example: routine delete cold-shower
    Delete {
        id: String,
        #[arg(long)]
        evening: bool,
    },
    /// Put a routine's tasks in a new order; every id must be listed once
    ///
    /// Example: routine reorder --evening reading journaling hot-shower ...
    Reorder {
        #[arg(long)]
        evening: bool,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Clear completion of every task in a routine
    ///
    /// Example: routine reset morning
    Reset { routine: RoutineArg },
    /// Reschedule the morning so its last task ends at TIME
    ///
    /// Example: routine finish-by 08:30
    FinishBy { time: String },
    /// Show recommended bedtimes
    ///
    /// Example: routine sleep
    Sleep,
    /// Record today's progress in the history
    ///
    /// Example: routine save
    Save,
    /// Show saved daily snapshots
    ///
    /// Example: routine history
    History,
    /// Show routine tips
    ///
    /// Example: routine tips --evening
    Tips {
        #[arg(long)]
        evening: bool,
    },
    /// Delete the stored routine and start over from the templates
    ///
    /// Example: routine wipe
    Wipe,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoutineArg {
    Morning,
    Evening,
}

impl From<RoutineArg> for RoutineKind {
    fn from(value: RoutineArg) -> Self {
        match value {
            RoutineArg::Morning => RoutineKind::Morning,
            RoutineArg::Evening => RoutineKind::Evening,
        }
    }
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    FinishBy,
    LogFilter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let (key_raw, value_raw) = raw
        .trim()
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    if value.is_empty() {
        return Err("override value cannot be empty".to_string());
    }

    let key = canonicalize_flag_name(key_raw)
        .ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match key.as_str() {
        "finish_by" | "default_finish_by" => ConfigOverrideTarget::FinishBy,
        "log" | "log_filter" => ConfigOverrideTarget::LogFilter,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
