use super::task::{RoutineKind, Task};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepTimes {
    /// Bedtime for 7.5 hours of sleep.
    pub seven_half: String,
    /// Bedtime for 8 hours of sleep.
    pub eight: String,
}

/// One day's record, keyed by local `YYYY-MM-DD` in the completion history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSnapshot {
    pub morning_progress: u8,
    pub evening_progress: u8,
    pub morning_tasks: Vec<Task>,
    pub evening_tasks: Vec<Task>,
    pub completed_at: String,
}

/// Everything the routine store owns. This is also the exact projection
/// written to durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineState {
    pub finish_by: String,
    pub morning_tasks: Vec<Task>,
    pub evening_tasks: Vec<Task>,
    #[serde(default)]
    pub morning_progress: u8,
    #[serde(default)]
    pub evening_progress: u8,
    pub sleep_times: SleepTimes,
    #[serde(default)]
    pub completion_history: BTreeMap<String, CompletionSnapshot>,
}

impl RoutineState {
    pub fn tasks(&self, kind: RoutineKind) -> &[Task] {
        match kind {
            RoutineKind::Morning => &self.morning_tasks,
            RoutineKind::Evening => &self.evening_tasks,
        }
    }

    pub(crate) fn tasks_mut(&mut self, kind: RoutineKind) -> &mut Vec<Task> {
        match kind {
            RoutineKind::Morning => &mut self.morning_tasks,
            RoutineKind::Evening => &mut self.evening_tasks,
        }
    }

    pub fn progress(&self, kind: RoutineKind) -> u8 {
        match kind {
            RoutineKind::Morning => self.morning_progress,
            RoutineKind::Evening => self.evening_progress,
        }
    }

    pub(crate) fn set_progress(&mut self, kind: RoutineKind, value: u8) {
        match kind {
            RoutineKind::Morning => self.morning_progress = value,
            RoutineKind::Evening => self.evening_progress = value,
        }
    }
}
