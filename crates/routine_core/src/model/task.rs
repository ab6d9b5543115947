use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    /// Start time as `HH:MM`. Derived for morning tasks, fixed for evening ones.
    pub time: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Minutes.
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub completed: bool,
}

/// Schedulable shape of a task: everything except its start time and
/// completion flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub icon: String,
}

impl TaskTemplate {
    pub fn new(id: &str, title: &str, description: &str, duration: u32, icon: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            duration,
            icon: icon.to_string(),
        }
    }

    pub fn into_task(self, time: String) -> Task {
        Task {
            id: self.id,
            time,
            title: self.title,
            description: self.description,
            duration: self.duration,
            icon: self.icon,
            completed: false,
        }
    }
}

/// Partial update merged into an existing task. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub time: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<u32>,
    pub icon: Option<String>,
    pub completed: Option<bool>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(time) = &self.time {
            task.time = time.clone();
        }
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(duration) = self.duration {
            task.duration = duration;
        }
        if let Some(icon) = &self.icon {
            task.icon = icon.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineKind {
    Morning,
    Evening,
}

impl RoutineKind {
    pub fn from_evening_flag(is_evening: bool) -> Self {
        if is_evening {
            Self::Evening
        } else {
            Self::Morning
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Evening => "evening",
        }
    }
}

impl fmt::Display for RoutineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::{RoutineKind, Task, TaskTemplate, TaskUpdate};

    fn sample_task() -> Task {
        Task {
            id: "run".to_string(),
            time: "07:00".to_string(),
            title: "Training Run".to_string(),
            description: "1h daily".to_string(),
            duration: 60,
            icon: "🏃".to_string(),
            completed: true,
        }
    }

    #[test]
    fn update_merges_only_given_fields() {
        let mut task = sample_task();
        let update = TaskUpdate {
            title: Some("Long Run".to_string()),
            duration: Some(90),
            ..TaskUpdate::default()
        };

        update.apply(&mut task);

        assert_eq!(task.title, "Long Run");
        assert_eq!(task.duration, 90);
        assert_eq!(task.time, "07:00");
        assert_eq!(task.description, "1h daily");
        assert!(task.completed);
    }

    #[test]
    fn template_becomes_incomplete_task_at_given_time() {
        let template = TaskTemplate::new("run", "Training Run", "1h daily", 60, "🏃");
        let task = template.into_task("06:00".to_string());

        assert_eq!(task.id, "run");
        assert_eq!(task.time, "06:00");
        assert_eq!(task.duration, 60);
        assert!(!task.completed);
    }

    #[test]
    fn task_deserializes_without_optional_fields() {
        let task: Task =
            serde_json::from_str(r#"{"id":"reading","time":"21:20","title":"Reading"}"#).unwrap();

        assert_eq!(task.duration, 0);
        assert!(task.description.is_empty());
        assert!(!task.completed);
    }

    #[test]
    fn kind_maps_evening_flag() {
        assert_eq!(RoutineKind::from_evening_flag(true), RoutineKind::Evening);
        assert_eq!(RoutineKind::from_evening_flag(false), RoutineKind::Morning);
        assert_eq!(RoutineKind::Evening.to_string(), "evening");
    }
}
