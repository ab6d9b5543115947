//! Built-in routine content: morning templates, evening tasks and tips.

use crate::model::{RoutineKind, Task, TaskTemplate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FINISH_BY: &str = "09:00";

/// Template data the store is seeded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineTemplates {
    /// Scheduled backward from the finish time, in this order.
    pub morning: Vec<TaskTemplate>,
    /// Fixed-time tasks, used as given.
    pub evening: Vec<Task>,
}

impl Default for RoutineTemplates {
    fn default() -> Self {
        Self {
            morning: morning_templates(),
            evening: evening_tasks(),
        }
    }
}

pub fn morning_templates() -> Vec<TaskTemplate> {
    vec![
        TaskTemplate::new(
            "wake-up",
            "Wake up & Prep",
            "Get dressed, hydrate, light warm-up",
            15,
            "💤",
        ),
        TaskTemplate::new("run", "Training Run", "1h daily", 60, "🏃"),
        TaskTemplate::new("cold-shower", "Cold shower", "Cold shower for recovery", 10, "🚿"),
        TaskTemplate::new(
            "stretching",
            "Stretching & rehab exercises",
            "Shoulder, back and legs stretches",
            15,
            "🤸",
        ),
        TaskTemplate::new("meditation", "Meditation", "Mindfulness before work", 10, "🧘"),
        TaskTemplate::new(
            "breakfast",
            "Breakfast & Buffer",
            "Prepare & eat breakfast, final prep for morning work meeting",
            30,
            "🍳",
        ),
    ]
}

pub fn evening_tasks() -> Vec<Task> {
    [
        ("screens-off", "20:30", "Screens Off", "Turn off all screens, start wind-down", 0, "📵"),
        (
            "evening-stretching",
            "20:30",
            "Evening Stretching",
            "Gentle stretches to release tension",
            15,
            "🤸‍♀️",
        ),
        ("hot-shower", "20:45", "Hot Shower", "Warm shower to relax muscles", 15, "🛁"),
        (
            "evening-meditation",
            "21:00",
            "Evening Meditation",
            "Calm the mind before sleep",
            10,
            "🧘‍♀️",
        ),
        ("journaling", "21:10", "Journaling", "Reflect on the day, gratitude", 10, "📝"),
        ("reading", "21:20", "Reading in Bed", "Read until naturally sleepy", 40, "📚"),
    ]
    .into_iter()
    .map(|(id, time, title, description, duration, icon)| {
        TaskTemplate::new(id, title, description, duration, icon).into_task(time.to_string())
    })
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipCategory {
    Morning,
    Evening,
    Both,
}

impl TipCategory {
    pub fn applies_to(self, kind: RoutineKind) -> bool {
        matches!(
            (self, kind),
            (Self::Both, _)
                | (Self::Morning, RoutineKind::Morning)
                | (Self::Evening, RoutineKind::Evening)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutineTip {
    pub id: &'static str,
    pub icon: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub category: TipCategory,
}

const TIPS: &[RoutineTip] = &[
    RoutineTip {
        id: "running",
        icon: "🏃‍♂️",
        title: "Running",
        description: "Stay hydrated, listen to your body, vary routes for motivation",
        category: TipCategory::Morning,
    },
    RoutineTip {
        id: "cold-shower",
        icon: "🚿",
        title: "Cold Shower",
        description: "Reduces inflammation, boosts energy, start with 30 seconds",
        category: TipCategory::Morning,
    },
    RoutineTip {
        id: "stretching",
        icon: "🤸",
        title: "Stretching",
        description: "Cross-body arm stretches, doorway chest stretches, hold 20-30s",
        category: TipCategory::Morning,
    },
    RoutineTip {
        id: "meditation",
        icon: "🧘",
        title: "Meditation",
        description: "Morning: energizing breath work • Evening: body scan or loving-kindness",
        category: TipCategory::Both,
    },
    RoutineTip {
        id: "reading",
        icon: "📚",
        title: "Reading",
        description: "Choose calming genres, use dim warm light, stop when drowsy",
        category: TipCategory::Evening,
    },
    RoutineTip {
        id: "sleep",
        icon: "💤",
        title: "Sleep",
        description: "Cool room (65-68°F), consistent times, no caffeine 6+ hours before bed",
        category: TipCategory::Both,
    },
];

pub fn all_tips() -> &'static [RoutineTip] {
    TIPS
}

pub fn tips_for(kind: RoutineKind) -> Vec<&'static RoutineTip> {
    TIPS.iter()
        .filter(|tip| tip.category.applies_to(kind))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{RoutineTemplates, all_tips, evening_tasks, morning_templates, tips_for};
    use crate::clock;
    use crate::model::RoutineKind;
    use std::collections::HashSet;

    #[test]
    fn morning_templates_total_140_minutes() {
        let total: u32 = morning_templates().iter().map(|t| t.duration).sum();
        assert_eq!(total, 140);
    }

    #[test]
    fn builtin_ids_are_unique_per_list() {
        let templates = RoutineTemplates::default();
        let morning: HashSet<_> = templates.morning.iter().map(|t| t.id.as_str()).collect();
        let evening: HashSet<_> = templates.evening.iter().map(|t| t.id.as_str()).collect();

        assert_eq!(morning.len(), templates.morning.len());
        assert_eq!(evening.len(), templates.evening.len());
    }

    #[test]
    fn evening_tasks_have_valid_times_and_start_incomplete() {
        for task in evening_tasks() {
            clock::to_minutes(&task.time).unwrap();
            assert!(!task.completed);
        }
    }

    #[test]
    fn tips_filter_by_kind_and_include_shared() {
        let morning: Vec<_> = tips_for(RoutineKind::Morning).iter().map(|t| t.id).collect();
        let evening: Vec<_> = tips_for(RoutineKind::Evening).iter().map(|t| t.id).collect();

        assert_eq!(morning, ["running", "cold-shower", "stretching", "meditation", "sleep"]);
        assert_eq!(evening, ["meditation", "reading", "sleep"]);
        assert_eq!(all_tips().len(), 6);
    }
}
