//! Backward scheduling from a finish time, sleep targets and progress.

use crate::clock;
use crate::error::AppError;
use crate::model::{SleepTimes, Task, TaskTemplate};

/// 7.5 hours in minutes.
pub const SEVEN_AND_A_HALF_HOURS: i64 = 450;
/// 8 hours in minutes.
pub const EIGHT_HOURS: i64 = 480;

/// Assigns start times so the last template ends exactly at `finish_by`.
///
/// Walks the templates from last to first, subtracting each duration from a
/// running cursor before stamping the template with the cursor value. Start
/// times that fall before midnight wrap silently; use [`starts_previous_day`]
/// to detect that case.
pub fn compute_morning_schedule(
    templates: &[TaskTemplate],
    finish_by: &str,
) -> Result<Vec<Task>, AppError> {
    let mut cursor = i64::from(clock::to_minutes(finish_by)?);
    let mut tasks = Vec::with_capacity(templates.len());

    for template in templates.iter().rev() {
        cursor -= i64::from(template.duration);
        tasks.push(template.clone().into_task(clock::to_time_string(cursor)));
    }

    tasks.reverse();
    Ok(tasks)
}

/// Whether the first task of a backward schedule lands on the previous day.
pub fn starts_previous_day(templates: &[TaskTemplate], finish_by: &str) -> Result<bool, AppError> {
    let finish = u64::from(clock::to_minutes(finish_by)?);
    let total: u64 = templates.iter().map(|template| u64::from(template.duration)).sum();
    Ok(total > finish)
}

pub fn compute_sleep_times(wake_time: &str) -> Result<SleepTimes, AppError> {
    Ok(SleepTimes {
        seven_half: clock::shift(wake_time, -SEVEN_AND_A_HALF_HOURS)?,
        eight: clock::shift(wake_time, -EIGHT_HOURS)?,
    })
}

/// Completed share of `tasks` as a rounded percentage; 0 for an empty list.
pub fn compute_progress(tasks: &[Task]) -> u8 {
    let (completed, total) = progress_counts(tasks);
    if total == 0 {
        return 0;
    }
    // round half up in integer arithmetic
    let percent = (200 * completed + total) / (2 * total);
    u8::try_from(percent).unwrap_or(100)
}

/// `(completed, total)` for a task list.
pub fn progress_counts(tasks: &[Task]) -> (usize, usize) {
    let completed = tasks.iter().filter(|task| task.completed).count();
    (completed, tasks.len())
}

/// Sum of task durations in minutes. Widened so any list of `u32` durations fits.
pub fn total_duration(tasks: &[Task]) -> u64 {
    tasks.iter().map(|task| u64::from(task.duration)).sum()
}
