use crate::clock;
use crate::error::AppError;
use crate::model::{
    CompletionSnapshot, RoutineKind, RoutineState, SleepTimes, Task, TaskTemplate, TaskUpdate,
};
use crate::schedule::{
    compute_morning_schedule, compute_progress, compute_sleep_times, starts_previous_day,
};
use crate::storage::persist::{self, NoopObserver, StateObserver};
use crate::storage::{AsyncKeyValueBackend, KeyValueBackend};
use crate::templates::{RoutineTemplates, morning_templates};
use std::collections::BTreeMap;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

/// Fresh state: morning tasks scheduled back from `finish_by`, evening tasks
/// as given, nothing completed and no history.
pub fn initial_state(
    templates: &RoutineTemplates,
    finish_by: &str,
) -> Result<RoutineState, AppError> {
    let morning_tasks = compute_morning_schedule(&templates.morning, finish_by)?;
    let evening_tasks = templates
        .evening
        .iter()
        .map(|task| Task {
            completed: false,
            ..task.clone()
        })
        .collect();
    let wake_time = morning_tasks
        .first()
        .map(|task| task.time.as_str())
        .unwrap_or(finish_by);
    let sleep_times = compute_sleep_times(wake_time)?;

    Ok(RoutineState {
        finish_by: finish_by.to_string(),
        morning_tasks,
        evening_tasks,
        morning_progress: 0,
        evening_progress: 0,
        sleep_times,
        completion_history: BTreeMap::new(),
    })
}

/// Owner of all routine state.
///
/// Every mutator finishes by re-deriving progress (and, for the morning list,
/// sleep times) and then hands the new state to the registered
/// [`StateObserver`] exactly once. Readers never see a half-applied change.
///
/// The store also keeps the morning template set: a finish-time change
/// rebuilds the morning list from it.
pub struct RoutineStore {
    state: RoutineState,
    morning_templates: Vec<TaskTemplate>,
    observer: Box<dyn StateObserver>,
}

impl RoutineStore {
    pub fn initial(templates: &RoutineTemplates, finish_by: &str) -> Result<Self, AppError> {
        let store = Self::from_state(initial_state(templates, finish_by)?);
        Ok(store.with_templates(templates.morning.clone()))
    }

    /// Adopts `state`, recomputing both progress values from its task lists.
    /// Morning rescheduling uses the built-in templates until
    /// [`with_templates`](Self::with_templates) replaces them.
    pub fn from_state(state: RoutineState) -> Self {
        let mut store = Self {
            state,
            morning_templates: morning_templates(),
            observer: Box::new(NoopObserver),
        };
        store.refresh_progress(RoutineKind::Morning);
        store.refresh_progress(RoutineKind::Evening);
        store
    }

    /// Loads the persisted snapshot, or adopts `fallback` when there is none
    /// or it cannot be read.
    pub fn hydrate(backend: &dyn KeyValueBackend, fallback: RoutineState) -> Self {
        Self::from_state(pick_hydrated(persist::load_state(backend), fallback))
    }

    pub async fn hydrate_async(backend: &dyn AsyncKeyValueBackend, fallback: RoutineState) -> Self {
        Self::from_state(pick_hydrated(
            persist::load_state_async(backend).await,
            fallback,
        ))
    }

    pub fn with_templates(mut self, templates: Vec<TaskTemplate>) -> Self {
        self.morning_templates = templates;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn StateObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> &RoutineState {
        &self.state
    }

    pub fn into_state(self) -> RoutineState {
        self.state
    }

    pub fn finish_by(&self) -> &str {
        &self.state.finish_by
    }

    pub fn tasks(&self, kind: RoutineKind) -> &[Task] {
        self.state.tasks(kind)
    }

    pub fn progress(&self, kind: RoutineKind) -> u8 {
        self.state.progress(kind)
    }

    pub fn sleep_times(&self) -> &SleepTimes {
        &self.state.sleep_times
    }

    pub fn completion_history(&self) -> &BTreeMap<String, CompletionSnapshot> {
        &self.state.completion_history
    }

    /// Whether the template schedule for the stored finish time begins before
    /// midnight. Fails when the stored finish time does not parse.
    pub fn starts_previous_day(&self) -> Result<bool, AppError> {
        starts_previous_day(&self.morning_templates, &self.state.finish_by)
    }

    /// Flips completion of task `id`. Returns `false` when no such task exists.
    pub fn toggle_task(&mut self, id: &str, kind: RoutineKind) -> bool {
        let Some(task) = self.find_mut(id, kind) else {
            tracing::debug!(id, %kind, "toggle ignored: unknown task id");
            return false;
        };
        task.completed = !task.completed;
        let completed = task.completed;
        tracing::debug!(id, %kind, completed, "toggled task");
        self.commit(kind);
        true
    }

    /// Appends `task`. Ids are not deduplicated; the caller supplies a fresh one.
    pub fn add_task(&mut self, task: Task, kind: RoutineKind) -> Result<(), AppError> {
        if task.id.trim().is_empty() {
            return Err(AppError::invalid_input("id is required"));
        }
        if task.title.trim().is_empty() {
            return Err(AppError::invalid_input("title is required"));
        }
        clock::to_minutes(&task.time)?;

        tracing::debug!(id = %task.id, %kind, "added task");
        self.state.tasks_mut(kind).push(task);
        self.commit(kind);
        Ok(())
    }

    /// Merges `updates` into task `id`. `Ok(false)` when no such task exists.
    pub fn edit_task(
        &mut self,
        id: &str,
        updates: &TaskUpdate,
        kind: RoutineKind,
    ) -> Result<bool, AppError> {
        if let Some(time) = updates.time.as_deref() {
            clock::to_minutes(time)?;
        }
        if updates
            .title
            .as_deref()
            .is_some_and(|title| title.trim().is_empty())
        {
            return Err(AppError::invalid_input("title is required"));
        }

        let Some(task) = self.find_mut(id, kind) else {
            tracing::debug!(id, %kind, "edit ignored: unknown task id");
            return Ok(false);
        };
        updates.apply(task);
        tracing::debug!(id, %kind, "edited task");
        self.commit(kind);
        Ok(true)
    }

    /// Removes task `id`. Returns `false` when no such task exists.
    pub fn delete_task(&mut self, id: &str, kind: RoutineKind) -> bool {
        let tasks = self.state.tasks_mut(kind);
        let Some(index) = tasks.iter().position(|task| task.id == id) else {
            tracing::debug!(id, %kind, "delete ignored: unknown task id");
            return false;
        };
        tasks.remove(index);
        tracing::debug!(id, %kind, "deleted task");
        self.commit(kind);
        true
    }

    /// Puts the list in the order given by `ids`, which must name every
    /// current task exactly once. The list is untouched on rejection.
    pub fn reorder_tasks<S: AsRef<str>>(
        &mut self,
        ids: &[S],
        kind: RoutineKind,
    ) -> Result<(), AppError> {
        let current = self.state.tasks(kind);
        let not_permutation =
            || AppError::invalid_input("ids must list every task in the routine exactly once");

        if ids.len() != current.len() {
            return Err(not_permutation());
        }

        let mut used = vec![false; current.len()];
        let mut reordered = Vec::with_capacity(current.len());
        for id in ids {
            let id = id.as_ref();
            let index = current
                .iter()
                .enumerate()
                .position(|(index, task)| !used[index] && task.id == id)
                .ok_or_else(not_permutation)?;
            used[index] = true;
            reordered.push(current[index].clone());
        }

        *self.state.tasks_mut(kind) = reordered;
        tracing::debug!(%kind, "reordered tasks");
        self.commit(kind);
        Ok(())
    }

    pub fn reset(&mut self, kind: RoutineKind) {
        for task in self.state.tasks_mut(kind) {
            task.completed = false;
        }
        tracing::debug!(%kind, "reset routine");
        self.commit(kind);
    }

    pub fn reset_morning(&mut self) {
        self.reset(RoutineKind::Morning);
    }

    pub fn reset_evening(&mut self) {
        self.reset(RoutineKind::Evening);
    }

    /// Rebuilds the morning list from the templates so it ends at `time`.
    /// Added, deleted or reordered morning tasks are replaced and completion is
    /// cleared. An invalid time leaves the state untouched.
    pub fn update_finish_by(&mut self, time: &str) -> Result<(), AppError> {
        let morning_tasks = compute_morning_schedule(&self.morning_templates, time)?;

        self.state.finish_by = time.to_string();
        self.state.morning_tasks = morning_tasks;
        tracing::debug!(finish_by = time, "rescheduled morning routine");
        self.commit(RoutineKind::Morning);
        Ok(())
    }

    /// Records today's snapshot under the local calendar date, replacing any
    /// earlier one from the same day. Returns the date key.
    pub fn save_completion(&mut self) -> Result<String, AppError> {
        let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
        let now = OffsetDateTime::now_utc().to_offset(offset);
        let date = now
            .date()
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(|err| AppError::invalid_data(err.to_string()))?;
        let completed_at = now
            .format(&Rfc3339)
            .map_err(|err| AppError::invalid_data(err.to_string()))?;

        self.save_completion_on(&date, &completed_at)?;
        Ok(date)
    }

    /// [`save_completion`](Self::save_completion) with an explicit date key
    /// (`YYYY-MM-DD`) and RFC 3339 timestamp.
    pub fn save_completion_on(&mut self, date: &str, completed_at: &str) -> Result<(), AppError> {
        Date::parse(date, format_description!("[year]-[month]-[day]"))
            .map_err(|_| AppError::invalid_input("date must be YYYY-MM-DD"))?;
        OffsetDateTime::parse(completed_at, &Rfc3339)
            .map_err(|_| AppError::invalid_input("completed_at must be RFC3339"))?;

        let snapshot = CompletionSnapshot {
            morning_progress: self.state.morning_progress,
            evening_progress: self.state.evening_progress,
            morning_tasks: self.state.morning_tasks.clone(),
            evening_tasks: self.state.evening_tasks.clone(),
            completed_at: completed_at.to_string(),
        };
        self.state
            .completion_history
            .insert(date.to_string(), snapshot);
        tracing::debug!(date, "saved completion snapshot");
        self.observer.state_changed(&self.state);
        Ok(())
    }

    fn find_mut(&mut self, id: &str, kind: RoutineKind) -> Option<&mut Task> {
        self.state
            .tasks_mut(kind)
            .iter_mut()
            .find(|task| task.id == id)
    }

    fn commit(&mut self, kind: RoutineKind) {
        self.refresh_progress(kind);
        if kind == RoutineKind::Morning {
            self.refresh_sleep_times();
        }
        self.observer.state_changed(&self.state);
    }

    fn refresh_progress(&mut self, kind: RoutineKind) {
        let progress = compute_progress(self.state.tasks(kind));
        self.state.set_progress(kind, progress);
    }

    fn refresh_sleep_times(&mut self) {
        let wake_time = self
            .state
            .morning_tasks
            .first()
            .map(|task| task.time.as_str())
            .unwrap_or(self.state.finish_by.as_str());
        match compute_sleep_times(wake_time) {
            Ok(sleep_times) => self.state.sleep_times = sleep_times,
            Err(err) => tracing::warn!(error = %err, "keeping previous sleep times"),
        }
    }
}

fn pick_hydrated(
    loaded: Result<Option<RoutineState>, AppError>,
    fallback: RoutineState,
) -> RoutineState {
    match loaded {
        Ok(Some(state)) => {
            tracing::debug!("hydrated routine state from storage");
            state
        }
        Ok(None) => {
            tracing::debug!("no stored routine state; starting fresh");
            fallback
        }
        Err(err) => {
            tracing::warn!(error = %err, "discarding unreadable routine state");
            fallback
        }
    }
}
