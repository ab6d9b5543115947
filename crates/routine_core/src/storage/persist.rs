//! Serialization boundary between the routine store and a key-value backend.
//!
//! The whole [`RoutineState`] is written as one JSON document under
//! [`STORAGE_KEY`], wrapped in a small versioned envelope:
//!
//! ```json
//! { "version": 1, "state": { "finishBy": "09:00", "morningTasks": [], ... } }
//! ```

use super::{AsyncKeyValueBackend, KeyValueBackend};
use crate::clock;
use crate::error::AppError;
use crate::model::RoutineState;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const STORAGE_KEY: &str = "routine-storage";
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct StoredRoutineRef<'a> {
    version: u32,
    state: &'a RoutineState,
}

#[derive(Deserialize)]
struct StoredRoutine {
    #[serde(default)]
    version: u32,
    state: RoutineState,
}

pub fn encode_state(state: &RoutineState) -> Result<String, AppError> {
    let stored = StoredRoutineRef {
        version: SCHEMA_VERSION,
        state,
    };
    serde_json::to_string(&stored).map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn decode_state(content: &str) -> Result<RoutineState, AppError> {
    let stored: StoredRoutine =
        serde_json::from_str(content).map_err(|err| AppError::malformed_state(err.to_string()))?;

    if stored.version > SCHEMA_VERSION {
        return Err(AppError::malformed_state(format!(
            "unsupported version {}",
            stored.version
        )));
    }

    validate_state(&stored.state)?;
    Ok(stored.state)
}

/// Shape checks a hydrated state must pass before the store accepts it.
pub fn validate_state(state: &RoutineState) -> Result<(), AppError> {
    let malformed = |err: AppError| AppError::malformed_state(err.message().to_string());

    clock::to_minutes(&state.finish_by).map_err(malformed)?;
    clock::to_minutes(&state.sleep_times.seven_half).map_err(malformed)?;
    clock::to_minutes(&state.sleep_times.eight).map_err(malformed)?;

    for (label, tasks) in [
        ("morningTasks", &state.morning_tasks),
        ("eveningTasks", &state.evening_tasks),
    ] {
        for task in tasks {
            clock::to_minutes(&task.time).map_err(|err| {
                AppError::malformed_state(format!("{label}: {}", err.message()))
            })?;
        }
    }

    if state.morning_progress > 100 || state.evening_progress > 100 {
        return Err(AppError::malformed_state("progress must be within 0..=100"));
    }

    Ok(())
}

pub fn load_state(backend: &dyn KeyValueBackend) -> Result<Option<RoutineState>, AppError> {
    match backend.get(STORAGE_KEY)? {
        Some(content) => decode_state(&content).map(Some),
        None => Ok(None),
    }
}

pub fn save_state(backend: &dyn KeyValueBackend, state: &RoutineState) -> Result<(), AppError> {
    backend.set(STORAGE_KEY, &encode_state(state)?)
}

pub fn clear_state(backend: &dyn KeyValueBackend) -> Result<(), AppError> {
    backend.remove(STORAGE_KEY)
}

pub async fn load_state_async(
    backend: &dyn AsyncKeyValueBackend,
) -> Result<Option<RoutineState>, AppError> {
    match backend.get(STORAGE_KEY).await? {
        Some(content) => decode_state(&content).map(Some),
        None => Ok(None),
    }
}

pub async fn save_state_async(
    backend: &dyn AsyncKeyValueBackend,
    state: &RoutineState,
) -> Result<(), AppError> {
    let content = encode_state(state)?;
    backend.set(STORAGE_KEY, &content).await
}

/// Receives the full state after every store mutation.
pub trait StateObserver {
    fn state_changed(&self, state: &RoutineState);
}

pub struct NoopObserver;

impl StateObserver for NoopObserver {
    fn state_changed(&self, _state: &RoutineState) {}
}

/// Writes every change straight through to a synchronous backend.
pub struct SyncPersister<B> {
    backend: B,
}

impl<B: KeyValueBackend> SyncPersister<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

impl<B: KeyValueBackend> StateObserver for SyncPersister<B> {
    fn state_changed(&self, state: &RoutineState) {
        if let Err(err) = save_state(&self.backend, state) {
            tracing::warn!(error = %err, "failed to persist routine state");
        }
    }
}

/// Queues every change for a background task that writes to an async
/// backend. Writes land in mutation order; the caller never waits on them.
pub struct AsyncPersister {
    sender: mpsc::UnboundedSender<String>,
}

impl AsyncPersister {
    /// Starts the writer task on the current tokio runtime. The task ends once
    /// the persister is dropped and every queued snapshot has been written.
    pub fn spawn<B>(backend: B) -> (Self, JoinHandle<()>)
    where
        B: AsyncKeyValueBackend + 'static,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel::<String>();
        let handle = tokio::spawn(async move {
            while let Some(content) = receiver.recv().await {
                if let Err(err) = backend.set(STORAGE_KEY, &content).await {
                    tracing::warn!(error = %err, "failed to persist routine state");
                }
            }
            tracing::debug!("routine persistence writer stopped");
        });
        (Self { sender }, handle)
    }
}

impl StateObserver for AsyncPersister {
    fn state_changed(&self, state: &RoutineState) {
        let content = match encode_state(state) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode routine state");
                return;
            }
        };
        if self.sender.send(content).is_err() {
            tracing::warn!("routine persistence writer is gone; change not persisted");
        }
    }
}
