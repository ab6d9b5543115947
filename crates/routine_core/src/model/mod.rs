mod state;
mod task;

pub use state::{CompletionSnapshot, RoutineState, SleepTimes};
pub use task::{RoutineKind, Task, TaskTemplate, TaskUpdate};
