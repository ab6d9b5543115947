pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod schedule;
pub mod storage;
pub mod store;
pub mod templates;

pub use model::{RoutineKind, RoutineState, Task, TaskTemplate, TaskUpdate};
pub use store::RoutineStore;
