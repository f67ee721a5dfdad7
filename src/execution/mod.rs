//! Pipeline execution engine

pub mod cache;
pub mod engine;
pub mod executor;

pub use cache::{Fingerprint, ResultCache};
pub use engine::{EventHandler, ExecutionEngine, ExecutionEvent};
pub use executor::StationExecutor;
