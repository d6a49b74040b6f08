//! Workflow utilities shared by the orchestrator steps
//!
//! - **batch**: Concurrent execution with failure isolation, even list splitting

pub mod batch;

pub use batch::{execute_batch_isolated, split_evenly, TaskContext};
