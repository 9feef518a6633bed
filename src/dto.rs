//! Shapes of the JSON bodies exchanged with the task API

pub mod task;
pub mod user;
