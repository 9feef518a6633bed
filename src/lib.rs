//! Client for a remote task API with local, audible reminders

pub mod app_env;
pub mod cli;
pub mod config;
pub mod domain;
pub mod dto;
pub mod external_connections;
pub mod logging;
pub mod persistence;
pub mod terminal_alarm;
