//! ZaikaBox — bookmark synchronization and caching for the recipe explorer.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod services;
pub mod storage;
pub mod types;
pub mod ui;
