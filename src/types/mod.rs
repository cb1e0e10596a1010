// ZaikaBox shared type definitions
// Each submodule defines types used across the bookmark layer.

pub mod auth;
pub mod bookmark;
pub mod errors;
pub mod event;
pub mod settings;
