// ZaikaBox state managers
// Managers own session-scoped state: the bookmark set, its cache, and the UI sync around them.

pub mod bookmark_cache;
pub mod bookmark_manager;
