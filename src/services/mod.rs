// ZaikaBox services
// Services wrap collaborators the bookmark layer depends on: auth state and settings.

pub mod auth_session;
pub mod settings_engine;
