// ZaikaBox UI glue
// View-side models driven by the bookmark manager.

pub mod bookmark_buttons;
