//! Bookmark affordances.
//!
//! Every heart button on screen is a [`BookmarkButton`] attached to the manager's
//! [`ButtonRegistry`]. The registry only holds weak references: dropping the
//! button's `Arc` detaches it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;

use crate::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use crate::types::bookmark::RecipeSnapshot;

pub const GLYPH_BOOKMARKED: &str = "fa fa-heart";
pub const GLYPH_UNBOOKMARKED: &str = "fa fa-heart-o";
pub const TOOLTIP_BOOKMARKED: &str = "Remove from bookmarks";
pub const TOOLTIP_UNBOOKMARKED: &str = "Add to bookmarks";

/// What a bookmark button should look like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonState {
    pub bookmarked: bool,
    pub glyph: &'static str,
    pub label: &'static str,
    pub tooltip: &'static str,
    /// True while this button's own add/remove is in flight.
    pub disabled: bool,
}

impl ButtonState {
    pub fn for_bookmarked(bookmarked: bool) -> Self {
        if bookmarked {
            Self {
                bookmarked,
                glyph: GLYPH_BOOKMARKED,
                label: "Bookmarked",
                tooltip: TOOLTIP_BOOKMARKED,
                disabled: false,
            }
        } else {
            Self {
                bookmarked,
                glyph: GLYPH_UNBOOKMARKED,
                label: "Bookmark",
                tooltip: TOOLTIP_UNBOOKMARKED,
                disabled: false,
            }
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A bookmark toggle for one meal card.
pub struct BookmarkButton {
    meal_id: String,
    snapshot: RecipeSnapshot,
    state: Mutex<ButtonState>,
}

impl BookmarkButton {
    pub fn meal_id(&self) -> &str {
        &self.meal_id
    }

    pub fn state(&self) -> ButtonState {
        lock(&self.state).clone()
    }

    /// Sets the visual state, keeping the disabled flag of an in-flight click.
    pub fn render(&self, bookmarked: bool) {
        let mut state = lock(&self.state);
        let disabled = state.disabled;
        *state = ButtonState::for_bookmarked(bookmarked);
        state.disabled = disabled;
    }

    /// Toggles the bookmark. The button stays disabled until the manager
    /// finishes; clicks arriving meanwhile are ignored and return `false`.
    pub async fn click(&self, manager: &BookmarkManager) -> bool {
        {
            let mut state = lock(&self.state);
            if state.disabled {
                return false;
            }
            state.disabled = true;
        }

        let ok = manager.toggle(&self.meal_id, Some(&self.snapshot)).await;

        lock(&self.state).disabled = false;
        self.render(manager.is_bookmarked(&self.meal_id));
        ok
    }
}

/// Buttons currently attached to the page.
#[derive(Default)]
pub struct ButtonRegistry {
    buttons: Mutex<Vec<Weak<BookmarkButton>>>,
}

impl ButtonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and attaches a button rendered with the given initial state.
    pub fn attach(&self, meal_id: &str, snapshot: RecipeSnapshot, bookmarked: bool) -> Arc<BookmarkButton> {
        let button = Arc::new(BookmarkButton {
            meal_id: meal_id.to_string(),
            snapshot,
            state: Mutex::new(ButtonState::for_bookmarked(bookmarked)),
        });
        lock(&self.buttons).push(Arc::downgrade(&button));
        button
    }

    /// Live buttons; dead weak references are pruned on the way.
    pub fn attached(&self) -> Vec<Arc<BookmarkButton>> {
        let mut buttons = lock(&self.buttons);
        buttons.retain(|b| b.strong_count() > 0);
        buttons.iter().filter_map(Weak::upgrade).collect()
    }

    pub fn attached_count(&self) -> usize {
        self.attached().len()
    }

    /// Re-renders every attached button. Returns how many were updated.
    pub fn refresh(&self, is_bookmarked: impl Fn(&str) -> bool) -> usize {
        let buttons = self.attached();
        for button in &buttons {
            button.render(is_bookmarked(button.meal_id()));
        }
        buttons.len()
    }
}
