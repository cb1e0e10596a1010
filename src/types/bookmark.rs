use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Display name stored when the recipe snapshot carries none.
pub const UNKNOWN_RECIPE_NAME: &str = "Unknown Recipe";

/// A user's saved recipe, with the display fields copied at bookmark time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkRecord {
    /// Document id assigned by the remote store. `None` for local records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub meal_id: String,
    pub meal_name: String,
    pub meal_thumb: String,
    pub meal_category: String,
    pub meal_area: String,
    #[serde(default)]
    pub bookmarked_at: Option<DateTime<Utc>>,
}

/// Payload for creating a bookmark; the store fills in `id` and `bookmarked_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBookmark {
    pub user_id: String,
    pub meal_id: String,
    pub meal_name: String,
    pub meal_thumb: String,
    pub meal_category: String,
    pub meal_area: String,
}

impl NewBookmark {
    /// Builds the payload from a recipe snapshot, coercing every display field to a string.
    pub fn from_snapshot(user_id: &str, meal_id: &str, snapshot: &RecipeSnapshot) -> Self {
        Self {
            user_id: user_id.to_string(),
            meal_id: meal_id.to_string(),
            meal_name: coerce_field(snapshot.name.as_ref(), UNKNOWN_RECIPE_NAME),
            meal_thumb: coerce_field(snapshot.thumb.as_ref(), ""),
            meal_category: coerce_field(snapshot.category.as_ref(), ""),
            meal_area: coerce_field(snapshot.area.as_ref(), ""),
        }
    }

    /// Turns the payload into a stored record.
    pub fn into_record(self, id: Option<String>, bookmarked_at: Option<DateTime<Utc>>) -> BookmarkRecord {
        BookmarkRecord {
            id,
            user_id: self.user_id,
            meal_id: self.meal_id,
            meal_name: self.meal_name,
            meal_thumb: self.meal_thumb,
            meal_category: self.meal_category,
            meal_area: self.meal_area,
            bookmarked_at,
        }
    }
}

/// Recipe fields handed over by the recipe API (`lookup.php`, `search.php`, ...).
///
/// The bookmark layer does not validate where this came from; each field may be
/// any JSON scalar, or missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeSnapshot {
    #[serde(rename = "strMeal", default)]
    pub name: Option<Value>,
    #[serde(rename = "strMealThumb", default)]
    pub thumb: Option<Value>,
    #[serde(rename = "strCategory", default)]
    pub category: Option<Value>,
    #[serde(rename = "strArea", default)]
    pub area: Option<Value>,
}

impl RecipeSnapshot {
    /// Convenience constructor for callers that already hold plain strings.
    pub fn new(name: &str, thumb: &str, category: &str, area: &str) -> Self {
        Self {
            name: Some(Value::String(name.to_string())),
            thumb: Some(Value::String(thumb.to_string())),
            category: Some(Value::String(category.to_string())),
            area: Some(Value::String(area.to_string())),
        }
    }
}

/// Coerces a snapshot field to a string. Empty values (null, `""`, `false`, `0`)
/// fall back to `default`.
pub fn coerce_field(value: Option<&Value>, default: &str) -> String {
    match value {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::Bool(false)) => default.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        Some(Value::String(s)) if s.is_empty() => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => default.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Sorts records newest first. Records without a timestamp go last, in their original order.
pub fn sort_newest_first(records: &mut [BookmarkRecord]) {
    records.sort_by(|a, b| b.bookmarked_at.cmp(&a.bookmarked_at));
}
