//! Vehicle domain model.
//!
//! A [`Vehicle`] is one motorcycle tracked by a signed-in user. Vehicles own their
//! fillups; deleting a vehicle removes its fillups first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fallback shown wherever a vehicle name or model cannot be resolved.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// The authenticated user as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A motorcycle owned by a user.
///
/// `created_at` is assigned by the store and only used to keep display order stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub model: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    /// Returns the `name (model)` label used in lists and confirmation prompts.
    ///
    /// A missing model renders as empty parentheses, matching what users typed.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use miley::domain::Vehicle;
    ///
    /// let bike = Vehicle {
    ///     id: "b1".into(),
    ///     user_id: "u1".into(),
    ///     name: "Daily".into(),
    ///     model: Some("Classic 350".into()),
    ///     created_at: Utc::now(),
    /// };
    /// assert_eq!(bike.label(), "Daily (Classic 350)");
    /// ```
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.model.as_deref().unwrap_or_default())
    }
}

/// Entry form for a new vehicle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleForm {
    pub name: String,
    pub model: String,
}

impl VehicleForm {
    /// Creates a form from raw user input.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }

    /// Returns the trimmed name, or `None` when nothing but whitespace was entered.
    #[must_use]
    pub fn trimmed_name(&self) -> Option<&str> {
        let name = self.name.trim();
        (!name.is_empty()).then_some(name)
    }

    /// Returns the trimmed model, or `None` when left blank.
    #[must_use]
    pub fn trimmed_model(&self) -> Option<&str> {
        let model = self.model.trim();
        (!model.is_empty()).then_some(model)
    }
}
