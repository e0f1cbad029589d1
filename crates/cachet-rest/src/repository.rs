//! In-memory repositories backing the demo API.

use cachet_core::Model;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// A catalogue item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Widget {
    pub id: u64,
    pub name: String,
    pub category: String,
}

impl Model for Widget {
    const NAMESPACE: &'static str = "shop";
    const NAME: &'static str = "Widget";
}

/// Fields accepted when creating or replacing a widget.
#[derive(Debug, Clone, Deserialize)]
pub struct WidgetInput {
    pub name: String,
    pub category: String,
}

/// Thread-safe widget storage with sequential ids.
#[derive(Debug, Default)]
pub struct WidgetRepository {
    widgets: RwLock<BTreeMap<u64, Widget>>,
    next_id: AtomicU64,
}

impl WidgetRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lists widgets in id order, optionally filtered by category.
    #[must_use]
    pub fn list(&self, category: Option<&str>) -> Vec<Widget> {
        self.widgets
            .read()
            .values()
            .filter(|w| category.map_or(true, |c| w.category == c))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn find(&self, id: u64) -> Option<Widget> {
        self.widgets.read().get(&id).cloned()
    }

    pub fn create(&self, input: WidgetInput) -> Widget {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let widget = Widget {
            id,
            name: input.name,
            category: input.category,
        };
        self.widgets.write().insert(id, widget.clone());
        widget
    }

    /// Replaces an existing widget. Returns `None` when it does not exist.
    pub fn update(&self, id: u64, input: WidgetInput) -> Option<Widget> {
        let mut widgets = self.widgets.write();
        let widget = widgets.get_mut(&id)?;
        widget.name = input.name;
        widget.category = input.category;
        Some(widget.clone())
    }

    pub fn delete(&self, id: u64) -> bool {
        self.widgets.write().remove(&id).is_some()
    }
}

/// Display settings of one user. This is the principal model: writes to
/// it invalidate everything cached for that user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub display_name: String,
}

impl Model for Profile {
    const NAMESPACE: &'static str = "auth";
    const NAME: &'static str = "User";
}

/// Fields accepted when replacing a profile.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileInput {
    pub display_name: String,
}

/// Thread-safe profile storage keyed by user id.
#[derive(Debug, Default)]
pub struct ProfileRepository {
    profiles: RwLock<BTreeMap<String, Profile>>,
}

impl ProfileRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored profile, or one named after the user id.
    #[must_use]
    pub fn get_or_default(&self, user_id: &str) -> Profile {
        self.profiles
            .read()
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| Profile {
                user_id: user_id.to_string(),
                display_name: user_id.to_string(),
            })
    }

    /// Stores a profile. Returns it with whether it was newly created.
    pub fn upsert(&self, user_id: &str, input: ProfileInput) -> (Profile, bool) {
        let profile = Profile {
            user_id: user_id.to_string(),
            display_name: input.display_name,
        };
        let previous = self
            .profiles
            .write()
            .insert(user_id.to_string(), profile.clone());
        (profile, previous.is_none())
    }
}
