//! The editable configuration model.
//!
//! A [`Configuration`] is what the user sees in the editor form: two free-text
//! fields and an ordered list of [`TaskEntry`] rows.  Every mutation the editor
//! offers is defined here as a plain method so it can be tested without any
//! session, store, or socket around it.
//!
//! # Index safety
//!
//! Rows are addressed by position.  A browser may send a stale index (for
//! example after another edit removed a row), so [`Configuration::remove_task`]
//! and [`Configuration::update_task`] treat out-of-range indices as a no-op and
//! report whether anything changed instead of panicking.

use serde::{Deserialize, Serialize};

/// One row of the task list: a script/resource link plus a label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEntry {
    /// Script or resource link.  May be empty.
    pub addons: String,
    /// Free-text label.  May be empty.
    pub tag: String,
}

impl TaskEntry {
    pub fn new(addons: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            addons: addons.into(),
            tag: tag.into(),
        }
    }
}

/// The root configuration object.
///
/// Serialises with the task list under the key `task` so the editable view
/// sent to the browser uses the same field names as the stored document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub name: String,
    pub description: String,
    /// Ordered task list.  Order is meaningful; duplicates are allowed.
    #[serde(rename = "task", default)]
    pub tasks: Vec<TaskEntry>,
}

/// Selects one of the top-level text fields of a [`Configuration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigField {
    Name,
    Description,
}

/// Selects one of the text fields of a [`TaskEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskField {
    Addons,
    Tag,
}

impl Configuration {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            tasks: Vec::new(),
        }
    }

    /// Builder-style helper that appends a task and returns `self`.
    pub fn with_task(mut self, addons: impl Into<String>, tag: impl Into<String>) -> Self {
        self.tasks.push(TaskEntry::new(addons, tag));
        self
    }

    /// Appends an empty task row to the end of the list.
    pub fn add_task(&mut self) {
        self.tasks.push(TaskEntry::default());
    }

    /// Removes the task at `index`, keeping the relative order of the rest.
    ///
    /// Returns `false` (and leaves the list untouched) when `index` is out
    /// of range.
    pub fn remove_task(&mut self, index: usize) -> bool {
        if index >= self.tasks.len() {
            return false;
        }
        self.tasks.remove(index);
        true
    }

    /// Replaces one of the top-level text fields.
    pub fn update_field(&mut self, field: ConfigField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ConfigField::Name => self.name = value,
            ConfigField::Description => self.description = value,
        }
    }

    /// Replaces one field of the task at `index`.
    ///
    /// Returns `false` (and leaves the list untouched) when `index` is out
    /// of range.
    pub fn update_task(&mut self, index: usize, field: TaskField, value: impl Into<String>) -> bool {
        let Some(task) = self.tasks.get_mut(index) else {
            return false;
        };
        let value = value.into();
        match field {
            TaskField::Addons => task.addons = value,
            TaskField::Tag => task.tag = value,
        }
        true
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
