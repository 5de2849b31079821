//! Layout registry - named layouts from built-ins and config

use std::collections::BTreeMap;

use serde::Deserialize;

use super::layout::{FieldLayout, FieldSpec};

/// A layout table as written in the config file
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// `struct LockInfo { address user; uint64 startTime; uint256 amount; }`
///
/// `user` and `start_time` share slot 0 with `user` in the low 20 bytes.
pub fn lock_info_layout() -> FieldLayout {
    FieldLayout::builder("LockInfo")
        .address("user", 0, 12)
        .uint("start_time", 0, 4, 8)
        .uint("amount", 1, 0, 32)
        .build()
        .unwrap_or_else(|e| unreachable!("built-in LockInfo layout is valid: {e}"))
}

/// Registry of validated layouts indexed by name
#[derive(Debug, Default, Clone)]
pub struct LayoutRegistry {
    layouts: BTreeMap<String, FieldLayout>,
    /// Layouts from config that failed validation
    pub errors: Vec<String>,
}

impl LayoutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.insert(lock_info_layout());
        registry
    }

    /// Insert a layout, replacing any layout with the same name
    pub fn insert(&mut self, layout: FieldLayout) {
        self.layouts.insert(layout.name().to_string(), layout);
    }

    /// Validate and add config layouts; invalid entries are recorded and skipped
    pub fn load_config(&mut self, entries: &[LayoutConfig]) -> usize {
        let mut loaded = 0;
        for entry in entries {
            match FieldLayout::new(entry.name.clone(), entry.fields.clone()) {
                Ok(layout) => {
                    tracing::debug!(layout = %entry.name, slots = layout.slot_count(), "loaded layout");
                    self.insert(layout);
                    loaded += 1;
                }
                Err(err) => {
                    tracing::warn!(layout = %entry.name, error = %err, "skipping invalid layout");
                    self.errors.push(format!("{}: {}", entry.name, err));
                }
            }
        }
        loaded
    }

    pub fn get(&self, name: &str) -> Option<&FieldLayout> {
        self.layouts.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layouts.keys().map(|k| k.as_str())
    }

    pub fn layouts(&self) -> impl Iterator<Item = &FieldLayout> {
        self.layouts.values()
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}
