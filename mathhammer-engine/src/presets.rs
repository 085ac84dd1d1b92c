//! Named target profiles.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::units::Unit;

const DEFAULT_TARGET_DATA: &str = include_str!("../data/targets.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetPreset {
    pub id: String,
    pub name: String,
    pub unit: Unit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct TargetCatalog(pub Vec<TargetPreset>);

impl TargetCatalog {
    #[must_use]
    pub fn load_from_static() -> Self {
        serde_json::from_str(DEFAULT_TARGET_DATA).unwrap_or_default()
    }

    #[must_use]
    pub fn default_catalog() -> &'static Self {
        static CATALOG: OnceLock<TargetCatalog> = OnceLock::new();
        CATALOG.get_or_init(Self::load_from_static)
    }

    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a target catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Exact id first, then a case-insensitive match.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&TargetPreset> {
        self.0
            .iter()
            .find(|preset| preset.id == id)
            .or_else(|| self.0.iter().find(|preset| preset.id.eq_ignore_ascii_case(id)))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TargetPreset> {
        self.0.iter()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a TargetCatalog {
    type Item = &'a TargetPreset;
    type IntoIter = std::slice::Iter<'a, TargetPreset>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Look up a bundled target profile.
#[must_use]
pub fn target(id: &str) -> Option<Unit> {
    TargetCatalog::default_catalog().get(id).map(|preset| preset.unit)
}

/// Every bundled target profile, in catalog order.
#[must_use]
pub fn all() -> &'static [TargetPreset] {
    &TargetCatalog::default_catalog().0
}
