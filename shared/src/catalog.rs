use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::colors::{Colour, name_colour};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FamilyId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    pub id: FamilyId,
    pub name: String,
    pub colour: Colour,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub name: String,
}

/// Interning arena for family and feature tags. Handles are dense indices
/// into the arena and stay valid for the lifetime of the catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    families: Vec<Family>,
    features: Vec<Feature>,
    family_index: HashMap<String, FamilyId>,
    feature_index: HashMap<String, FeatureId>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing handle for `name` or registers a new family.
    /// Blank names are not tags and yield `None`.
    pub fn intern_family(&mut self, name: &str) -> Option<FamilyId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if let Some(&id) = self.family_index.get(name) {
            return Some(id);
        }
        let id = FamilyId(self.families.len() as u32);
        self.families.push(Family {
            id,
            name: name.to_owned(),
            colour: name_colour(name),
        });
        self.family_index.insert(name.to_owned(), id);
        Some(id)
    }

    pub fn intern_feature(&mut self, name: &str) -> Option<FeatureId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if let Some(&id) = self.feature_index.get(name) {
            return Some(id);
        }
        let id = FeatureId(self.features.len() as u32);
        self.features.push(Feature {
            id,
            name: name.to_owned(),
        });
        self.feature_index.insert(name.to_owned(), id);
        Some(id)
    }

    pub fn family(&self, id: FamilyId) -> Option<&Family> {
        self.families.get(id.0 as usize)
    }

    pub fn feature(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(id.0 as usize)
    }

    /// All families in first-seen order.
    pub fn families(&self) -> &[Family] {
        &self.families
    }

    /// All features in first-seen order.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }
}
