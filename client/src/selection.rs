use std::collections::BTreeSet;

use mappa_shared::{FamilyId, FeatureId, Region, RegionId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::modes::SelectionMode;

/// One checkbox-style filter entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Criterion {
    Family(FamilyId),
    Feature(FeatureId),
    Location(RegionId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionCriteria {
    pub families: BTreeSet<FamilyId>,
    pub features: BTreeSet<FeatureId>,
    pub locations: BTreeSet<RegionId>,
}

impl SelectionCriteria {
    pub fn is_empty(&self) -> bool {
        self.families.is_empty() && self.features.is_empty() && self.locations.is_empty()
    }

    pub fn insert(&mut self, criterion: Criterion) -> bool {
        match criterion {
            Criterion::Family(id) => self.families.insert(id),
            Criterion::Feature(id) => self.features.insert(id),
            Criterion::Location(id) => self.locations.insert(id),
        }
    }

    pub fn remove(&mut self, criterion: Criterion) -> bool {
        match criterion {
            Criterion::Family(id) => self.families.remove(&id),
            Criterion::Feature(id) => self.features.remove(&id),
            Criterion::Location(id) => self.locations.remove(&id),
        }
    }

    /// Whether `region` passes these criteria under `mode`.
    ///
    /// Empty criteria match nothing here; callers treat "no criteria" as
    /// "no filter" before asking.
    pub fn matches(&self, region: &Region, mode: SelectionMode) -> bool {
        let location_selected = self.locations.contains(&region.id);
        match mode {
            SelectionMode::Any => {
                location_selected
                    || region.families.iter().any(|f| self.families.contains(f))
                    || region.features.iter().any(|f| self.features.contains(f))
            }
            SelectionMode::All => {
                if location_selected {
                    return true;
                }
                if self.families.is_empty() && self.features.is_empty() {
                    return false;
                }
                let families_ok = self.families.iter().all(|f| region.families.contains(f));
                let features_ok = self.features.iter().all(|f| region.features.contains(f));
                families_ok && features_ok
            }
        }
    }
}

/// Active filter criteria plus the region subset they select. Every
/// mutation recomputes the subset over all regions.
#[derive(Debug, Clone, Default)]
pub struct SelectionEngine {
    criteria: SelectionCriteria,
    mode: SelectionMode,
    selected: BTreeSet<RegionId>,
}

impl SelectionEngine {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn criteria(&self) -> &SelectionCriteria {
        &self.criteria
    }

    pub fn add_criterion<'a>(
        &mut self,
        criterion: Criterion,
        regions: impl IntoIterator<Item = &'a Region>,
    ) -> bool {
        let changed = self.criteria.insert(criterion);
        self.recompute(regions);
        changed
    }

    pub fn remove_criterion<'a>(
        &mut self,
        criterion: Criterion,
        regions: impl IntoIterator<Item = &'a Region>,
    ) -> bool {
        let changed = self.criteria.remove(criterion);
        self.recompute(regions);
        changed
    }

    pub fn set_mode<'a>(
        &mut self,
        mode: SelectionMode,
        regions: impl IntoIterator<Item = &'a Region>,
    ) -> bool {
        if self.mode == mode {
            return false;
        }
        self.mode = mode;
        self.recompute(regions);
        true
    }

    pub fn clear(&mut self) {
        self.criteria = SelectionCriteria::default();
        self.selected.clear();
    }

    /// Regions passing the current criteria, in input order.
    pub fn compute_selected<'a>(&self, regions: impl IntoIterator<Item = &'a Region>) -> Vec<RegionId> {
        regions
            .into_iter()
            .filter(|r| self.criteria.matches(r, self.mode))
            .map(|r| r.id)
            .collect()
    }

    pub fn recompute<'a>(&mut self, regions: impl IntoIterator<Item = &'a Region>) {
        self.selected = self.compute_selected(regions).into_iter().collect();
        debug!(
            mode = %self.mode,
            selected = self.selected.len(),
            "Recomputed selection"
        );
    }

    pub fn selected(&self) -> &BTreeSet<RegionId> {
        &self.selected
    }

    pub fn is_filter_active(&self) -> bool {
        !self.criteria.is_empty()
    }

    /// Whether a region should be drawn and may take hover.
    pub fn is_visible(&self, id: RegionId) -> bool {
        !self.is_filter_active() || self.selected.contains(&id)
    }
}
