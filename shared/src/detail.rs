
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::region::{Region, RegionId};

/// Read-only summary of a region for the detail channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDetail {
    pub id: RegionId,
    pub name: String,
    pub other_names: Vec<String>,
    pub ur_family: Option<String>,
    pub families: Vec<String>,
    pub features: Vec<String>,
    pub colour: String,
    pub information: String,
    pub links: Vec<String>,
}

impl RegionDetail {
    pub fn from_region(region: &Region, catalog: &Catalog) -> Self {
        let families: Vec<String> = region
            .families
            .iter()
            .filter_map(|&id| catalog.family(id))
            .map(|f| f.name.clone())
            .collect();
        let features = region
            .features
            .iter()
            .filter_map(|&id| catalog.feature(id))
            .map(|f| f.name.clone())
            .collect();

        Self {
            id: region.id,
            name: region.label(),
            other_names: region.names.iter().skip(1).cloned().collect(),
            ur_family: families.first().cloned(),
            families,
            features,
            colour: region.colour.to_hex(),
            information: region.information.clone(),
            links: region.links.clone(),
        }
    }
}
