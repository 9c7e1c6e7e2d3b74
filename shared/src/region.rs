use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{FamilyId, FeatureId};
use crate::colors::Colour;
use crate::error::DataIntegrityError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub u32);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One closed boundary loop, stored as parallel longitude/latitude arrays.
///
/// The fields are public so that a data source can hand over geometry
/// as-is; [`Ring::new`] is the validating constructor used by the loader.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ring {
    pub longitudes: Vec<f64>,
    pub latitudes: Vec<f64>,
}

impl Ring {
    pub fn new(longitudes: Vec<f64>, latitudes: Vec<f64>) -> Result<Self, DataIntegrityError> {
        if longitudes.len() != latitudes.len() {
            return Err(DataIntegrityError::RingLengthMismatch {
                longitudes: longitudes.len(),
                latitudes: latitudes.len(),
            });
        }
        Ok(Self {
            longitudes,
            latitudes,
        })
    }

    /// Build from `(longitude, latitude)` pairs.
    pub fn from_points(points: &[(f64, f64)]) -> Self {
        let (longitudes, latitudes) = points.iter().copied().unzip();
        Self {
            longitudes,
            latitudes,
        }
    }

    pub fn len(&self) -> usize {
        self.longitudes.len().min(self.latitudes.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(longitude, latitude)` pairs.
    pub fn vertices(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.longitudes
            .iter()
            .copied()
            .zip(self.latitudes.iter().copied())
    }
}

/// A named geographic area with its tags, colours and boundary rings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    /// First entry is the common name.
    pub names: Vec<String>,
    /// First entry is the top-level family.
    pub families: Vec<FamilyId>,
    pub features: Vec<FeatureId>,
    pub rings: Vec<Ring>,
    pub colour: Colour,
    /// Own colour mixed into the top-level family colour.
    pub group_colour: Colour,
    #[serde(default)]
    pub information: String,
    #[serde(default)]
    pub links: Vec<String>,
}

impl Region {
    pub fn common_name(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }

    pub fn ur_family(&self) -> Option<FamilyId> {
        self.families.first().copied()
    }

    pub fn has_geometry(&self) -> bool {
        self.rings.iter().any(|ring| !ring.is_empty())
    }

    /// Display label; falls back to the id for unnamed regions.
    pub fn label(&self) -> String {
        self.common_name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("region {}", self.id))
    }
}
