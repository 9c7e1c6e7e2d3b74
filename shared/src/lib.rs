pub mod catalog;
pub mod colors;
pub mod dataset;
pub mod detail;
pub mod error;
pub mod region;

pub use catalog::{Catalog, Family, FamilyId, Feature, FeatureId};
pub use colors::{Colour, name_colour};
pub use dataset::{Dataset, DatasetFile, LanguageRecord};
pub use detail::RegionDetail;
pub use error::DataIntegrityError;
pub use region::{Region, RegionId, Ring};
