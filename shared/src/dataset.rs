use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::colors::{mix, name_colour, parse_hex_colour};
use crate::error::DataIntegrityError;
use crate::region::{Region, RegionId, Ring};

/// Placeholder some records use for "no known location".
const NO_LOCATION: &str = "N/A";

/// On-disk dataset document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetFile {
    #[serde(default)]
    pub languages: Vec<LanguageRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageRecord {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub families: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    /// KML coordinate strings, one per ring.
    #[serde(default)]
    pub location: Vec<String>,
    #[serde(default)]
    pub information: String,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
}

/// Fully parsed, validated dataset. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    catalog: Catalog,
    regions: Vec<Region>,
}

impl Dataset {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataIntegrityError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let dataset = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            regions = dataset.regions.len(),
            families = dataset.catalog.families().len(),
            features = dataset.catalog.features().len(),
            "Loaded dataset"
        );
        Ok(dataset)
    }

    pub fn from_json(raw: &str) -> Result<Self, DataIntegrityError> {
        let file: DatasetFile = serde_json::from_str(raw)?;
        Self::from_file(file)
    }

    pub fn from_file(file: DatasetFile) -> Result<Self, DataIntegrityError> {
        let mut catalog = Catalog::new();
        let mut regions = Vec::with_capacity(file.languages.len());

        for (index, record) in file.languages.into_iter().enumerate() {
            let name = record.names.first().cloned().unwrap_or_default();
            let region = build_region(RegionId(index as u32), record, &mut catalog).map_err(
                |source| DataIntegrityError::InLanguage {
                    index,
                    name,
                    source: Box::new(source),
                },
            )?;
            regions.push(region);
        }

        Ok(Self { catalog, regions })
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.0 as usize).filter(|r| r.id == id)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn into_parts(self) -> (Catalog, Vec<Region>) {
        (self.catalog, self.regions)
    }
}

fn build_region(
    id: RegionId,
    record: LanguageRecord,
    catalog: &mut Catalog,
) -> Result<Region, DataIntegrityError> {
    let names: Vec<String> = record
        .names
        .into_iter()
        .map(|n| n.trim().to_owned())
        .filter(|n| !n.is_empty())
        .collect();

    let mut families = Vec::with_capacity(record.families.len());
    for family in &record.families {
        if let Some(id) = catalog.intern_family(family) {
            if !families.contains(&id) {
                families.push(id);
            }
        }
    }
    let mut features = Vec::with_capacity(record.features.len());
    for feature in &record.features {
        if let Some(id) = catalog.intern_feature(feature) {
            if !features.contains(&id) {
                features.push(id);
            }
        }
    }

    let mut rings = Vec::with_capacity(record.location.len());
    for location in &record.location {
        if let Some(ring) = parse_coordinates(location)? {
            rings.push(ring);
        }
    }

    let colour = match record.colour.as_deref().map(str::trim) {
        Some(hex) if !hex.is_empty() => {
            parse_hex_colour(hex).ok_or_else(|| DataIntegrityError::InvalidColour(hex.to_owned()))?
        }
        _ => name_colour(names.first().map(String::as_str).unwrap_or_default()),
    };
    let group_colour = families
        .first()
        .and_then(|&f| catalog.family(f))
        .map(|family| mix(family.colour, colour))
        .unwrap_or(colour);

    let links = record
        .links
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(normalize_link)
        .collect();

    debug!(region = %id, rings = rings.len(), "Parsed language record");

    Ok(Region {
        id,
        names,
        families,
        features,
        rings,
        colour,
        group_colour,
        information: record.information.trim().to_owned(),
        links,
    })
}

/// Parse one KML coordinate string (`"lon,lat[,alt] lon,lat[,alt] ..."`).
/// Returns `None` for a blank or placeholder location.
pub fn parse_coordinates(raw: &str) -> Result<Option<Ring>, DataIntegrityError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case(NO_LOCATION) {
        return Ok(None);
    }

    let mut longitudes = Vec::new();
    let mut latitudes = Vec::new();
    for token in raw.split_whitespace() {
        let parts: Vec<&str> = token.split(',').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(DataIntegrityError::MalformedCoordinate {
                token: token.to_owned(),
            });
        }
        longitudes.push(parse_number(token, parts[0])?);
        latitudes.push(parse_number(token, parts[1])?);
    }

    Ring::new(longitudes, latitudes).map(Some)
}

fn parse_number(token: &str, value: &str) -> Result<f64, DataIntegrityError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DataIntegrityError::InvalidNumber {
            token: token.to_owned(),
            value: value.to_owned(),
        })
}

fn normalize_link(link: &str) -> String {
    if link.contains("://") {
        link.to_owned()
    } else {
        format!("http://{link}")
    }
}

#[cfg(test)]
mod tests {
    use super::{Dataset, parse_coordinates};
    use crate::catalog::FamilyId;
    use crate::colors::{Colour, mix};
    use crate::error::DataIntegrityError;
    use crate::region::RegionId;

    const SAMPLE: &str = r##"{
        "languages": [
            {
                "names": ["Haida", "Xaad Kil"],
                "families": ["Isolate"],
                "features": ["Ergative", "Verb-final"],
                "location": ["-132.0,53.0,0 -131.0,54.0,0 -133.0,54.5,0"],
                "information": "  Spoken on Haida Gwaii. ",
                "links": ["en.wikipedia.org/wiki/Haida_language", "https://example.org"],
                "colour": "#c83232"
            },
            {
                "names": ["Unplaced"],
                "families": ["Isolate", ""],
                "location": ["N/A"]
            }
        ]
    }"##;

    #[test]
    fn parses_sample_dataset() {
        let dataset = Dataset::from_json(SAMPLE).expect("sample parses");
        assert_eq!(dataset.regions().len(), 2);
        assert_eq!(dataset.catalog().families().len(), 1);
        assert_eq!(dataset.catalog().features().len(), 2);

        let haida = dataset.region(RegionId(0)).expect("first region");
        assert_eq!(haida.common_name(), Some("Haida"));
        assert_eq!(haida.families, vec![FamilyId(0)]);
        assert_eq!(haida.rings.len(), 1);
        assert_eq!(haida.rings[0].longitudes, vec![-132.0, -131.0, -133.0]);
        assert_eq!(haida.rings[0].latitudes, vec![53.0, 54.0, 54.5]);
        assert_eq!(haida.colour, Colour::rgb(200, 50, 50));
        assert_eq!(haida.information, "Spoken on Haida Gwaii.");
        assert_eq!(
            haida.links,
            vec![
                "http://en.wikipedia.org/wiki/Haida_language".to_string(),
                "https://example.org".to_string()
            ]
        );

        let isolate = dataset.catalog().family(FamilyId(0)).expect("family");
        assert_eq!(haida.group_colour, mix(isolate.colour, haida.colour));
    }

    #[test]
    fn placeholder_location_yields_zero_rings() {
        let dataset = Dataset::from_json(SAMPLE).expect("sample parses");
        let unplaced = dataset.region(RegionId(1)).expect("second region");
        assert!(unplaced.rings.is_empty());
        assert!(!unplaced.has_geometry());
        assert_eq!(unplaced.families, vec![FamilyId(0)]);
    }

    #[test]
    fn coordinates_accept_two_or_three_parts() {
        let ring = parse_coordinates("1,2 3,4,5\n6,7")
            .expect("valid")
            .expect("ring");
        assert_eq!(ring.longitudes, vec![1.0, 3.0, 6.0]);
        assert_eq!(ring.latitudes, vec![2.0, 4.0, 7.0]);
        assert!(parse_coordinates("   ").expect("blank ok").is_none());
    }

    #[test]
    fn malformed_coordinate_token_is_rejected() {
        let err = parse_coordinates("1,2 3").unwrap_err();
        assert!(matches!(err, DataIntegrityError::MalformedCoordinate { ref token } if token == "3"));

        let err = parse_coordinates("1,2,3,4").unwrap_err();
        assert!(matches!(err, DataIntegrityError::MalformedCoordinate { .. }));

        let err = parse_coordinates("1,north").unwrap_err();
        assert!(matches!(err, DataIntegrityError::InvalidNumber { ref value, .. } if value == "north"));
    }

    #[test]
    fn bad_geometry_fails_the_whole_load() {
        let raw = r#"{"languages":[{"names":["Broken"],"location":["1,2 3,x"]}]}"#;
        let err = Dataset::from_json(raw).unwrap_err();
        match err {
            DataIntegrityError::InLanguage { index, name, .. } => {
                assert_eq!(index, 0);
                assert_eq!(name, "Broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_colour_literal_is_rejected() {
        let raw = r#"{"languages":[{"names":["Odd"],"colour":"teal"}]}"#;
        let err = Dataset::from_json(raw).unwrap_err();
        assert!(err.to_string().contains("invalid colour literal"));
    }

    #[test]
    fn region_without_family_uses_own_colour_as_group() {
        let raw = r#"{"languages":[{"names":["Solo"]}]}"#;
        let dataset = Dataset::from_json(raw).expect("parses");
        let solo = &dataset.regions()[0];
        assert_eq!(solo.group_colour, solo.colour);
    }

    #[test]
    fn load_reports_missing_file_as_io_error() {
        let err = Dataset::load("/nonexistent/mappa/dataset.json").unwrap_err();
        assert!(matches!(err, DataIntegrityError::Io(_)));
    }
}
