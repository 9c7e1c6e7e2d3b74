use thiserror::Error;

/// Malformed source data, detected while loading rather than while rendering.
#[derive(Debug, Error)]
pub enum DataIntegrityError {
    #[error("ring has {longitudes} longitudes but {latitudes} latitudes")]
    RingLengthMismatch { longitudes: usize, latitudes: usize },
    #[error("malformed coordinate `{token}`: expected lon,lat[,alt]")]
    MalformedCoordinate { token: String },
    #[error("invalid number `{value}` in coordinate `{token}`")]
    InvalidNumber { token: String, value: String },
    #[error("invalid colour literal `{0}`")]
    InvalidColour(String),
    #[error("language #{index} ({name}): {source}")]
    InLanguage {
        index: usize,
        name: String,
        #[source]
        source: Box<DataIntegrityError>,
    },
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse dataset: {0}")]
    Json(#[from] serde_json::Error),
}
