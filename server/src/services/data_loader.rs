use std::path::Path;

use mappa_client::{RegionLayer, TextureSynthesizer, build_layers};
use mappa_shared::{Catalog, DataIntegrityError, Dataset};
use tracing::{error, info, warn};

use crate::presenter::Command;
use crate::state::AppState;

/// Load the dataset and build textured layers off the presentation thread,
/// then hand the result over. A failed load switches the map to its
/// base-map-only state instead of stopping the server.
pub async fn run(state: AppState) {
    let path = state.sources.data_path.clone();
    let seed = state.sources.texture_seed;
    info!(path = %path.display(), seed, "Loading region data");

    let worker_path = path.clone();
    let command = match tokio::task::spawn_blocking(move || build(&worker_path, seed)).await {
        Ok(Ok((catalog, layers))) => Command::DataLoaded { catalog, layers },
        Ok(Err(e)) => {
            error!(path = %path.display(), error = %e, "Failed to load region data");
            Command::DataFailed {
                reason: e.to_string(),
            }
        }
        Err(e) => {
            error!(error = %e, "Region data worker did not finish");
            Command::DataFailed {
                reason: "data loader aborted".to_owned(),
            }
        }
    };

    if !state.presenter.send(command).await {
        warn!("Presentation thread stopped before region data arrived");
    }
}

/// Parse, validate and texture every region.
pub fn build(path: &Path, seed: u64) -> Result<(Catalog, Vec<RegionLayer>), DataIntegrityError> {
    let (catalog, regions) = Dataset::load(path)?.into_parts();
    let synth = TextureSynthesizer::new(seed);
    let layers = build_layers(regions, &synth);
    let textured = layers.iter().filter(|l| l.textures.is_some()).count();
    info!(layers = layers.len(), textured, "Built region layers");
    Ok((catalog, layers))
}
