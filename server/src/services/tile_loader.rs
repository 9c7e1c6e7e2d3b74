use std::path::{Path, PathBuf};
use std::sync::Arc;

use mappa_client::{Raster, TileKey};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use crate::presenter::{Command, TileRequests};
use crate::state::AppState;

const TILE_EXTENSION: &str = "rgba";

#[derive(Debug)]
pub enum TileRead {
    Loaded(Raster),
    /// No file for this cell.
    Absent,
    /// A file exists but could not be used.
    Invalid,
}

/// Answer tile requests from the presentation thread. At most
/// `tile_fetch_concurrency` files are read at once; every key is answered
/// with either `TileLoaded` or `TileUnavailable`.
pub async fn run(state: AppState, mut requests: TileRequests) {
    let dir = state.sources.tile_dir.clone();
    if !dir.is_dir() {
        warn!(path = %dir.display(), "Tile directory not found, base map stays empty");
    }
    let permits = Arc::new(Semaphore::new(state.sources.tile_fetch_concurrency.max(1)));

    while let Some(key) = requests.recv().await {
        let permit = match permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let state = state.clone();
        let path = tile_path(&dir, key);
        tokio::spawn(async move {
            let _permit = permit;
            let tile_size = state.sources.tile_size;
            let read = match tokio::task::spawn_blocking(move || read_tile(&path, tile_size)).await
            {
                Ok(read) => read,
                Err(e) => {
                    error!(error = %e, ?key, "Tile read did not finish");
                    TileRead::Invalid
                }
            };
            let command = match read {
                TileRead::Loaded(raster) => {
                    state.observability.record_tiles_loaded(1);
                    Command::TileLoaded { key, raster }
                }
                TileRead::Absent => Command::TileUnavailable { key },
                TileRead::Invalid => {
                    state.observability.record_tile_load_failures(1);
                    Command::TileUnavailable { key }
                }
            };
            if !state.presenter.send(command).await {
                debug!(?key, "Presentation thread stopped before tile arrived");
            }
        });
    }
    debug!("Tile request channel closed");
}

/// `{dir}/{z}/{x}/{y}.rgba`
pub fn tile_path(dir: &Path, key: TileKey) -> PathBuf {
    dir.join(key.zoom.to_string())
        .join(key.x.to_string())
        .join(format!("{}.{TILE_EXTENSION}", key.y))
}

pub fn read_tile(path: &Path, tile_size: u32) -> TileRead {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return TileRead::Absent,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read tile");
            return TileRead::Invalid;
        }
    };
    match Raster::from_rgba_bytes(tile_size, tile_size, &bytes) {
        Some(raster) => TileRead::Loaded(raster),
        None => {
            warn!(
                path = %path.display(),
                bytes = bytes.len(),
                tile_size,
                "Tile has the wrong size"
            );
            TileRead::Invalid
        }
    }
}
