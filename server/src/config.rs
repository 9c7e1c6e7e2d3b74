use std::path::PathBuf;

use mappa_client::tiles::DEFAULT_TILE_CACHE_CAPACITY;
use mappa_client::viewport::DEFAULT_TILE_SIZE;
use mappa_client::{ControllerConfig, SelectionMode, UndefinedModeError, ViewMode};

pub const SERVER_PORT: u16 = 3000;

pub const DEFAULT_DATA_PATH: &str = "data/languagedata.json";
pub const DEFAULT_TILE_DIR: &str = "tiles";
pub const DEFAULT_VIEW_WIDTH: u32 = 1024;
pub const DEFAULT_VIEW_HEIGHT: u32 = 768;
pub const MAX_VIEW_DIMENSION: u32 = 8192;
pub const DEFAULT_TEXTURE_SEED: u64 = 0;
pub const DEFAULT_COMMAND_BUFFER: usize = 64;
/// Tile files read at the same time.
pub const DEFAULT_TILE_FETCH_CONCURRENCY: usize = 6;

pub fn data_path() -> PathBuf {
    std::env::var("MAPPA_DATA_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH))
}

pub fn tile_dir() -> PathBuf {
    std::env::var("MAPPA_TILE_DIR")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TILE_DIR))
}

pub fn view_width() -> u32 {
    view_dimension("MAPPA_VIEW_WIDTH", DEFAULT_VIEW_WIDTH)
}

pub fn view_height() -> u32 {
    view_dimension("MAPPA_VIEW_HEIGHT", DEFAULT_VIEW_HEIGHT)
}

fn view_dimension(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| (1..=MAX_VIEW_DIMENSION).contains(value))
        .unwrap_or(default)
}

pub fn texture_seed() -> u64 {
    std::env::var("MAPPA_TEXTURE_SEED")
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_TEXTURE_SEED)
}

pub fn command_buffer() -> usize {
    std::env::var("MAPPA_COMMAND_BUFFER")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_COMMAND_BUFFER)
}

pub fn tile_cache_capacity() -> usize {
    std::env::var("MAPPA_TILE_CACHE_CAPACITY")
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_TILE_CACHE_CAPACITY)
}

pub fn tile_fetch_concurrency() -> usize {
    std::env::var("MAPPA_TILE_FETCH_CONCURRENCY")
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_TILE_FETCH_CONCURRENCY)
}

/// Unset means the default; anything set must name a real mode.
pub fn selection_mode() -> Result<SelectionMode, UndefinedModeError> {
    match std::env::var("MAPPA_SELECTION_MODE") {
        Ok(value) => value.parse(),
        Err(_) => Ok(SelectionMode::default()),
    }
}

pub fn view_mode() -> Result<ViewMode, UndefinedModeError> {
    match std::env::var("MAPPA_VIEW_MODE") {
        Ok(value) => value.parse(),
        Err(_) => Ok(ViewMode::default()),
    }
}

pub fn controller_config() -> Result<ControllerConfig, UndefinedModeError> {
    Ok(ControllerConfig {
        width: view_width(),
        height: view_height(),
        tile_size: DEFAULT_TILE_SIZE,
        tile_cache_capacity: tile_cache_capacity(),
        view_mode: view_mode()?,
        selection_mode: selection_mode()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        temp_env::with_vars_unset(
            [
                "MAPPA_DATA_PATH",
                "MAPPA_VIEW_WIDTH",
                "MAPPA_SELECTION_MODE",
                "MAPPA_VIEW_MODE",
                "MAPPA_COMMAND_BUFFER",
                "MAPPA_TILE_CACHE_CAPACITY",
                "MAPPA_TILE_FETCH_CONCURRENCY",
            ],
            || {
                assert_eq!(data_path(), PathBuf::from(DEFAULT_DATA_PATH));
                assert_eq!(view_width(), DEFAULT_VIEW_WIDTH);
                assert_eq!(command_buffer(), DEFAULT_COMMAND_BUFFER);
                assert_eq!(tile_fetch_concurrency(), DEFAULT_TILE_FETCH_CONCURRENCY);
                let config = controller_config().expect("defaults are valid");
                assert_eq!(config.tile_cache_capacity, DEFAULT_TILE_CACHE_CAPACITY);
                assert_eq!(config.selection_mode, SelectionMode::Any);
                assert_eq!(config.view_mode, ViewMode::Mosaic);
            },
        );
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        temp_env::with_vars(
            [
                ("MAPPA_VIEW_WIDTH", Some("0")),
                ("MAPPA_VIEW_HEIGHT", Some("99999")),
                ("MAPPA_TEXTURE_SEED", Some("seed")),
                ("MAPPA_COMMAND_BUFFER", Some("-4")),
                ("MAPPA_TILE_FETCH_CONCURRENCY", Some("0")),
            ],
            || {
                assert_eq!(view_width(), DEFAULT_VIEW_WIDTH);
                assert_eq!(view_height(), DEFAULT_VIEW_HEIGHT);
                assert_eq!(texture_seed(), DEFAULT_TEXTURE_SEED);
                assert_eq!(command_buffer(), DEFAULT_COMMAND_BUFFER);
                assert_eq!(tile_fetch_concurrency(), DEFAULT_TILE_FETCH_CONCURRENCY);
            },
        );
    }

    #[test]
    fn explicit_values_are_used() {
        temp_env::with_vars(
            [
                ("MAPPA_TILE_DIR", Some("/srv/tiles")),
                ("MAPPA_VIEW_WIDTH", Some("640")),
                ("MAPPA_TEXTURE_SEED", Some("77")),
                ("MAPPA_SELECTION_MODE", Some("ALL")),
                ("MAPPA_VIEW_MODE", Some("families")),
                ("MAPPA_TILE_CACHE_CAPACITY", Some("512")),
            ],
            || {
                assert_eq!(tile_dir(), PathBuf::from("/srv/tiles"));
                assert_eq!(view_width(), 640);
                assert_eq!(texture_seed(), 77);
                let config = controller_config().expect("valid modes");
                assert_eq!(config.selection_mode, SelectionMode::All);
                assert_eq!(config.view_mode, ViewMode::Families);
                assert_eq!(config.tile_cache_capacity, 512);
            },
        );
    }

    #[test]
    fn unknown_mode_is_an_error() {
        temp_env::with_var("MAPPA_SELECTION_MODE", Some("sometimes"), || {
            let err = selection_mode().expect_err("unknown mode");
            assert!(err.to_string().contains("sometimes"));
            assert!(controller_config().is_err());
        });
    }
}
