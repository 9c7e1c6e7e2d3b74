pub mod data_loader;
pub mod tile_loader;
