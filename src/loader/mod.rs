pub mod track_loader;

pub use track_loader::{LoadEvent, spawn_loading};
