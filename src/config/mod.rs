//! Configuration loaded from `.filevault.toml`.

pub mod settings;

pub use settings::{KdfSetting, Settings};
