//! Client configuration layers
//!
//! Settings are resolved from three layers, later ones winning:
//! 1. Built-in defaults
//! 2. Config file (`[client]` table of a TOML file)
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::BuiltinDefaults;
pub use effective::{ClientSettings, ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig};
pub use merge::{deep_merge, merge_layers};
