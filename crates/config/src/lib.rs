//! User-facing configuration, loaded from the platform config directory.

pub mod settings;

pub use settings::Settings;
