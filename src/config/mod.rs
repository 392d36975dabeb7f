// Application configuration and the key-value settings store
pub mod settings;
pub mod store;

pub use settings::{Config, expand_home};
pub use store::{JsonFileSettings, MemorySettings, SettingsError, SettingsStore};
