pub mod schema;
pub mod store;

pub use schema::{Settings, SettingsPatch};
pub use store::SettingsStore;
