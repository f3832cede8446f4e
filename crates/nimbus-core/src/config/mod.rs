//! Project manifest and client settings.

pub mod parser;
pub mod schema;
pub mod settings;
pub mod store;

pub use parser::{parse_project_toml, parse_project_toml_str};
pub use schema::{EnvironmentConfiguration, ProjectConfiguration};
pub use settings::ClientSettings;
pub use store::{MANIFEST_FILE, ProjectStore};
