use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of project being deployed.
///
/// Declares where static assets live and which files never ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    /// Server application with a `public` directory
    #[default]
    Generic,
    /// Node.js server application
    Node,
    /// Static site; everything ships as assets, no code artifact
    Static,
}

impl ProjectType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectType::Generic => "generic",
            ProjectType::Node => "node",
            ProjectType::Static => "static",
        }
    }

    /// Directory inside the build holding static assets.
    pub fn assets_dir(self) -> &'static str {
        match self {
            ProjectType::Generic | ProjectType::Node => "public",
            ProjectType::Static => "dist",
        }
    }

    /// Globs removed from every build of this project type.
    ///
    /// Static projects never run the removal step, so they have none.
    pub fn default_ignores(self) -> &'static [&'static str] {
        match self {
            ProjectType::Generic => &[".env.*", "tests/**"],
            ProjectType::Node => &[".env.*", "tests/**", "node_modules/.cache/**"],
            ProjectType::Static => &[],
        }
    }

    /// Whether the project produces a code artifact (zip or image).
    pub fn ships_code(self) -> bool {
        !matches!(self, ProjectType::Static)
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
