//! Directory (roster) configuration.

use serde::{Deserialize, Serialize};

/// Where the static roster directory is loaded from.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DirectoryConfig {
    /// Path to a JSON roster file. Empty means an empty directory.
    #[serde(default)]
    pub roster_path: String,
}
