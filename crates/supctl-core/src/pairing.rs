//! File classification and the latest-file-per-role store

use crate::error::StoreError;
use crate::table::Table;
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Role of a series file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesRole {
    Primary,
    Secondary,
}

impl SeriesRole {
    /// The complementary role
    pub fn other(self) -> Self {
        match self {
            SeriesRole::Primary => SeriesRole::Secondary,
            SeriesRole::Secondary => SeriesRole::Primary,
        }
    }
}

impl fmt::Display for SeriesRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesRole::Primary => write!(f, "primary"),
            SeriesRole::Secondary => write!(f, "secondary"),
        }
    }
}

/// Outcome of classifying a retrieved file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Tabular file matching one of the series patterns
    Series(SeriesRole),
    /// Extension is not a recognized tabular format
    UnsupportedExtension,
    /// Tabular file matching neither pattern
    Unrecognized,
}

/// Classifies files by extension and path pattern
#[derive(Debug, Clone)]
pub struct FileClassifier {
    primary: Regex,
    secondary: Regex,
    extensions: Vec<String>,
}

impl FileClassifier {
    /// Compile the two series patterns. Extensions are given without the dot.
    pub fn new(
        primary_pattern: &str,
        secondary_pattern: &str,
        extensions: Vec<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            primary: Regex::new(primary_pattern)?,
            secondary: Regex::new(secondary_pattern)?,
            extensions,
        })
    }

    /// Classify a file path. The primary pattern is tested first.
    pub fn classify(&self, path: &str) -> Classification {
        let supported = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|known| known == ext));

        if !supported {
            Classification::UnsupportedExtension
        } else if self.primary.is_match(path) {
            Classification::Series(SeriesRole::Primary)
        } else if self.secondary.is_match(path) {
            Classification::Series(SeriesRole::Secondary)
        } else {
            Classification::Unrecognized
        }
    }
}

/// Local cache paths, one per role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPaths {
    pub primary: PathBuf,
    pub secondary: PathBuf,
}

impl SeriesPaths {
    /// Cache path for `role`
    pub fn for_role(&self, role: SeriesRole) -> &Path {
        match role {
            SeriesRole::Primary => &self.primary,
            SeriesRole::Secondary => &self.secondary,
        }
    }
}

/// Holds the most recent table of each role.
///
/// Memory is authoritative; each stored table is also mirrored to its role's
/// cache path so a restarted process can pick up the last file of the other
/// role.
#[derive(Debug)]
pub struct PairingStore {
    paths: SeriesPaths,
    latest: Mutex<HashMap<SeriesRole, Arc<Table>>>,
}

impl PairingStore {
    /// Create an empty store
    pub fn new(paths: SeriesPaths) -> Self {
        Self {
            paths,
            latest: Mutex::new(HashMap::new()),
        }
    }

    /// Record `table` as the latest of `role` and return the latest of the
    /// other role, if any.
    pub fn store(
        &self,
        role: SeriesRole,
        table: Arc<Table>,
    ) -> Result<Option<Arc<Table>>, StoreError> {
        let mut latest = self.latest.lock();

        table.write_to_path(self.paths.for_role(role))?;
        latest.insert(role, table);

        let other = role.other();
        if let Some(paired) = latest.get(&other) {
            return Ok(Some(paired.clone()));
        }

        let other_path = self.paths.for_role(other);
        if !other_path.exists() {
            return Ok(None);
        }

        let paired = Arc::new(Table::from_path(other_path)?);
        tracing::debug!(role = %other, path = %other_path.display(), "Loaded cached series from disk");
        latest.insert(other, paired.clone());
        Ok(Some(paired))
    }

    /// Latest table of `role` held in memory
    pub fn latest(&self, role: SeriesRole) -> Option<Arc<Table>> {
        self.latest.lock().get(&role).cloned()
    }

    /// Roles currently held in memory
    pub fn cached_roles(&self) -> Vec<SeriesRole> {
        let latest = self.latest.lock();
        [SeriesRole::Primary, SeriesRole::Secondary]
            .into_iter()
            .filter(|r| latest.contains_key(r))
            .collect()
    }

    /// Configured cache paths
    pub fn paths(&self) -> &SeriesPaths {
        &self.paths
    }
}
