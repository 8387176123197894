//! Event-to-decision pipeline
//!
//! One notified file runs through retrieval, classification, role caching,
//! the violation scan and control request emission, in that order.

use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult, PipelineError};
use std::sync::Arc;
use supctl_core::{
    scan, Classification, ColumnSelection, ControlRequestEmitter, Emission, FileClassifier,
    Limits, PairingStore, ScanOutcome, SeriesRole, Table,
};
use supctl_platform::{PlatformApi, PlatformSink};

/// What happened to a notified file
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// Extension is not an accepted tabular format
    UnsupportedExtension { path: String },

    /// Tabular file matching neither series pattern
    Unrecognized { path: String },

    /// File was cached and scanned
    Scanned {
        role: SeriesRole,
        /// Whether a file of the other role was available
        paired: bool,
        scan: ScanOutcome,
        emission: Emission,
    },
}

/// Shared pipeline state
pub struct Pipeline {
    platform: Arc<dyn PlatformApi>,
    classifier: FileClassifier,
    store: PairingStore,
    selection: ColumnSelection,
    limits: Limits,
    emitter: ControlRequestEmitter,
}

impl Pipeline {
    /// Assemble a pipeline whose control requests go to `platform`
    pub fn from_config(config: &DaemonConfig, platform: Arc<dyn PlatformApi>) -> DaemonResult<Self> {
        let classifier = config
            .classifier()
            .map_err(|e| DaemonError::Config(format!("invalid file pattern: {e}")))?;
        let sink = Arc::new(PlatformSink::new(platform.clone()));

        Ok(Self {
            platform,
            classifier,
            store: PairingStore::new(config.series_paths()),
            selection: config.columns.clone(),
            limits: config.limits,
            emitter: ControlRequestEmitter::new(config.control_settings(), sink),
        })
    }

    /// Process the file the platform notified about
    pub async fn process(&self, file_id: &str) -> Result<PipelineOutcome, PipelineError> {
        let file = self.platform.retrieve_file(file_id).await?;
        tracing::info!(
            file_id,
            path = %file.platform_path,
            local = %file.local_path.display(),
            "Retrieved file"
        );

        let role = match self.classifier.classify(&file.platform_path) {
            Classification::Series(role) => role,
            Classification::UnsupportedExtension => {
                tracing::info!(path = %file.platform_path, "File extension not accepted, ignoring");
                return Ok(PipelineOutcome::UnsupportedExtension {
                    path: file.platform_path,
                });
            }
            Classification::Unrecognized => {
                tracing::info!(path = %file.platform_path, "File matches no series pattern, ignoring");
                return Ok(PipelineOutcome::Unrecognized {
                    path: file.platform_path,
                });
            }
        };

        let table = Arc::new(Table::from_path(&file.local_path)?);
        let paired = self.store.store(role, table.clone())?;
        tracing::info!(
            role = %role,
            rows = table.row_count(),
            paired = paired.is_some(),
            "Cached series file"
        );

        let outcome = scan(&table, &self.selection, &self.limits)?;
        let emission = self.emitter.emit(&outcome, &file.file_name).await?;

        Ok(PipelineOutcome::Scanned {
            role,
            paired: paired.is_some(),
            scan: outcome,
            emission,
        })
    }

    /// Control request emitter, for gate inspection and reset
    pub fn emitter(&self) -> &ControlRequestEmitter {
        &self.emitter
    }

    /// Role caches
    pub fn store(&self) -> &PairingStore {
        &self.store
    }
}
