//! Control request emission
//!
//! On the first violation of a kind the emitter, in order:
//! 1. writes the local instruction artifact and advances the sequence counter,
//! 2. fires the gate track,
//! 3. submits the control request through the sink,
//! 4. writes the control request report to the shared directory.
//!
//! Steps 1 and 2 run under the gate lock. A failed submission is logged and
//! does not roll the gate back.

use crate::error::{EmitError, SinkError};
use crate::gate::{EmissionGate, GateResetPolicy};
use crate::request::ControlRequest;
use crate::scanner::{Limits, ScanOutcome};
use crate::threshold::LimitKind;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Acknowledgement returned by a sink
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SinkReceipt {
    /// Platform-side reference of the submission, when one is returned
    pub reference: Option<String>,
}

/// Destination for control requests
#[async_trait]
pub trait ControlRequestSink: Send + Sync {
    /// Submit a batch of control requests
    async fn submit(&self, requests: &[ControlRequest]) -> Result<SinkReceipt, SinkError>;
}

/// Emitter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSettings {
    pub limits: Limits,
    /// Adjustment written into artifacts and instructions
    pub adjustment: String,
    /// Artifact base name, e.g. `control_request.txt`
    pub output_file: String,
    /// Directory for instruction artifacts
    pub mount_dir: PathBuf,
    /// Directory for control request reports
    pub report_dir: PathBuf,
    #[serde(default)]
    pub reset_policy: GateResetPolicy,
}

/// A written instruction artifact
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub path: PathBuf,
    pub sequence: u64,
}

/// Writes numbered instruction artifacts
#[derive(Debug)]
pub struct ArtifactWriter {
    dir: PathBuf,
    stem: String,
    extension: String,
    content: String,
    next: Mutex<u64>,
}

impl ArtifactWriter {
    /// Create a writer whose first artifact carries sequence 1
    pub fn new(dir: PathBuf, output_file: &str, content: String) -> Self {
        let base = Path::new(output_file);
        let stem = base
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = base
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        Self {
            dir,
            stem,
            extension,
            content,
            next: Mutex::new(1),
        }
    }

    /// Write the next artifact. The counter only advances on success.
    pub fn write(&self) -> Result<Artifact, EmitError> {
        let mut next = self.next.lock();
        let sequence = *next;
        let path = self
            .dir
            .join(format!("{}_{}{}", self.stem, sequence, self.extension));

        std::fs::write(&path, &self.content).map_err(|source| EmitError::Artifact {
            path: path.clone(),
            source,
        })?;

        *next += 1;
        Ok(Artifact { path, sequence })
    }

    /// Sequence number the next artifact will carry
    pub fn next_sequence(&self) -> u64 {
        *self.next.lock()
    }
}

/// Writes control request reports to the shared directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Write `requests` as a four-space indented JSON array
    pub fn write(&self, requests: &[ControlRequest]) -> Result<PathBuf, EmitError> {
        let file_name = requests
            .first()
            .map(ControlRequest::report_file_name)
            .unwrap_or_else(|| "Supervisory_Control.json".to_string());
        let path = self.dir.join(file_name);

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        requests.serialize(&mut serializer)?;

        std::fs::write(&path, buf).map_err(|source| EmitError::Report {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Control request that went out
#[derive(Debug, Clone)]
pub struct FiredRequest {
    pub kind: LimitKind,
    pub artifact: Artifact,
    pub report: PathBuf,
    pub request: ControlRequest,
    /// Whether the sink accepted the submission
    pub submitted: bool,
}

/// What the emitter did with a scan outcome
#[derive(Debug, Clone)]
pub enum Emission {
    /// No violation in the scan
    Nothing,
    /// Violation found but the track already fired
    Suppressed(LimitKind),
    /// A control request was emitted
    Fired(Box<FiredRequest>),
}

/// One-shot control request emitter
pub struct ControlRequestEmitter {
    gate: EmissionGate,
    artifacts: ArtifactWriter,
    reports: ReportWriter,
    sink: Arc<dyn ControlRequestSink>,
    limits: Limits,
    adjustment: String,
}

impl ControlRequestEmitter {
    /// Create an emitter with an idle gate
    pub fn new(settings: ControlSettings, sink: Arc<dyn ControlRequestSink>) -> Self {
        let ControlSettings {
            limits,
            adjustment,
            output_file,
            mount_dir,
            report_dir,
            reset_policy,
        } = settings;

        Self {
            gate: EmissionGate::new(reset_policy),
            artifacts: ArtifactWriter::new(mount_dir, &output_file, adjustment.clone()),
            reports: ReportWriter::new(report_dir),
            sink,
            limits,
            adjustment,
        }
    }

    /// Act on a scan outcome for `file_name`
    pub async fn emit(&self, outcome: &ScanOutcome, file_name: &str) -> Result<Emission, EmitError> {
        self.gate.observe(outcome);

        let Some(violation) = outcome.violation.as_ref() else {
            return Ok(Emission::Nothing);
        };
        let kind = violation.kind;

        let Some(artifact) = self.gate.fire_with(kind, || self.artifacts.write())? else {
            tracing::info!(kind = %kind, "Control request already sent, suppressing");
            return Ok(Emission::Suppressed(kind));
        };
        tracing::info!(
            kind = %kind,
            path = %artifact.path.display(),
            sequence = artifact.sequence,
            "Wrote control request artifact"
        );

        let request = ControlRequest::new(
            violation,
            self.limits.for_kind(kind),
            &self.adjustment,
            file_name,
        );
        let batch = std::slice::from_ref(&request);

        let submitted = match self.sink.submit(batch).await {
            Ok(receipt) => {
                tracing::info!(kind = %kind, reference = ?receipt.reference, "Submitted control request");
                true
            }
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "Control request submission failed");
                false
            }
        };

        let report = self.reports.write(batch)?;
        tracing::info!(kind = %kind, path = %report.display(), "Wrote control request report");

        Ok(Emission::Fired(Box::new(FiredRequest {
            kind,
            artifact,
            report,
            request,
            submitted,
        })))
    }

    /// Gate shared with operator endpoints
    pub fn gate(&self) -> &EmissionGate {
        &self.gate
    }

    /// Sequence number the next artifact will carry
    pub fn next_sequence(&self) -> u64 {
        self.artifacts.next_sequence()
    }
}
