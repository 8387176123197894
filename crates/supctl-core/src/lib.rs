//! Supervisory control decision core
//!
//! This crate holds the event-to-decision pipeline of the supervisory control
//! adapter:
//! - threshold evaluation of numeric columns
//! - file classification and latest-file-per-role pairing
//! - violation scanning with first-occurrence extraction
//! - the one-shot emission gate and control request emitter
//!
//! Transport concerns (HTTP intake, platform API) live in the daemon and
//! platform crates.

#![deny(unsafe_code)]

pub mod emitter;
pub mod error;
pub mod gate;
pub mod pairing;
pub mod request;
pub mod scanner;
pub mod selection;
pub mod table;
pub mod threshold;

pub use emitter::{
    Artifact, ControlRequestEmitter, ControlRequestSink, ControlSettings, Emission, FiredRequest,
    SinkReceipt,
};
pub use error::{EmitError, ScanError, SinkError, StoreError, TableError};
pub use gate::{EmissionGate, GateResetPolicy, GateSnapshot, GateState};
pub use pairing::{Classification, FileClassifier, PairingStore, SeriesPaths, SeriesRole};
pub use request::{ControlRequest, CREATION_USER};
pub use scanner::{scan, Limits, ScanOutcome, Violation};
pub use selection::ColumnSelection;
pub use table::{Column, Table};
pub use threshold::{exceeds_lower, exceeds_upper, LimitKind};
