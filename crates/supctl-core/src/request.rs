//! Control request records

use crate::scanner::Violation;
use crate::threshold::LimitKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Creation user stamped on every control request
pub const CREATION_USER: &str = "SUPERVISORY_CONTROL_ADAPTER";

/// Control request submitted to the platform and written to the shared mount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlRequest {
    /// "upper limit" or "lower limit"
    pub name: String,
    /// Human-readable corrective instruction
    pub instruction: String,
    pub threshold: f64,
    /// Sensor (column) that violated the limit
    pub primary_text: String,
    pub value: f64,
    /// Event time rendered as text
    pub event_date: String,
    pub creation_user: String,
    pub creation_date: DateTime<Utc>,
    /// Name of the file the violation was found in
    pub file_name: String,
}

impl ControlRequest {
    /// Build a request for `violation` against `threshold`
    pub fn new(violation: &Violation, threshold: f64, adjustment: &str, file_name: &str) -> Self {
        Self {
            name: violation.kind.request_name().to_string(),
            instruction: instruction(violation.kind, threshold, adjustment),
            threshold,
            primary_text: violation.sensor.clone(),
            value: violation.value,
            event_date: format_number(violation.event_time),
            creation_user: CREATION_USER.to_string(),
            creation_date: Utc::now(),
            file_name: file_name.to_string(),
        }
    }

    /// File name of the shared-mount report for this request
    pub fn report_file_name(&self) -> String {
        format!("Supervisory_Control_{}.json", self.event_date)
    }
}

/// Instruction text for a control request. The limit is written the way it
/// is configured, so `100` stays `100`.
pub fn instruction(kind: LimitKind, threshold: f64, adjustment: &str) -> String {
    match kind {
        LimitKind::Upper => {
            format!("Upper limit {threshold} threshold exceeded. Lower power to {adjustment} C.")
        }
        LimitKind::Lower => {
            format!("Lower limit {threshold} threshold exceeded. Raise power to {adjustment} C.")
        }
    }
}

/// Render a number the way the downstream consumer expects: whole numbers
/// keep one decimal place (`3.0`), magnitudes of 1e16 and above or below
/// 1e-4 use exponent form (`1e+16`), and non-finite values are `nan`,
/// `inf` and `-inf`.
pub fn format_number(t: f64) -> String {
    if t.is_nan() {
        return "nan".to_string();
    }
    if t.is_infinite() {
        return if t > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{t:e}");
    if let Some((mantissa, exp)) = scientific
        .split_once('e')
        .and_then(|(m, e)| Some((m, e.parse::<i32>().ok()?)))
    {
        if t != 0.0 && !(-4..16).contains(&exp) {
            let sign = if exp < 0 { '-' } else { '+' };
            return format!("{mantissa}e{sign}{:02}", exp.unsigned_abs());
        }
    }

    let plain = t.to_string();
    if plain.contains('.') {
        plain
    } else {
        format!("{plain}.0")
    }
}
