//! Violation scanner
//!
//! Runs the upper-limit check over the upper selection, then (only when no
//! upper violation was found) the lower-limit check over the lower selection.
//! Every violation is logged; the first one found, in column order then row
//! order, is kept as the representative violation of the scan.

use crate::error::{ScanError, ScanResult};
use crate::selection::ColumnSelection;
use crate::table::{Column, Table};
use crate::threshold::{coerce, evaluate_column, LimitKind};
use serde::{Deserialize, Serialize};

/// Numeric limits of the operating band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    pub upper: f64,
    pub lower: f64,
}

impl Limits {
    /// Limit for the given side
    pub fn for_kind(&self, kind: LimitKind) -> f64 {
        match kind {
            LimitKind::Upper => self.upper,
            LimitKind::Lower => self.lower,
        }
    }
}

/// A single threshold violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Column the violating value came from
    pub sensor: String,
    pub value: f64,
    /// Time column value on the violating row
    pub event_time: f64,
    pub kind: LimitKind,
}

/// Result of scanning one table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanOutcome {
    pub upper_met: bool,
    pub lower_met: bool,
    /// First violation found; present iff one of the met flags is set
    pub violation: Option<Violation>,
}

impl ScanOutcome {
    /// Whether the lower-limit pass ran
    pub fn lower_evaluated(&self) -> bool {
        !self.upper_met
    }

    /// Whether the scan found a violation of `kind`
    pub fn met(&self, kind: LimitKind) -> bool {
        match kind {
            LimitKind::Upper => self.upper_met,
            LimitKind::Lower => self.lower_met,
        }
    }
}

/// Scan a freshly received table for limit violations
pub fn scan(table: &Table, selection: &ColumnSelection, limits: &Limits) -> ScanResult<ScanOutcome> {
    let upper = selection.upper_columns(table);
    let lower = selection.lower_columns(table);
    let time = selection.time_column(table)?;

    let mut outcome = ScanOutcome::default();

    outcome.upper_met = scan_pass(
        &upper,
        time,
        limits.upper,
        LimitKind::Upper,
        &mut outcome.violation,
    )?;

    if !outcome.upper_met {
        outcome.lower_met = scan_pass(
            &lower,
            time,
            limits.lower,
            LimitKind::Lower,
            &mut outcome.violation,
        )?;
    }

    Ok(outcome)
}

/// One limit pass over a selection. Returns whether any violation was found,
/// filling `first` if it is still empty.
fn scan_pass(
    columns: &[&Column],
    time: &Column,
    limit: f64,
    kind: LimitKind,
    first: &mut Option<Violation>,
) -> ScanResult<bool> {
    let mut met = false;

    for column in columns {
        let signals = evaluate_column(&column.name, &column.values, limit, kind)?;

        for (row, value) in signals
            .into_iter()
            .enumerate()
            .filter_map(|(row, signal)| signal.map(|v| (row, v)))
        {
            met = true;
            let event_time = event_time(time, row)?;

            tracing::info!(
                sensor = %column.name,
                event_time,
                value,
                kind = %kind,
                limit,
                "Limit threshold exceeded"
            );

            if first.is_none() {
                *first = Some(Violation {
                    sensor: column.name.clone(),
                    value,
                    event_time,
                    kind,
                });
            }
        }
    }

    Ok(met)
}

fn event_time(time: &Column, row: usize) -> ScanResult<f64> {
    let raw = &time.values[row];
    coerce(raw).ok_or_else(|| ScanError::Coercion {
        column: time.name.clone(),
        row,
        raw: raw.clone(),
    })
}
