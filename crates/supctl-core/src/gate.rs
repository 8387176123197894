//! Emission gate
//!
//! One track per limit kind, each `Idle` until its first control request is
//! emitted and `Fired` afterwards. Check-and-fire happens under a single lock
//! so concurrent scans can never emit twice for the same kind.

use crate::scanner::ScanOutcome;
use crate::threshold::LimitKind;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// State of one gate track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateState {
    #[default]
    Idle,
    Fired,
}

/// When a fired track is re-armed automatically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateResetPolicy {
    /// Stay fired until restart or operator reset
    #[default]
    Never,
    /// Re-arm after a scan that evaluated the kind and found it clear
    OnClear,
}

/// Snapshot of both tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GateSnapshot {
    pub upper: GateState,
    pub lower: GateState,
}

impl GateSnapshot {
    fn get_mut(&mut self, kind: LimitKind) -> &mut GateState {
        match kind {
            LimitKind::Upper => &mut self.upper,
            LimitKind::Lower => &mut self.lower,
        }
    }

    /// State of the track for `kind`
    pub fn get(&self, kind: LimitKind) -> GateState {
        match kind {
            LimitKind::Upper => self.upper,
            LimitKind::Lower => self.lower,
        }
    }
}

/// Process-wide one-shot gate
#[derive(Debug, Default)]
pub struct EmissionGate {
    tracks: Mutex<GateSnapshot>,
    policy: GateResetPolicy,
}

impl EmissionGate {
    /// Create a gate with both tracks idle
    pub fn new(policy: GateResetPolicy) -> Self {
        Self {
            tracks: Mutex::new(GateSnapshot::default()),
            policy,
        }
    }

    /// Run `effect` and fire the track, unless the track already fired.
    ///
    /// Returns `Ok(None)` when suppressed. The track only moves to `Fired`
    /// when `effect` succeeds; the lock is held for the whole call.
    pub fn fire_with<T, E>(
        &self,
        kind: LimitKind,
        effect: impl FnOnce() -> Result<T, E>,
    ) -> Result<Option<T>, E> {
        let mut tracks = self.tracks.lock();
        let state = tracks.get_mut(kind);
        if *state == GateState::Fired {
            return Ok(None);
        }

        let value = effect()?;
        *state = GateState::Fired;
        Ok(Some(value))
    }

    /// Apply the reset policy to a completed scan. Returns the re-armed kinds.
    pub fn observe(&self, outcome: &ScanOutcome) -> Vec<LimitKind> {
        if self.policy == GateResetPolicy::Never {
            return Vec::new();
        }

        let mut tracks = self.tracks.lock();
        let mut rearmed = Vec::new();

        for kind in LimitKind::ALL {
            let evaluated = match kind {
                LimitKind::Upper => true,
                LimitKind::Lower => outcome.lower_evaluated(),
            };
            let state = tracks.get_mut(kind);
            if evaluated && !outcome.met(kind) && *state == GateState::Fired {
                *state = GateState::Idle;
                rearmed.push(kind);
            }
        }

        for kind in &rearmed {
            tracing::info!(kind = %kind, "Limit cleared, gate re-armed");
        }
        rearmed
    }

    /// Re-arm one track. Returns the previous state.
    pub fn reset(&self, kind: LimitKind) -> GateState {
        let mut tracks = self.tracks.lock();
        std::mem::take(tracks.get_mut(kind))
    }

    /// Current state of both tracks
    pub fn snapshot(&self) -> GateSnapshot {
        *self.tracks.lock()
    }

    /// State of one track
    pub fn state(&self, kind: LimitKind) -> GateState {
        self.tracks.lock().get(kind)
    }

    /// Configured reset policy
    pub fn policy(&self) -> GateResetPolicy {
        self.policy
    }
}
