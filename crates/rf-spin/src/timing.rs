//! Reveal timing profiles
//!
//! Every offset is measured in milliseconds from the moment a spin is
//! accepted.

use serde::{Deserialize, Serialize};

use crate::error::{EngineResult, SpinError};

/// Timing profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimingProfile {
    /// Normal arcade pacing
    #[default]
    Normal,
    /// Fast mode
    Turbo,
    /// Hand-tuned or scaled values
    Custom,
}

/// Reveal timing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealTiming {
    /// Profile type
    pub profile: TimingProfile,

    /// Offset between consecutive columns starting to spin (ms)
    pub column_start_stagger_ms: u64,

    /// Time until the first column stops (ms)
    pub reel_stop_base_ms: u64,

    /// Delay between column stops (ms)
    pub reel_stop_interval_ms: u64,

    /// Delay between the last column stop and win evaluation (ms)
    pub settle_delay_ms: u64,
}

impl RevealTiming {
    /// Normal gameplay timing
    pub fn normal() -> Self {
        Self {
            profile: TimingProfile::Normal,
            column_start_stagger_ms: 100,
            reel_stop_base_ms: 800,
            reel_stop_interval_ms: 150,
            settle_delay_ms: 300,
        }
    }

    /// Turbo mode
    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            column_start_stagger_ms: 50,
            reel_stop_base_ms: 400,
            reel_stop_interval_ms: 75,
            settle_delay_ms: 150,
        }
    }

    /// Get timing for profile
    pub fn from_profile(profile: TimingProfile) -> Self {
        match profile {
            TimingProfile::Normal => Self::normal(),
            TimingProfile::Turbo => Self::turbo(),
            TimingProfile::Custom => Self::normal(),
        }
    }

    /// Scale timing by factor (< 1.0 = faster)
    ///
    /// The stop interval never drops below 1 ms so column order survives
    /// any factor.
    pub fn scaled(&self, factor: f64) -> Self {
        let scale = |ms: u64| (ms as f64 * factor.max(0.0)).round() as u64;
        Self {
            profile: TimingProfile::Custom,
            column_start_stagger_ms: scale(self.column_start_stagger_ms),
            reel_stop_base_ms: scale(self.reel_stop_base_ms).max(1),
            reel_stop_interval_ms: scale(self.reel_stop_interval_ms).max(1),
            settle_delay_ms: scale(self.settle_delay_ms),
        }
    }

    /// When `column` starts spinning
    pub fn column_start_at(&self, column: u8) -> u64 {
        (column as u64).saturating_mul(self.column_start_stagger_ms)
    }

    /// When `column` stops and reveals its cells
    pub fn column_stop_at(&self, column: u8) -> u64 {
        (column as u64)
            .saturating_mul(self.reel_stop_interval_ms)
            .saturating_add(self.reel_stop_base_ms)
    }

    /// When win evaluation runs for a grid with `columns` columns
    pub fn settle_at(&self, columns: u8) -> u64 {
        self.total_spin_duration(columns)
            .saturating_add(self.settle_delay_ms)
    }

    /// Time until every column has stopped
    pub fn total_spin_duration(&self, columns: u8) -> u64 {
        self.column_stop_at(columns.saturating_sub(1))
    }

    /// Check that stops are strictly ordered and every column spins before it stops
    pub fn validate(&self, columns: u8) -> EngineResult<()> {
        if self.reel_stop_interval_ms == 0 {
            return Err(SpinError::InvalidConfig(
                "reel_stop_interval_ms must be greater than zero".into(),
            ));
        }

        // the last column has the largest offsets
        let last = columns.saturating_sub(1) as u64;
        let last_start = last.checked_mul(self.column_start_stagger_ms);
        let settle = last
            .checked_mul(self.reel_stop_interval_ms)
            .and_then(|ms| ms.checked_add(self.reel_stop_base_ms))
            .and_then(|ms| ms.checked_add(self.settle_delay_ms));
        if last_start.is_none() || settle.is_none() {
            return Err(SpinError::InvalidConfig(
                "timing offsets overflow the millisecond range".into(),
            ));
        }

        for column in 0..columns {
            if self.column_start_at(column) >= self.column_stop_at(column) {
                return Err(SpinError::InvalidConfig(format!(
                    "column {} would stop at {}ms before it starts at {}ms",
                    column,
                    self.column_stop_at(column),
                    self.column_start_at(column)
                )));
            }
        }
        Ok(())
    }
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self::normal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_schedule() {
        let timing = RevealTiming::normal();
        assert_eq!(timing.column_start_at(0), 0);
        assert_eq!(timing.column_start_at(5), 500);
        assert_eq!(timing.column_stop_at(0), 800);
        assert_eq!(timing.column_stop_at(5), 1550);
        assert_eq!(timing.total_spin_duration(6), 1550);
        assert_eq!(timing.settle_at(6), 1850);
    }

    #[test]
    fn test_stops_strictly_increase() {
        for timing in [RevealTiming::normal(), RevealTiming::turbo()] {
            for col in 0..5u8 {
                assert!(timing.column_stop_at(col) < timing.column_stop_at(col + 1));
            }
        }
    }

    #[test]
    fn test_turbo_is_faster() {
        let normal = RevealTiming::normal();
        let turbo = RevealTiming::turbo();
        assert!(turbo.settle_at(6) < normal.settle_at(6));
        assert!(turbo.validate(6).is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let timing = RevealTiming {
            reel_stop_interval_ms: 0,
            ..RevealTiming::normal()
        };
        assert!(timing.validate(6).is_err());
    }

    #[test]
    fn test_start_after_stop_rejected() {
        let timing = RevealTiming {
            column_start_stagger_ms: 400,
            reel_stop_base_ms: 100,
            reel_stop_interval_ms: 50,
            ..RevealTiming::normal()
        };
        assert!(timing.validate(6).is_err());
        assert!(timing.validate(1).is_ok());
    }

    #[test]
    fn test_overflowing_offsets_rejected() {
        let huge_base = RevealTiming {
            reel_stop_base_ms: u64::MAX - 10,
            ..RevealTiming::normal()
        };
        assert!(matches!(
            huge_base.validate(6),
            Err(SpinError::InvalidConfig(_))
        ));

        let huge_interval = RevealTiming {
            reel_stop_interval_ms: u64::MAX / 2,
            ..RevealTiming::normal()
        };
        assert!(huge_interval.validate(6).is_err());

        let huge_settle = RevealTiming {
            settle_delay_ms: u64::MAX,
            ..RevealTiming::normal()
        };
        assert!(huge_settle.validate(6).is_err());

        // accessors saturate instead of panicking
        assert_eq!(huge_base.column_stop_at(5), u64::MAX);
        assert_eq!(huge_settle.settle_at(6), u64::MAX);
    }

    #[test]
    fn test_scaled_keeps_order() {
        let tiny = RevealTiming::normal().scaled(0.0);
        assert_eq!(tiny.profile, TimingProfile::Custom);
        assert_eq!(tiny.reel_stop_interval_ms, 1);
        assert!(tiny.validate(6).is_ok());

        let half = RevealTiming::normal().scaled(0.5);
        assert_eq!(half.reel_stop_base_ms, 400);
        assert_eq!(half.reel_stop_interval_ms, 75);
    }

    #[test]
    fn test_profile_json() {
        let json = serde_json::to_string(&TimingProfile::Turbo).unwrap();
        assert_eq!(json, "\"turbo\"");
        let timing: RevealTiming = serde_json::from_str(r#"{"settle_delay_ms": 10}"#).unwrap();
        assert_eq!(timing.settle_delay_ms, 10);
        assert_eq!(timing.reel_stop_base_ms, 800);
    }
}
