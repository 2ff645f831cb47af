use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Share of the stint (0..1) maps onto 0..STINT_DEGR_SCALE percent of wear.
const STINT_DEGR_SCALE: f64 = 80.0;
const MAX_DEGR: f64 = 100.0;

/// Tyre compounds as they appear in the event feed (case-insensitive).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compound {
    #[default]
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
    Unknown,
}

impl FromStr for Compound {
    type Err = std::convert::Infallible;

    /// Unknown labels map onto `Compound::Unknown`, which the scoring treats neutrally.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_uppercase().as_str() {
            "SOFT" | "S" => Compound::Soft,
            "MEDIUM" | "M" => Compound::Medium,
            "HARD" | "H" => Compound::Hard,
            "INTERMEDIATE" | "INTER" | "I" => Compound::Intermediate,
            "WET" | "W" => Compound::Wet,
            _ => Compound::Unknown,
        })
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            Compound::Soft => "Soft",
            Compound::Medium => "Medium",
            Compound::Hard => "Hard",
            Compound::Intermediate => "Intermediate",
            Compound::Wet => "Wet",
            Compound::Unknown => "Unknown",
        };
        write!(f, "{}", label)
    }
}

/// tyre_deg_factor returns the non-linear efficiency loss of a tyre set of the given age.
///
/// * `factor = 1 + (age / 30)^2 * weight`
///
/// The scoring uses a weight of 0.5, the synthetic lap time model a weight of 0.1.
pub fn tyre_deg_factor(tyre_age: u32, weight: f64) -> f64 {
    1.0 + (tyre_age as f64 / 30.0).powi(2) * weight
}

/// stint_degradation returns the wear percentage of the current stint.
///
/// The stint ends at `next_pit_lap` (next planned stop or race distance). The result is
/// `min(100, progress * 80)` with `progress = (lap - stint_start) / max(1, next_pit - stint_start)`.
pub fn stint_degradation(lap: u32, stint_start_lap: u32, next_pit_lap: u32) -> f64 {
    let laps_in_stint = (next_pit_lap as i64 - stint_start_lap as i64).max(1);
    let cur_stint_laps = lap as i64 - stint_start_lap as i64;

    let progress = cur_stint_laps as f64 / laps_in_stint as f64;
    (progress * STINT_DEGR_SCALE).clamp(0.0, MAX_DEGR)
}
