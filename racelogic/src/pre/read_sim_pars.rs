use crate::core::track::IdealTimePars;
use anyhow::Context;
use serde::Deserialize;
use std::fs::OpenOptions;
use std::path::Path;

/// * `race_laps` - Race distance, used as next pit lap if a competitor does not stop again
/// * `missed_lap_time` - (s) Penalty lap time for a participant without events on a lap
/// * `default_lap_time` - (s) Reference lap time if no ideal time can be resolved
/// * `simulate_missing_laps` - Create a synthetic lap if a competitor has events but no lap time
/// * `dnf_missed_laps` - A participant is classified DNF after more consecutive missed laps
/// * `track_difficulty` - Overtaking difficulty if the track does not define one
/// * `ideal_time` - Ideal time strategy (segment graph or lookup table)
/// * `calendar` - Default track names per race (race 1 = first entry)
/// * `seed` - (Optional) seed for the synthetic lap times
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimConstants {
    pub race_laps: u32,
    pub missed_lap_time: f64,
    pub default_lap_time: f64,
    pub simulate_missing_laps: bool,
    pub dnf_missed_laps: u32,
    pub track_difficulty: f64,
    pub ideal_time: IdealTimePars,
    pub calendar: Vec<String>,
    pub seed: Option<u64>,
}

impl Default for SimConstants {
    fn default() -> Self {
        SimConstants {
            race_laps: 60,
            missed_lap_time: 120.0,
            default_lap_time: 90.0,
            simulate_missing_laps: true,
            dnf_missed_laps: 3,
            track_difficulty: 0.5,
            ideal_time: IdealTimePars::default(),
            calendar: [
                "Bahrain",
                "Saudi Arabia",
                "Australia",
                "Japan",
                "China",
                "Miami",
                "Imola",
                "Monaco",
                "Canada",
                "Spain",
            ]
            .iter()
            .map(|name| name.to_string())
            .collect(),
            seed: None,
        }
    }
}

impl SimConstants {
    /// Calendar name of a race slot (race ids start at 1).
    pub fn calendar_name(&self, race_id: u32) -> Option<&str> {
        let idx = race_id.checked_sub(1)? as usize;
        self.calendar.get(idx).map(|s| s.as_str())
    }
}

/// Read simulation constants (scoring/degradation parameters) from a JSON file.
pub fn read_sim_constants(filepath: &Path) -> anyhow::Result<SimConstants> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open simulation constants file {}!",
            filepath.display()
        ))?;

    let pars = serde_json::from_reader(&fh).context(format!(
        "Failed to parse simulation constants file {}!",
        filepath.display()
    ))?;
    Ok(pars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::track::TrackGraphPars;

    #[test]
    fn partial_file_keeps_defaults() {
        let consts: SimConstants =
            serde_json::from_str(r#"{"race_laps": 44, "seed": 3, "calendar": ["Spa"]}"#).unwrap();
        assert_eq!(consts.race_laps, 44);
        assert_eq!(consts.seed, Some(3));
        assert_eq!(consts.missed_lap_time, 120.0);
        assert_eq!(consts.dnf_missed_laps, 3);
        assert_eq!(consts.ideal_time, IdealTimePars::Graph(TrackGraphPars::default()));
        assert_eq!(consts.calendar_name(1), Some("Spa"));
        assert_eq!(consts.calendar_name(2), None);
        assert_eq!(consts.calendar_name(0), None);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = read_sim_constants(Path::new("does/not/exist.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to open simulation constants file"));
    }
}
