use std::fmt::Write;

use crate::core::competitor::Competitor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishStatus {
    Finished,
    #[serde(rename = "DNF")]
    Dnf,
}

impl std::fmt::Display for FinishStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FinishStatus::Finished => write!(f, "Finished"),
            FinishStatus::Dnf => write!(f, "DNF"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherLabel {
    Dry,
    Rainy,
}

impl WeatherLabel {
    /// Anything wetter than 0.1 counts as a rain race.
    pub fn from_weather(weather: f64) -> WeatherLabel {
        if weather > 0.1 {
            WeatherLabel::Rainy
        } else {
            WeatherLabel::Dry
        }
    }
}

/// DriverResult is the snapshot of one competitor at the end of a race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverResult {
    pub position: u32,
    pub competitor_id: String,
    pub name: String,
    pub team: String,
    pub points: u32,
    pub total_time: f64,
    pub no_pitstops: u32,
    pub no_overtakes: u32,
    pub tyre_degr: u32,
    pub score: f64,
    pub status: FinishStatus,
}

impl DriverResult {
    pub fn snapshot(competitor: &Competitor, position: u32, points: u32, status: FinishStatus) -> DriverResult {
        DriverResult {
            position,
            competitor_id: competitor.id().to_owned(),
            name: competitor.name().to_owned(),
            team: competitor.team().to_owned(),
            points,
            total_time: competitor.racetime(),
            no_pitstops: competitor.no_pitstops(),
            no_overtakes: competitor.no_overtakes(),
            tyre_degr: competitor.tyre_degr() as u32,
            score: competitor.ranking_score(),
            status,
        }
    }
}

/// RaceResult contains the classification of one completed race. It is appended to the season
/// history and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub race_id: u32,
    pub track_name: String,
    pub weather: WeatherLabel,
    pub results: Vec<DriverResult>,
}

impl RaceResult {
    pub fn winner(&self) -> Option<&DriverResult> {
        self.results.first()
    }

    pub fn get(&self, competitor_id: &str) -> Option<&DriverResult> {
        self.results.iter().find(|res| res.competitor_id == competitor_id)
    }

    /// format_classification renders the race classification as a console table.
    pub fn format_classification(&self) -> anyhow::Result<String> {
        let mut out = String::new();
        writeln!(
            &mut out,
            "RESULT: Race {} [{}] - {:?}",
            self.race_id, self.track_name, self.weather
        )?;
        writeln!(
            &mut out,
            "{:>3}  {:<24} {:<16} {:>4} {:>11} {:>5} {:>4} {:>5} {:>8}  {}",
            "pos", "name", "team", "pts", "time", "pits", "ovt", "degr", "score", "status"
        )?;
        for res in self.results.iter() {
            writeln!(
                &mut out,
                "{:>3}  {:<24} {:<16} {:>4} {:>10.3}s {:>5} {:>4} {:>4}% {:>8.2}  {}",
                res.position,
                res.name,
                res.team,
                res.points,
                res.total_time,
                res.no_pitstops,
                res.no_overtakes,
                res.tyre_degr,
                res.score,
                res.status
            )?;
        }
        Ok(out)
    }

    /// print_classification prints the race classification to the console output.
    pub fn print_classification(&self) -> anyhow::Result<()> {
        print!("{}", self.format_classification()?);
        Ok(())
    }
}
