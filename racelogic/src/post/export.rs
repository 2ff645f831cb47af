use crate::core::competitor::Competitor;
use crate::core::season::SeasonManager;
use crate::post::race_result::{FinishStatus, RaceResult, WeatherLabel};
use anyhow::Context;
use helpers::general::finite_or_zero;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedResult {
    pub position: u32,
    pub name: String,
    pub team: String,
    pub points: u32,
    pub time: f64,
    pub overtakes: u32,
    pub tyre_degradation: u32,
    pub pits: u32,
    pub status: FinishStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedRace {
    pub race_id: u32,
    pub track_name: String,
    pub weather: WeatherLabel,
    pub results: Vec<ExportedResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsRow {
    pub rank: u32,
    pub name: String,
    pub team: String,
    pub points: u32,
    pub total_time: f64,
}

/// SeasonExport is the document consumed by the results dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonExport {
    pub races: Vec<ExportedRace>,
    pub standings: Vec<StandingsRow>,
}

impl From<&RaceResult> for ExportedRace {
    fn from(race: &RaceResult) -> Self {
        ExportedRace {
            race_id: race.race_id,
            track_name: race.track_name.to_owned(),
            weather: race.weather,
            results: race
                .results
                .iter()
                .map(|res| ExportedResult {
                    position: res.position,
                    name: res.name.to_owned(),
                    team: res.team.to_owned(),
                    points: res.points,
                    time: finite_or_zero(res.total_time),
                    overtakes: res.no_overtakes,
                    tyre_degradation: res.tyre_degr,
                    pits: res.no_pitstops,
                    status: res.status,
                })
                .collect(),
        }
    }
}

fn standings_rows(standings: &[&Competitor]) -> Vec<StandingsRow> {
    standings
        .iter()
        .enumerate()
        .map(|(i, c)| StandingsRow {
            rank: i as u32 + 1,
            name: c.name().to_owned(),
            team: c.team().to_owned(),
            points: c.season_points(),
            total_time: finite_or_zero(c.season_time()),
        })
        .collect()
}

impl SeasonExport {
    pub fn new(manager: &SeasonManager) -> SeasonExport {
        SeasonExport {
            races: manager.history().iter().map(ExportedRace::from).collect(),
            standings: standings_rows(&manager.season_standings()),
        }
    }

    /// to_string_for renders the export as plain JSON, or as a script assigning
    /// `window.raceData` if the target is a `.js` file.
    pub fn to_string_for(&self, filepath: &Path) -> anyhow::Result<String> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize season export!")?;
        let is_script = filepath
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("js"))
            .unwrap_or(false);

        if is_script {
            Ok(format!("window.raceData = {};\n", json))
        } else {
            Ok(json)
        }
    }
}

/// Write the season export to a JSON (or dashboard `.js`) file.
pub fn write_export(export: &SeasonExport, filepath: &Path) -> anyhow::Result<()> {
    let content = export.to_string_for(filepath)?;

    if let Some(parent) = filepath.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create output directory {}!", parent.display()))?;
        }
    }

    let mut fh = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(filepath)
        .context(format!("Failed to open export file {}!", filepath.display()))?;
    fh.write_all(content.as_bytes())
        .context(format!("Failed to write export file {}!", filepath.display()))?;

    tracing::info!(path = %filepath.display(), races = export.races.len(), "Season exported");
    Ok(())
}

/// format_standings renders the season standings as console lines.
pub fn format_standings(standings: &[&Competitor]) -> anyhow::Result<String> {
    let mut out = String::new();
    for row in standings_rows(standings) {
        writeln!(
            &mut out,
            "{:>2}. {} [{}] - {} PTS [Total Time: {:.2}s]",
            row.rank, row.name, row.team, row.points, row.total_time
        )?;
    }
    Ok(out)
}
