use crate::core::competitor::{default_base_pit_time, default_consistency, default_wet_skill, CompetitorPars};
use crate::core::event_store::Event;
use crate::core::tireset::Compound;
use anyhow::Context;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::OpenOptions;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Reserved competitor id for race-wide rows (track name, weather).
pub const TRACK_ID: &str = "TRACK";
const BATCH_TAG: &str = "BATCH";

#[derive(Debug, Error, PartialEq)]
pub enum IngestError {
    #[error("expected at least {expected} fields, got {got}")]
    MissingField { expected: usize, got: usize },
    #[error("invalid {field} '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("unknown event kind '{0}'")]
    UnknownKind(String),
    #[error("empty competitor id")]
    EmptyId,
    #[error("event kind '{0}' is not allowed for the reserved id TRACK")]
    ReservedId(String),
}

/// One accepted row of the event feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedRecord {
    Event {
        race_id: u32,
        lap: u32,
        competitor_id: String,
        event: Event,
    },
    Weather {
        race_id: u32,
        weather: f64,
    },
    TrackName {
        race_id: u32,
        name: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub accepted: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct EventFeed {
    pub records: Vec<FeedRecord>,
    pub report: IngestReport,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub entries: Vec<CompetitorPars>,
    pub report: IngestReport,
}

fn csv_reader<R: Read>(rdr: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .comment(Some(b'#'))
        .from_reader(rdr)
}

fn line_no(record: &StringRecord) -> u64 {
    record.position().map(|pos| pos.line()).unwrap_or(0)
}

fn parse_num<T: std::str::FromStr>(value: &str, field: &'static str) -> Result<T, IngestError> {
    value.parse::<T>().map_err(|_| IngestError::InvalidNumber {
        field,
        value: value.to_owned(),
    })
}

fn require(record: &StringRecord, expected: usize) -> Result<(), IngestError> {
    if record.len() < expected {
        return Err(IngestError::MissingField {
            expected,
            got: record.len(),
        });
    }
    Ok(())
}

// -------------------------------------------------------------------------------------------------
// ROSTER ------------------------------------------------------------------------------------------
// -------------------------------------------------------------------------------------------------

/// Row layout: `id,name,team,base_speed[,base_pit_time[,consistency[,wet_skill]]]`
pub fn parse_roster_record(record: &StringRecord) -> Result<CompetitorPars, IngestError> {
    require(record, 4)?;

    let id = &record[0];
    if id.is_empty() {
        return Err(IngestError::EmptyId);
    }

    let optional = |idx: usize, field: &'static str, default: f64| -> Result<f64, IngestError> {
        match record.get(idx) {
            Some(value) if !value.is_empty() => parse_num(value, field),
            _ => Ok(default),
        }
    };

    Ok(CompetitorPars {
        id: id.to_owned(),
        name: record[1].to_owned(),
        team: record[2].to_owned(),
        base_speed: parse_num(&record[3], "base speed")?,
        base_pit_time: optional(4, "base pit time", default_base_pit_time())?,
        consistency: optional(5, "consistency", default_consistency())?,
        wet_skill: optional(6, "wet skill", default_wet_skill())?,
    })
}

/// parse_roster reads all roster rows. Malformed rows are skipped with a warning.
pub fn parse_roster<R: Read>(rdr: R) -> Roster {
    let mut roster = Roster::default();

    for result in csv_reader(rdr).records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable roster row");
                roster.report.skipped += 1;
                continue;
            }
        };

        match parse_roster_record(&record) {
            Ok(pars) => {
                roster.entries.push(pars);
                roster.report.accepted += 1;
            }
            Err(e) => {
                tracing::warn!(line = line_no(&record), error = %e, "Skipping malformed roster row");
                roster.report.skipped += 1;
            }
        }
    }

    roster
}

pub fn read_roster(filepath: &Path) -> anyhow::Result<Roster> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!("Failed to open roster file {}!", filepath.display()))?;
    let roster = parse_roster(fh);
    tracing::info!(
        accepted = roster.report.accepted,
        skipped = roster.report.skipped,
        "Roster loaded from {}",
        filepath.display()
    );
    Ok(roster)
}

// -------------------------------------------------------------------------------------------------
// EVENTS ------------------------------------------------------------------------------------------
// -------------------------------------------------------------------------------------------------

/// Row layout: `race_id,lap,competitor_id,KIND,value`
///
/// * `LAP`, `PIT` - value in seconds
/// * `POS` / `POSITION` - running position (>= 1)
/// * `OVERTAKE` - value ignored
/// * `COMPOUND` - value is the compound label
/// * `WEATHER` - race weather in [0, 1], competitor id ignored
/// * `NAME` / `TRACK-NAME` - track name, only for the reserved id `TRACK`
pub fn parse_event_record(record: &StringRecord) -> Result<FeedRecord, IngestError> {
    require(record, 5)?;

    let race_id: u32 = parse_num(&record[0], "race id")?;
    let lap: u32 = parse_num(&record[1], "lap")?;
    let competitor_id = &record[2];
    let kind = record[3].to_uppercase();
    let value = &record[4];

    if competitor_id.is_empty() {
        return Err(IngestError::EmptyId);
    }

    if kind == "WEATHER" {
        let weather: f64 = parse_num(value, "weather")?;
        if !weather.is_finite() {
            return Err(IngestError::InvalidNumber {
                field: "weather",
                value: value.to_owned(),
            });
        }
        if !(0.0..=1.0).contains(&weather) {
            tracing::warn!(race_id, weather, "Weather outside [0, 1] is clamped");
        }
        return Ok(FeedRecord::Weather { race_id, weather });
    }

    if competitor_id == TRACK_ID {
        return match kind.as_str() {
            "NAME" | "TRACK-NAME" | "TRACK_NAME" => Ok(FeedRecord::TrackName {
                race_id,
                name: value.to_owned(),
            }),
            _ => Err(IngestError::ReservedId(kind)),
        };
    }

    let event = match kind.as_str() {
        "LAP" => Event::Lap(parse_num(value, "lap time")?),
        "PIT" => Event::Pit(parse_num(value, "pit time")?),
        "POS" | "POSITION" => {
            let pos: f64 = parse_num(value, "position")?;
            if pos < 1.0 || pos.fract() != 0.0 {
                return Err(IngestError::InvalidNumber {
                    field: "position",
                    value: value.to_owned(),
                });
            }
            Event::Position(pos as u32)
        }
        "OVERTAKE" => Event::Overtake,
        "COMPOUND" => {
            let compound: Compound = value.parse().unwrap_or(Compound::Unknown);
            if compound == Compound::Unknown {
                tracing::warn!(race_id, lap, competitor_id, value, "Unknown tyre compound");
            }
            Event::Compound(compound)
        }
        _ => return Err(IngestError::UnknownKind(kind)),
    };

    Ok(FeedRecord::Event {
        race_id,
        lap,
        competitor_id: competitor_id.to_owned(),
        event,
    })
}

/// Row layout: `BATCH,race_id,lap,id:laptime,id:laptime,...`
///
/// Returns the accepted LAP records, broken pairs are skipped individually.
pub fn parse_batch_record(record: &StringRecord) -> Result<(Vec<FeedRecord>, usize), IngestError> {
    require(record, 4)?;

    let race_id: u32 = parse_num(&record[1], "race id")?;
    let lap: u32 = parse_num(&record[2], "lap")?;

    let mut records = Vec::with_capacity(record.len() - 3);
    let mut no_skipped = 0;

    for item in record.iter().skip(3) {
        let parsed = item
            .split_once(':')
            .filter(|(id, _)| !id.trim().is_empty())
            .and_then(|(id, t)| t.trim().parse::<f64>().ok().map(|t| (id.trim(), t)));

        match parsed {
            Some((competitor_id, laptime)) => records.push(FeedRecord::Event {
                race_id,
                lap,
                competitor_id: competitor_id.to_owned(),
                event: Event::Lap(laptime),
            }),
            None => {
                tracing::warn!(line = line_no(record), item, "Skipping malformed batch entry");
                no_skipped += 1;
            }
        }
    }

    Ok((records, no_skipped))
}

/// parse_events reads the whole event feed. Malformed rows are skipped with a warning, they
/// never abort the ingestion.
pub fn parse_events<R: Read>(rdr: R) -> EventFeed {
    let mut feed = EventFeed::default();

    for result in csv_reader(rdr).records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable event row");
                feed.report.skipped += 1;
                continue;
            }
        };

        if record.get(0).map(|tag| tag.eq_ignore_ascii_case(BATCH_TAG)) == Some(true) {
            match parse_batch_record(&record) {
                Ok((records, no_skipped)) => {
                    feed.report.accepted += records.len();
                    feed.report.skipped += no_skipped;
                    feed.records.extend(records);
                }
                Err(e) => {
                    tracing::warn!(line = line_no(&record), error = %e, "Skipping malformed batch row");
                    feed.report.skipped += 1;
                }
            }
            continue;
        }

        match parse_event_record(&record) {
            Ok(rec) => {
                feed.records.push(rec);
                feed.report.accepted += 1;
            }
            Err(e) => {
                tracing::warn!(line = line_no(&record), error = %e, "Skipping malformed event row");
                feed.report.skipped += 1;
            }
        }
    }

    feed
}

pub fn read_events(filepath: &Path) -> anyhow::Result<EventFeed> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!("Failed to open event file {}!", filepath.display()))?;
    let feed = parse_events(fh);
    tracing::info!(
        accepted = feed.report.accepted,
        skipped = feed.report.skipped,
        "Race events loaded from {}",
        filepath.display()
    );
    Ok(feed)
}
