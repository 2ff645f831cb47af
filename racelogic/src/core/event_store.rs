use crate::core::tireset::Compound;
use std::collections::{BTreeMap, HashMap};

/// Per-competitor lap event as consumed by the season manager. Race-wide events (weather,
/// track name) never end up here, they are kept in their own tables.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// (s) Completed lap time
    Lap(f64),
    /// (s) Standstill time, non-positive values fall back to the base pit time
    Pit(f64),
    /// Observed running position (1 = leader)
    Position(u32),
    Overtake,
    Compound(Compound),
}

impl Event {
    pub fn is_pit(&self) -> bool {
        matches!(self, Event::Pit(_))
    }
}

pub type LapEvents = BTreeMap<String, Vec<Event>>;

/// EventStore maps race id -> lap -> competitor id -> events in insertion order. Gaps in race or
/// lap numbers are allowed and mean "nothing happened". The pit index (race id -> competitor
/// id -> ascending PIT laps) is a projection of the stored events and is only rebuilt through
/// `analyze_pit_stops`.
#[derive(Debug, Default)]
pub struct EventStore {
    events: BTreeMap<u32, BTreeMap<u32, LapEvents>>,
    weathers: BTreeMap<u32, f64>,
    track_names: BTreeMap<u32, String>,
    pit_index: BTreeMap<u32, HashMap<String, Vec<u32>>>,
}

impl EventStore {
    pub fn new() -> EventStore {
        EventStore::default()
    }

    pub fn insert(&mut self, race_id: u32, lap: u32, competitor_id: &str, event: Event) {
        self.events
            .entry(race_id)
            .or_default()
            .entry(lap)
            .or_default()
            .entry(competitor_id.to_owned())
            .or_default()
            .push(event);
    }

    /// Last write wins. Values are kept in [0, 1], non-finite values are dropped.
    pub fn set_weather(&mut self, race_id: u32, weather: f64) {
        if !weather.is_finite() {
            tracing::warn!(race_id, weather, "Ignoring non-finite weather value");
            return;
        }
        self.weathers.insert(race_id, weather.clamp(0.0, 1.0));
    }

    /// Dry (0.0) if the feed never mentioned the race weather.
    pub fn weather(&self, race_id: u32) -> f64 {
        self.weathers.get(&race_id).copied().unwrap_or(0.0)
    }

    pub fn set_track_name(&mut self, race_id: u32, name: &str) {
        self.track_names.insert(race_id, name.to_owned());
    }

    pub fn track_name(&self, race_id: u32) -> Option<&str> {
        self.track_names.get(&race_id).map(|s| s.as_str())
    }

    /// Events of all competitors for a lap, `None` if the slot holds no data.
    pub fn lap_events(&self, race_id: u32, lap: u32) -> Option<&LapEvents> {
        self.events.get(&race_id)?.get(&lap)
    }

    pub fn competitor_events(&self, race_id: u32, lap: u32, competitor_id: &str) -> Option<&[Event]> {
        self.lap_events(race_id, lap)?
            .get(competitor_id)
            .map(|evs| evs.as_slice())
    }

    pub fn has_lap(&self, race_id: u32, lap: u32) -> bool {
        self.lap_events(race_id, lap).is_some()
    }

    pub fn race_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.events.keys().copied()
    }

    /// Highest lap with recorded data for the race.
    pub fn last_lap(&self, race_id: u32) -> Option<u32> {
        self.events.get(&race_id)?.keys().next_back().copied()
    }

    pub fn no_events(&self) -> usize {
        self.events
            .values()
            .flat_map(|laps| laps.values())
            .flat_map(|comps| comps.values())
            .map(|evs| evs.len())
            .sum()
    }

    // ---------------------------------------------------------------------------------------------
    // PIT INDEX -----------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// analyze_pit_stops rebuilds the pit index from scratch. Running it again on unchanged data
    /// yields the identical index.
    pub fn analyze_pit_stops(&mut self) {
        let mut pit_index: BTreeMap<u32, HashMap<String, Vec<u32>>> = BTreeMap::new();

        for (&race_id, laps) in self.events.iter() {
            for (&lap, comps) in laps.iter() {
                for (competitor_id, evs) in comps.iter() {
                    for _ in evs.iter().filter(|ev| ev.is_pit()) {
                        pit_index
                            .entry(race_id)
                            .or_default()
                            .entry(competitor_id.to_owned())
                            .or_default()
                            .push(lap);
                    }
                }
            }
        }

        self.pit_index = pit_index;
    }

    pub fn pit_laps(&self, race_id: u32, competitor_id: &str) -> &[u32] {
        self.pit_index
            .get(&race_id)
            .and_then(|comps| comps.get(competitor_id))
            .map(|laps| laps.as_slice())
            .unwrap_or(&[])
    }

    /// First pit lap strictly after `lap`, `None` if the competitor does not stop again.
    pub fn next_pit_lap(&self, race_id: u32, competitor_id: &str, lap: u32) -> Option<u32> {
        self.pit_laps(race_id, competitor_id)
            .iter()
            .copied()
            .find(|&pit_lap| pit_lap > lap)
    }
}
