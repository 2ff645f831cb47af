use crate::core::competitor::{Competitor, CompetitorPars};
use crate::core::event_store::{Event, EventStore};
use crate::core::leaderboard::Leaderboard;
use crate::core::registry::{Handle, Registry};
use crate::core::scoring::{calc_score, simulate_laptime};
use crate::core::tireset::stint_degradation;
use crate::core::track::IdealTimeResolver;
use crate::post::race_result::{DriverResult, FinishStatus, RaceResult, WeatherLabel};
use crate::pre::ingest::{EventFeed, FeedRecord, Roster};
use crate::pre::read_sim_pars::SimConstants;
use helpers::general::{argsort, SortOrder};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

/// Points for positions 1 to 10, nothing beyond.
pub const POINTS_TABLE: [u32; 10] = [25, 18, 15, 12, 10, 8, 6, 4, 2, 1];
const UNKNOWN_TRACK: &str = "Unknown Track";

#[derive(Debug, Error, PartialEq)]
pub enum SeasonError {
    #[error("competitor {0} is already registered")]
    DuplicateCompetitor(String),
    #[error("race {0} is still in progress")]
    RaceInProgress(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RacePhase {
    NotStarted,
    InProgress(u32),
    Ended(u32),
}

/// SeasonManager owns the competitor registry, the leaderboard, the event store (incl. weather,
/// track names and pit index) and the season history. It drives the race lifecycle
/// `start_race -> process_race_lap* -> end_race` and is the only place where competitor
/// records are changed.
#[derive(Debug)]
pub struct SeasonManager {
    consts: SimConstants,
    registry: Registry,
    leaderboard: Leaderboard,
    store: EventStore,
    ideal_time: IdealTimeResolver,
    history: Vec<RaceResult>,
    phase: RacePhase,
    next_race_id: u32,
    rng: StdRng,
}

impl SeasonManager {
    pub fn new(consts: SimConstants) -> SeasonManager {
        let rng = match consts.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        SeasonManager {
            ideal_time: IdealTimeResolver::new(&consts.ideal_time),
            consts,
            registry: Registry::new(),
            leaderboard: Leaderboard::new(),
            store: EventStore::new(),
            history: Vec::new(),
            phase: RacePhase::NotStarted,
            next_race_id: 1,
            rng,
        }
    }

    // ---------------------------------------------------------------------------------------------
    // SETUP ---------------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// Adds a competitor to the registry and the leaderboard.
    pub fn register(&mut self, pars: &CompetitorPars) -> Result<Handle, SeasonError> {
        let handle = self
            .registry
            .add(pars)
            .ok_or_else(|| SeasonError::DuplicateCompetitor(pars.id.to_owned()))?;
        self.leaderboard.push(handle, self.registry.as_slice());
        Ok(handle)
    }

    /// Registers every roster entry, duplicates are skipped with a warning. Returns the number
    /// of new competitors.
    pub fn register_roster(&mut self, roster: &Roster) -> usize {
        let mut no_added = 0;
        for pars in roster.entries.iter() {
            match self.register(pars) {
                Ok(_) => no_added += 1,
                Err(e) => tracing::warn!(error = %e, "Skipping roster entry"),
            }
        }
        no_added
    }

    /// Stores a parsed feed and rebuilds the pit index afterwards.
    pub fn ingest(&mut self, feed: &EventFeed) {
        for record in feed.records.iter() {
            match record {
                FeedRecord::Event {
                    race_id,
                    lap,
                    competitor_id,
                    event,
                } => self.store.insert(*race_id, *lap, competitor_id, event.to_owned()),
                FeedRecord::Weather { race_id, weather } => self.store.set_weather(*race_id, *weather),
                FeedRecord::TrackName { race_id, name } => self.store.set_track_name(*race_id, name),
            }
        }
        self.analyze_pit_stops();
    }

    /// Stores a single event. The pit index is not touched, call `analyze_pit_stops` once all
    /// events are in.
    pub fn add_event(&mut self, race_id: u32, lap: u32, competitor_id: &str, event: Event) {
        self.store.insert(race_id, lap, competitor_id, event);
    }

    pub fn set_weather(&mut self, race_id: u32, weather: f64) {
        self.store.set_weather(race_id, weather);
    }

    pub fn set_track_name(&mut self, race_id: u32, name: &str) {
        self.store.set_track_name(race_id, name);
    }

    pub fn analyze_pit_stops(&mut self) {
        self.store.analyze_pit_stops();
        tracing::debug!("Pit strategies analyzed");
    }

    // ---------------------------------------------------------------------------------------------
    // RACE LIFECYCLE ------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// start_race puts every competitor of the lap 0 grid into the race.
    pub fn start_race(&mut self, race_id: u32) -> Result<(), SeasonError> {
        if let RacePhase::InProgress(cur_race_id) = self.phase {
            return Err(SeasonError::RaceInProgress(cur_race_id));
        }

        let mut no_grid = 0;
        if let Some(grid) = self.store.lap_events(race_id, 0) {
            for competitor_id in grid.keys() {
                if let Some(handle) = self.registry.handle(competitor_id) {
                    self.registry.get_mut(handle).mark_participated();
                    no_grid += 1;
                }
            }
        }

        self.phase = RacePhase::InProgress(race_id);
        tracing::info!(
            race_id,
            grid = no_grid,
            track = %self.track_name(race_id),
            "Race started"
        );
        Ok(())
    }

    /// process_race_lap applies the events of one lap to all competitors and rebuilds the
    /// leaderboard. Returns false (and does nothing) if the slot holds no data or another race is
    /// in progress.
    pub fn process_race_lap(&mut self, race_id: u32, lap: u32) -> bool {
        if !self.store.has_lap(race_id, lap) {
            return false;
        }
        match self.phase {
            RacePhase::InProgress(cur_race_id) if cur_race_id != race_id => {
                tracing::warn!(race_id, lap, cur_race_id, "Ignoring lap of a race that is not in progress");
                return false;
            }
            RacePhase::InProgress(_) => {}
            RacePhase::NotStarted | RacePhase::Ended(_) => self.phase = RacePhase::InProgress(race_id),
        }

        let weather = self.store.weather(race_id);
        let track_name = self.track_name(race_id);
        let ideal_laptime = self.ideal_laptime(&track_name, weather);
        let track_difficulty = self.track_difficulty(&track_name);

        let lap_events = match self.store.lap_events(race_id, lap) {
            Some(lap_events) => lap_events,
            None => return false,
        };
        let handles: Vec<Handle> = self.registry.handles().collect();

        for handle in handles {
            let competitor = self.registry.get_mut(handle);
            let mut processed_lap = false;
            let mut position_seen = false;

            match lap_events.get(competitor.id()) {
                Some(events) => {
                    for event in events.iter() {
                        match event {
                            Event::Lap(laptime) => {
                                competitor.update_laptime(*laptime);
                                processed_lap = true;
                            }
                            Event::Pit(t_pit) => {
                                let t_standstill = if *t_pit > 0.0 {
                                    *t_pit
                                } else {
                                    competitor.base_pit_time()
                                };
                                competitor.add_pit_time(t_standstill);
                                competitor.reset_stint(lap);
                            }
                            Event::Position(pos) => {
                                competitor.set_ranking_score(1000.0 - *pos as f64);
                                position_seen = true;
                            }
                            Event::Overtake => competitor.record_overtake(),
                            Event::Compound(compound) => competitor.set_compound(*compound),
                        }
                    }
                    competitor.mark_participated();
                    competitor.reset_missed_laps();

                    if !processed_lap && lap > 0 && self.consts.simulate_missing_laps {
                        let laptime = simulate_laptime(competitor, ideal_laptime, weather, &mut self.rng);
                        competitor.update_laptime(laptime);
                        processed_lap = true;
                    }
                }
                None if competitor.participated() => {
                    competitor.increment_missed_laps();
                    competitor.update_laptime(self.consts.missed_lap_time);

                    let score = if competitor.missed_laps() > self.consts.dnf_missed_laps {
                        0.0
                    } else {
                        calc_score(competitor, ideal_laptime, weather, track_difficulty)
                    };
                    competitor.set_ranking_score(score);
                }
                // not part of this race (yet)
                None => {}
            }

            if processed_lap {
                let next_pit_lap = self
                    .store
                    .next_pit_lap(race_id, competitor.id(), lap)
                    .unwrap_or(self.consts.race_laps);
                let tyre_degr = stint_degradation(lap, competitor.stint_start_lap(), next_pit_lap);
                competitor.set_tyre_degr(tyre_degr);

                if !position_seen {
                    let score = calc_score(competitor, ideal_laptime, weather, track_difficulty);
                    competitor.set_ranking_score(score);
                }
            }
        }

        self.leaderboard.rebuild(self.registry.as_slice());
        debug_assert_eq!(self.leaderboard.size(), self.registry.len());

        tracing::debug!(race_id, lap, weather, ideal_laptime, "Lap processed");
        true
    }

    /// end_race drains the leaderboard, classifies every participant, assigns points and stores
    /// the result in the season history. All race states are reset afterwards and the
    /// leaderboard is refilled for the next race.
    pub fn end_race(&mut self) -> &RaceResult {
        let race_id = match self.phase {
            RacePhase::InProgress(race_id) => race_id,
            _ => self.next_race_id,
        };

        let mut drained = Vec::with_capacity(self.leaderboard.size());
        while let Some(handle) = self.leaderboard.pop(self.registry.as_slice()) {
            drained.push(handle);
        }

        let registry = &mut self.registry;
        let (classified, absent): (Vec<Handle>, Vec<Handle>) = drained
            .iter()
            .copied()
            .partition(|&handle| registry.get(handle).participated());

        for handle in absent {
            registry.get_mut(handle).reset_race_state();
        }
        // nobody outside the drain may keep a stale race state either
        for handle in registry.handles().collect::<Vec<_>>() {
            if !registry.get(handle).participated() {
                registry.get_mut(handle).reset_race_state();
            }
        }

        let mut results = Vec::with_capacity(classified.len());
        for (i, handle) in classified.into_iter().enumerate() {
            let competitor = registry.get_mut(handle);
            let points = POINTS_TABLE.get(i).copied().unwrap_or(0);

            competitor.add_season_points(points);
            competitor.add_season_time(competitor.racetime());

            let status = if competitor.missed_laps() > self.consts.dnf_missed_laps {
                FinishStatus::Dnf
            } else {
                FinishStatus::Finished
            };
            results.push(DriverResult::snapshot(competitor, i as u32 + 1, points, status));
            competitor.reset_race_state();
        }

        for handle in drained {
            self.leaderboard.push(handle, self.registry.as_slice());
        }
        debug_assert_eq!(self.leaderboard.size(), self.registry.len());

        let weather = self.store.weather(race_id);
        let race_result = RaceResult {
            race_id,
            track_name: self.track_name(race_id),
            weather: WeatherLabel::from_weather(weather),
            results,
        };
        tracing::info!(
            race_id,
            track = %race_result.track_name,
            classified = race_result.results.len(),
            winner = race_result.winner().map(|res| res.name.as_str()).unwrap_or("-"),
            "Race ended"
        );

        self.history.push(race_result);
        self.phase = RacePhase::Ended(race_id);
        self.next_race_id = race_id + 1;

        &self.history[self.history.len() - 1]
    }

    // ---------------------------------------------------------------------------------------------
    // STANDINGS -----------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// All registered competitors by descending season points, ties keep registration order.
    pub fn season_standings(&self) -> Vec<&Competitor> {
        let points: Vec<u32> = self.registry.iter().map(|c| c.season_points()).collect();
        argsort(&points, SortOrder::Descending)
            .into_iter()
            .map(|idx| &self.registry.as_slice()[idx])
            .collect()
    }

    /// Current order of the leaderboard (descending ranking score).
    pub fn live_ranking(&self) -> Vec<&Competitor> {
        self.leaderboard
            .ranking(self.registry.as_slice())
            .into_iter()
            .map(|handle| self.registry.get(handle))
            .collect()
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HELPERS) ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// Track name of a race slot: feed override, then calendar, then "Unknown Track".
    pub fn track_name(&self, race_id: u32) -> String {
        self.store
            .track_name(race_id)
            .or_else(|| self.consts.calendar_name(race_id))
            .unwrap_or(UNKNOWN_TRACK)
            .to_owned()
    }

    /// Falls back to the default lap time if the resolver has no ideal time for the track.
    fn ideal_laptime(&self, track_name: &str, weather: f64) -> f64 {
        let ideal = self.ideal_time.ideal_time(track_name, weather);
        if ideal.as_seconds() < 0.0 {
            tracing::debug!(track = track_name, "No ideal time available, using default lap time");
        }
        ideal.or(self.consts.default_lap_time)
    }

    fn track_difficulty(&self, track_name: &str) -> f64 {
        self.ideal_time
            .difficulty(track_name)
            .unwrap_or(self.consts.track_difficulty)
    }

    pub fn consts(&self) -> &SimConstants {
        &self.consts
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn history(&self) -> &[RaceResult] {
        &self.history
    }

    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    pub fn next_race_id(&self) -> u32 {
        self.next_race_id
    }

    pub fn competitor(&self, id: &str) -> Option<&Competitor> {
        self.registry.by_id(id)
    }
}
