use crate::core::tireset::Compound;
use serde::Deserialize;

/// * `id` - Competitor id as used by the event feed, e.g. VER
/// * `name` - Display name, e.g. Max Verstappen
/// * `team` - Team name
/// * `base_speed` - Normalised base speed rating
/// * `base_pit_time` - (s) Standstill time used when a PIT event carries no duration
/// * `consistency` - [0, 1] lap-to-lap consistency (1 = no variance)
/// * `wet_skill` - [0, 1] wet weather skill
#[derive(Debug, Deserialize, Clone)]
pub struct CompetitorPars {
    pub id: String,
    pub name: String,
    pub team: String,
    #[serde(default = "default_base_speed")]
    pub base_speed: f64,
    #[serde(default = "default_base_pit_time")]
    pub base_pit_time: f64,
    #[serde(default = "default_consistency")]
    pub consistency: f64,
    #[serde(default = "default_wet_skill")]
    pub wet_skill: f64,
}

pub fn default_base_speed() -> f64 {
    0.5
}

pub fn default_base_pit_time() -> f64 {
    20.0
}

pub fn default_consistency() -> f64 {
    0.8
}

pub fn default_wet_skill() -> f64 {
    0.5
}

impl CompetitorPars {
    pub fn new(id: &str, name: &str, team: &str) -> CompetitorPars {
        CompetitorPars {
            id: id.to_owned(),
            name: name.to_owned(),
            team: team.to_owned(),
            base_speed: default_base_speed(),
            base_pit_time: default_base_pit_time(),
            consistency: default_consistency(),
            wet_skill: default_wet_skill(),
        }
    }
}

/// Per-race state. Reset wholesale at the start and end of every race.
#[derive(Debug, Clone, Default)]
struct RaceState {
    cur_laptime: f64,
    last_laptime: f64,
    racetime: f64,
    tyre_age: u32,
    tyre_degr: f64,
    compound: Compound,
    stint_start_lap: u32,
    no_pitstops: u32,
    no_overtakes: u32,
    ranking_score: f64,
    missed_laps: u32,
    participated: bool,
}

/// Competitor holds identity, static attributes and the mutable race and season state of one
/// entrant. State is only changed through the methods below so that degradation and score
/// computations always see a consistent record.
#[derive(Debug, Clone)]
pub struct Competitor {
    id: String,
    name: String,
    team: String,
    base_speed: f64,
    consistency: f64,
    wet_skill: f64,
    base_pit_time: f64,
    race: RaceState,
    season_points: u32,
    season_time: f64,
}

impl Competitor {
    pub fn new(pars: &CompetitorPars) -> Competitor {
        Competitor {
            id: pars.id.to_owned(),
            name: pars.name.to_owned(),
            team: pars.team.to_owned(),
            base_speed: pars.base_speed,
            consistency: pars.consistency.clamp(0.0, 1.0),
            wet_skill: pars.wet_skill.clamp(0.0, 1.0),
            base_pit_time: pars.base_pit_time,
            race: RaceState::default(),
            season_points: 0,
            season_time: 0.0,
        }
    }

    // ---------------------------------------------------------------------------------------------
    // GETTERS -------------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn base_speed(&self) -> f64 {
        self.base_speed
    }

    pub fn consistency(&self) -> f64 {
        self.consistency
    }

    pub fn wet_skill(&self) -> f64 {
        self.wet_skill
    }

    pub fn base_pit_time(&self) -> f64 {
        self.base_pit_time
    }

    pub fn cur_laptime(&self) -> f64 {
        self.race.cur_laptime
    }

    pub fn last_laptime(&self) -> f64 {
        self.race.last_laptime
    }

    pub fn racetime(&self) -> f64 {
        self.race.racetime
    }

    pub fn tyre_age(&self) -> u32 {
        self.race.tyre_age
    }

    pub fn tyre_degr(&self) -> f64 {
        self.race.tyre_degr
    }

    pub fn compound(&self) -> Compound {
        self.race.compound
    }

    pub fn stint_start_lap(&self) -> u32 {
        self.race.stint_start_lap
    }

    pub fn no_pitstops(&self) -> u32 {
        self.race.no_pitstops
    }

    pub fn no_overtakes(&self) -> u32 {
        self.race.no_overtakes
    }

    pub fn ranking_score(&self) -> f64 {
        self.race.ranking_score
    }

    pub fn missed_laps(&self) -> u32 {
        self.race.missed_laps
    }

    pub fn participated(&self) -> bool {
        self.race.participated
    }

    pub fn season_points(&self) -> u32 {
        self.season_points
    }

    pub fn season_time(&self) -> f64 {
        self.season_time
    }

    // ---------------------------------------------------------------------------------------------
    // RACE STATE ----------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// update_laptime stores a completed lap: the current lap time becomes the previous one, the
    /// race time grows and the tyres age by one lap.
    pub fn update_laptime(&mut self, laptime: f64) {
        self.race.last_laptime = self.race.cur_laptime;
        self.race.cur_laptime = laptime;
        self.race.racetime += laptime;
        self.race.tyre_age += 1;
        self.race.participated = true;
    }

    /// add_pit_time adds the standstill to the current lap and fits a fresh tyre set.
    pub fn add_pit_time(&mut self, t_pit: f64) {
        self.race.cur_laptime += t_pit;
        self.race.racetime += t_pit;
        self.race.no_pitstops += 1;
        self.race.tyre_age = 0;
        self.race.tyre_degr = 0.0;
        self.race.participated = true;
    }

    pub fn reset_stint(&mut self, lap: u32) {
        self.race.stint_start_lap = lap;
    }

    pub fn record_overtake(&mut self) {
        self.race.no_overtakes += 1;
    }

    pub fn set_compound(&mut self, compound: Compound) {
        self.race.compound = compound;
    }

    /// Caller computes the value, it is only clamped into [0, 100].
    pub fn set_tyre_degr(&mut self, tyre_degr: f64) {
        self.race.tyre_degr = tyre_degr.clamp(0.0, 100.0);
    }

    pub fn set_ranking_score(&mut self, score: f64) {
        self.race.ranking_score = score;
    }

    pub fn mark_participated(&mut self) {
        self.race.participated = true;
    }

    pub fn increment_missed_laps(&mut self) {
        self.race.missed_laps += 1;
    }

    pub fn reset_missed_laps(&mut self) {
        self.race.missed_laps = 0;
    }

    /// reset_race_state zeroes the race state, restores the default compound and clears the
    /// missed lap counter and the participation flag. Season state is kept.
    pub fn reset_race_state(&mut self) {
        self.race = RaceState::default();
    }

    // ---------------------------------------------------------------------------------------------
    // SEASON STATE --------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn add_season_points(&mut self, points: u32) {
        self.season_points += points;
    }

    pub fn add_season_time(&mut self, t: f64) {
        self.season_time += t;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn competitor() -> Competitor {
        Competitor::new(&CompetitorPars::new("VER", "Max Verstappen", "Red Bull"))
    }

    #[test]
    fn laps_shift_and_accumulate() {
        let mut c = competitor();
        assert!(!c.participated());

        c.update_laptime(91.0);
        c.update_laptime(90.5);

        assert_abs_diff_eq!(c.cur_laptime(), 90.5);
        assert_abs_diff_eq!(c.last_laptime(), 91.0);
        assert_abs_diff_eq!(c.racetime(), 181.5);
        assert_eq!(c.tyre_age(), 2);
        assert!(c.participated());
    }

    #[test]
    fn pit_stop_fits_fresh_tyres() {
        let mut c = competitor();
        c.update_laptime(90.0);
        c.set_tyre_degr(40.0);
        c.add_pit_time(21.5);

        assert_abs_diff_eq!(c.cur_laptime(), 111.5);
        assert_abs_diff_eq!(c.racetime(), 111.5);
        assert_eq!(c.tyre_age(), 0);
        assert_abs_diff_eq!(c.tyre_degr(), 0.0);
        assert_eq!(c.no_pitstops(), 1);
    }

    #[test]
    fn tyre_degr_is_kept_in_range() {
        let mut c = competitor();
        c.set_tyre_degr(140.0);
        assert_abs_diff_eq!(c.tyre_degr(), 100.0);
        c.set_tyre_degr(-3.0);
        assert_abs_diff_eq!(c.tyre_degr(), 0.0);
    }

    #[test]
    fn reset_keeps_season_state() {
        let mut c = competitor();
        c.update_laptime(90.0);
        c.set_compound(Compound::Hard);
        c.record_overtake();
        c.increment_missed_laps();
        c.set_ranking_score(101.0);
        c.add_season_points(25);
        c.add_season_time(5400.0);

        c.reset_race_state();

        assert_abs_diff_eq!(c.racetime(), 0.0);
        assert_eq!(c.compound(), Compound::Soft);
        assert_eq!(c.no_overtakes(), 0);
        assert_eq!(c.missed_laps(), 0);
        assert_abs_diff_eq!(c.ranking_score(), 0.0);
        assert!(!c.participated());
        assert_eq!(c.season_points(), 25);
        assert_abs_diff_eq!(c.season_time(), 5400.0);
    }
}
