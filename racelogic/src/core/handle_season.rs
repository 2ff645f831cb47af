use crate::core::season::SeasonManager;
use crate::post::race_result::RaceResult;

/// handle_season simulates `no_races` consecutive races (starting at the manager's next race id)
/// lap by lap, and returns the results of the races simulated in this call for post-processing.
/// Every race runs laps `0..=no_laps`, laps without data are skipped.
pub fn handle_season(
    manager: &mut SeasonManager,
    no_races: u32,
    no_laps: u32,
    print_debug: bool,
) -> anyhow::Result<&[RaceResult]> {
    let no_results_before = manager.history().len();
    let first_race_id = manager.next_race_id();

    for race_id in first_race_id..first_race_id + no_races {
        manager.start_race(race_id)?;

        let mut no_laps_processed = 0;
        for lap in 0..=no_laps {
            if manager.process_race_lap(race_id, lap) {
                no_laps_processed += 1;
            }
            if print_debug && lap > 0 && lap % 10 == 0 {
                if let Some(leader) = manager.live_ranking().first() {
                    tracing::debug!(race_id, lap, leader = leader.id(), "Leaderboard update");
                }
            }
        }

        if no_laps_processed == 0 {
            tracing::warn!(race_id, "No event data found for race");
        }
        manager.end_race();
    }

    Ok(&manager.history()[no_results_before..])
}
