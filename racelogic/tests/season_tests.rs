use approx::assert_abs_diff_eq;
use racelogic::core::competitor::CompetitorPars;
use racelogic::core::event_store::Event;
use racelogic::core::handle_season::handle_season;
use racelogic::core::season::{RacePhase, SeasonManager, POINTS_TABLE};
use racelogic::post::export::SeasonExport;
use racelogic::post::race_result::{FinishStatus, WeatherLabel};
use racelogic::pre::ingest::{parse_events, parse_roster};
use racelogic::pre::read_sim_pars::SimConstants;

fn consts() -> SimConstants {
    SimConstants {
        seed: Some(7),
        simulate_missing_laps: false,
        ..SimConstants::default()
    }
}

fn manager_with(ids: &[&str]) -> SeasonManager {
    let mut manager = SeasonManager::new(consts());
    for id in ids {
        manager
            .register(&CompetitorPars::new(id, &format!("Driver {}", id), "Team"))
            .unwrap();
    }
    manager
}

#[test]
fn twelve_participants_get_the_points_table() {
    let ids: Vec<String> = (1..=12).map(|i| format!("C{:02}", i)).collect();
    let id_refs: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
    let mut manager = manager_with(&id_refs);

    for (i, id) in ids.iter().enumerate() {
        manager.add_event(1, 1, id, Event::Lap(90.0 + i as f64));
        manager.add_event(1, 1, id, Event::Position(i as u32 + 1));
    }
    manager.analyze_pit_stops();

    manager.start_race(1).unwrap();
    assert!(manager.process_race_lap(1, 1));
    let result = manager.end_race().clone();

    assert_eq!(result.results.len(), 12);
    for (i, res) in result.results.iter().enumerate() {
        assert_eq!(res.position, i as u32 + 1);
        assert_eq!(res.competitor_id, ids[i]);
        let expected = POINTS_TABLE.get(i).copied().unwrap_or(0);
        assert_eq!(res.points, expected);
    }
    assert_eq!(result.results[10].points, 0);
    assert_eq!(result.results[11].points, 0);
    assert_eq!(manager.competitor("C01").unwrap().season_points(), 25);
    assert_eq!(manager.leaderboard().size(), 12);
}

#[test]
fn missed_laps_force_zero_score_then_recover() {
    let mut manager = manager_with(&["VER", "HAM"]);
    for lap in 0..=5 {
        manager.add_event(1, lap, "VER", Event::Lap(90.0));
    }
    manager.add_event(1, 0, "HAM", Event::Lap(90.0));
    manager.add_event(1, 5, "HAM", Event::Lap(90.0));
    manager.analyze_pit_stops();

    manager.start_race(1).unwrap();
    manager.process_race_lap(1, 0);
    for lap in 1..=4 {
        manager.process_race_lap(1, lap);
        assert_eq!(manager.competitor("HAM").unwrap().missed_laps(), lap);
    }

    let ham = manager.competitor("HAM").unwrap();
    assert_abs_diff_eq!(ham.ranking_score(), 0.0);
    assert_eq!(manager.live_ranking()[0].id(), "VER");

    manager.process_race_lap(1, 5);
    let ham = manager.competitor("HAM").unwrap();
    assert_eq!(ham.missed_laps(), 0);
    assert!(ham.ranking_score() > 50.0);

    let result = manager.end_race();
    assert_eq!(result.get("HAM").unwrap().status, FinishStatus::Finished);
}

#[test]
fn competitor_out_of_laps_is_classified_dnf() {
    let mut manager = manager_with(&["VER", "HAM"]);
    for lap in 0..=6 {
        manager.add_event(1, lap, "VER", Event::Lap(90.0));
    }
    manager.add_event(1, 0, "HAM", Event::Lap(90.0));
    manager.analyze_pit_stops();

    manager.start_race(1).unwrap();
    for lap in 0..=6 {
        manager.process_race_lap(1, lap);
    }
    let result = manager.end_race();

    let ham = result.get("HAM").unwrap();
    assert_eq!(ham.position, 2);
    assert_eq!(ham.status, FinishStatus::Dnf);
    // 1 recorded lap + 6 penalty laps
    assert_abs_diff_eq!(ham.total_time, 90.0 + 6.0 * 120.0);
}

#[test]
fn unreferenced_competitor_gets_no_result() {
    let mut manager = manager_with(&["VER", "HAM", "BOT"]);
    manager.add_event(1, 1, "VER", Event::Lap(90.0));
    manager.add_event(1, 1, "HAM", Event::Lap(91.0));
    manager.add_event(1, 1, "UNKNOWN", Event::Lap(80.0));
    manager.analyze_pit_stops();

    manager.start_race(1).unwrap();
    manager.process_race_lap(1, 1);
    let result = manager.end_race();

    assert_eq!(result.results.len(), 2);
    assert!(result.get("BOT").is_none());
    assert!(result.get("UNKNOWN").is_none());

    let bot = manager.competitor("BOT").unwrap();
    assert_eq!(bot.season_points(), 0);
    assert_abs_diff_eq!(bot.racetime(), 0.0);
    assert_eq!(manager.leaderboard().size(), 3);
}

#[test]
fn degradation_grows_within_stint_and_resets_after_pit() {
    let mut manager = SeasonManager::new(SimConstants {
        race_laps: 10,
        ..consts()
    });
    manager.register(&CompetitorPars::new("NOR", "Lando", "McLaren")).unwrap();
    for lap in 1..=10 {
        manager.add_event(1, lap, "NOR", Event::Lap(90.0));
        if lap == 5 {
            manager.add_event(1, lap, "NOR", Event::Pit(22.0));
        }
    }
    manager.analyze_pit_stops();

    manager.start_race(1).unwrap();
    let mut degr = Vec::new();
    for lap in 1..=10 {
        manager.process_race_lap(1, lap);
        degr.push(manager.competitor("NOR").unwrap().tyre_degr());
    }

    // stint 1: laps 1..4 towards the stop at lap 5
    assert!(degr[..4].windows(2).all(|w| w[0] < w[1]), "{:?}", degr);
    assert_abs_diff_eq!(degr[3], 64.0);
    assert_abs_diff_eq!(degr[4], 0.0);
    // stint 2: laps 6..10 towards the race distance
    assert!(degr[5..].windows(2).all(|w| w[0] < w[1]), "{:?}", degr);
    assert_abs_diff_eq!(degr[9], 80.0);
    assert_eq!(manager.competitor("NOR").unwrap().no_pitstops(), 1);
}

#[test]
fn single_dry_lap_score() {
    let mut manager = manager_with(&["SAI"]);
    manager.add_event(1, 1, "SAI", Event::Lap(90.0));
    manager.analyze_pit_stops();
    manager.process_race_lap(1, 1);

    // tyre age 1 after the lap, soft tyres on a 0.5 difficulty track
    let expected = 100.0 / (1.0 + (1.0_f64 / 30.0).powi(2) * 0.5) + 0.4;
    assert_abs_diff_eq!(
        manager.competitor("SAI").unwrap().ranking_score(),
        expected,
        epsilon = 1e-9
    );
}

#[test]
fn season_from_feeds() {
    let roster = parse_roster(
        "VER,Max Verstappen,Red Bull,0.95\n\
         NOR,Lando Norris,McLaren,0.93,21.5\n\
         broken,row\n\
         VER,Duplicate,Nobody,0.1\n"
            .as_bytes(),
    );
    let feed = parse_events(
        "# race 1\n\
         1,0,VER,COMPOUND,MEDIUM\n\
         1,0,NOR,COMPOUND,SOFT\n\
         1,0,TRACK,TRACK-NAME,Silverstone\n\
         1,0,X,WEATHER,0.8\n\
         BATCH,1,1,VER:98.5,NOR:97.9\n\
         BATCH,1,2,VER:98.1,NOR:99.0\n\
         1,2,NOR,PIT,0\n\
         1,2,VER,OVERTAKE,\n\
         2,1,VER,LAP,90.2\n\
         2,1,NOR,LAP,90.1\n\
         2,1,NOR,LAP,not-a-number\n"
            .as_bytes(),
    );
    assert_eq!(roster.entries.len(), 3);
    assert_eq!(feed.report.skipped, 1);

    let mut manager = SeasonManager::new(consts());
    assert_eq!(manager.register_roster(&roster), 2);
    manager.ingest(&feed);
    assert_eq!(manager.store().pit_laps(1, "NOR"), &[2]);

    let results = handle_season(&mut manager, 2, 3, false).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].track_name, "Silverstone");
    assert_eq!(results[0].weather, WeatherLabel::Rainy);
    assert_eq!(results[1].track_name, "Saudi Arabia");
    assert_eq!(results[1].weather, WeatherLabel::Dry);

    let nor = results[0].get("NOR").unwrap();
    assert_eq!(nor.no_pitstops, 1);
    assert_abs_diff_eq!(nor.total_time, 97.9 + 99.0 + 21.5, epsilon = 1e-9);
    assert_eq!(results[0].get("VER").unwrap().no_overtakes, 1);
    assert_eq!(manager.phase(), RacePhase::Ended(2));

    let standings = manager.season_standings();
    assert_eq!(standings.len(), 2);
    assert_eq!(
        standings[0].season_points() + standings[1].season_points(),
        2 * (25 + 18)
    );

    let export = SeasonExport::new(&manager);
    assert_eq!(export.races.len(), 2);
    assert_eq!(export.standings[0].rank, 1);
}
