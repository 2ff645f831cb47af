use clap::Parser;
use racelogic::core::handle_season::handle_season;
use racelogic::core::season::SeasonManager;
use racelogic::post::export::{format_standings, write_export, SeasonExport};
use racelogic::pre::ingest::{read_events, read_roster};
use racelogic::pre::read_sim_pars::{read_sim_constants, SimConstants};
use racelogic::pre::sim_opts::SimOpts;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get simulation options from the command line arguments
    let sim_opts: SimOpts = SimOpts::parse();
    init_logging(sim_opts.debug);

    // get simulation constants
    let mut sim_consts = if let Some(config_path) = &sim_opts.config {
        println!("INFO: Reading simulation constants from {:?}", config_path);
        read_sim_constants(config_path)?
    } else {
        SimConstants::default()
    };
    if sim_opts.seed.is_some() {
        sim_consts.seed = sim_opts.seed;
    }
    let no_laps = sim_opts.laps.unwrap_or(sim_consts.race_laps);

    // load competitors and race events
    let mut manager = SeasonManager::new(sim_consts);

    let roster = read_roster(&sim_opts.roster)?;
    let no_registered = manager.register_roster(&roster);
    let feed = read_events(&sim_opts.events)?;
    manager.ingest(&feed);

    println!(
        "INFO: Registered {} competitors, loaded {} events ({} rows skipped)",
        no_registered,
        manager.store().no_events(),
        roster.report.skipped + feed.report.skipped
    );

    let no_races = match sim_opts.races {
        Some(no_races) => no_races,
        None => manager.store().race_ids().max().unwrap_or(0),
    };
    if no_races == 0 {
        anyhow::bail!("No races found in {:?}! Use --races to set the number of races.", sim_opts.events);
    }

    // EXECUTION -----------------------------------------------------------------------------------
    println!("INFO: Simulating {} races with {} laps each...", no_races, no_laps);
    let t_start = Instant::now();

    let race_results = handle_season(&mut manager, no_races, no_laps, sim_opts.debug)?;

    println!("INFO: Execution time: {}ms", t_start.elapsed().as_millis());

    // POST-PROCESSING -----------------------------------------------------------------------------
    for race_result in race_results.iter() {
        println!();
        race_result.print_classification()?;
    }

    println!("\nINFO: Final season standings");
    print!("{}", format_standings(&manager.season_standings())?);

    let export = SeasonExport::new(&manager);
    write_export(&export, &sim_opts.output)?;
    println!("INFO: Data exported to {:?}", sim_opts.output);

    Ok(())
}
