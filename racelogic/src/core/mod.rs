pub mod competitor;
pub mod event_store;
pub mod handle_season;
pub mod leaderboard;
pub mod registry;
pub mod scoring;
pub mod season;
pub mod tireset;
pub mod track;
