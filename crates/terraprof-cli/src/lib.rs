//! terraprof command line support: configuration, track loading and reports.

pub mod config;
pub mod report;
pub mod track;

pub use config::Config;
pub use report::{profile_track, ProfileReport};
pub use track::{load_track, parse_track};
