pub mod achievements;
pub mod adapt;
pub mod config;
pub mod progress;
pub mod simulate;
pub mod timer;
