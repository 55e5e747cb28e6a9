//! Time tracking for tickets of your projects, from a terminal.
//! Projects hold sprints, milestones and tickets; time is logged on tickets by hand or with a live
//! timer and summarized in reports. Everything is kept in a single JSON file.
//!

pub mod cli;
pub mod fs;
pub mod tracker;
pub mod utils;
