//! Terminal front end: commands and their rendering.

pub mod funds;
pub mod setup;
pub mod show;
pub mod ui;
pub mod watch;
