//! Terminal front-end

pub mod compare;
pub mod input;
pub mod providers;
pub mod rates;
pub mod setup;
pub mod ui;
pub mod watch;
