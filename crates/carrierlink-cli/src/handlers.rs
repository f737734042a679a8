//! Command handlers for CLI subcommands

mod completions;
mod shipping;
mod utils;

pub use completions::handle_completions;
pub use shipping::{
    handle_cancel, handle_providers, handle_rates, handle_ship, handle_test_connection, handle_track,
};
