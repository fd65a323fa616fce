//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod config_cmd;
pub mod hot_water;
pub mod modules;
pub mod points;
pub mod sensors;
pub mod thermostat;
pub mod util;
pub mod watch;

use mastertherm_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a connected, one-shot command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Modules => modules::handle(controller, global),
        Command::Points(args) => points::handle_points(controller, args, global).await,
        Command::Get(args) => points::handle_get(controller, args, global).await,
        Command::Set(args) => points::handle_set(controller, args, global).await,
        Command::Thermostat(args) => thermostat::handle(controller, args, global).await,
        Command::HotWater(args) => hot_water::handle(controller, args, global).await,
        Command::Sensors(args) => sensors::handle(controller, args, global).await,
        // Watch, Config, and Completions are handled before dispatch
        Command::Watch(_) | Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
