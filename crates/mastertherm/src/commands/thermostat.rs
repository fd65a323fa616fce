//! Heat pump thermostat: status, mode, setpoint.

use mastertherm_core::{Controller, HeatPumpThermostat, ThermostatStatus};

use crate::cli::{GlobalOpts, ThermostatArgs, ThermostatCommand};
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(status: &ThermostatStatus, color: bool) -> String {
    output::detail_lines(&[
        ("Module", format!("{} ({})", status.name, status.device_id)),
        ("State", output::paint_state(status.current_state, color)),
        ("Mode", output::paint_state(status.target_state, color)),
        ("Indoor", output::celsius(Some(status.current_temperature))),
        ("Target", output::celsius(Some(status.target_temperature))),
    ])
}

pub async fn handle(
    controller: &Controller,
    args: ThermostatArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let device = util::resolve_module(controller, &args.module)?;
    let thermostat = HeatPumpThermostat::new(controller.clone(), &device);

    match args.command.unwrap_or(ThermostatCommand::Status) {
        ThermostatCommand::Status => {
            let status = thermostat.status().await?;
            let color = output::should_color(&global.color);
            let out = output::render_single(
                &global.output,
                &status,
                |s| detail(s, color),
                |s| format!("{}\t{}", s.current_state, s.target_state),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
        ThermostatCommand::Mode { state } => {
            thermostat.set_target_state(state).await?;
            if !global.quiet {
                eprintln!("Heat pump {} mode set to {state}", device.id);
            }
            Ok(())
        }
        ThermostatCommand::Target { celsius } => {
            let celsius = util::validate_celsius(celsius)?;
            thermostat.set_target_temperature(celsius).await?;
            if !global.quiet {
                eprintln!("Heat pump {} target set to {celsius:.1}°C", device.id);
            }
            Ok(())
        }
    }
}
