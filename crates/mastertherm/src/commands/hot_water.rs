//! Domestic hot water: status and setpoint.

use mastertherm_core::{Controller, HotWaterStatus, HotWaterThermostat};

use crate::cli::{GlobalOpts, HotWaterArgs, HotWaterCommand};
use crate::error::CliError;
use crate::output;

use super::util;

fn range_label(status: &HotWaterStatus) -> String {
    match (status.min_target, status.max_target) {
        (Some(min), Some(max)) => format!("{} .. {}", output::celsius(Some(min)), output::celsius(Some(max))),
        _ => "-".into(),
    }
}

fn detail(status: &HotWaterStatus, color: bool) -> String {
    output::detail_lines(&[
        ("Module", format!("{} ({})", status.name, status.device_id)),
        ("State", output::paint_state(status.current_state, color)),
        ("Tank", output::celsius(Some(status.current_temperature))),
        ("Target", output::celsius(Some(status.target_temperature))),
        ("Range", range_label(status)),
    ])
}

pub async fn handle(
    controller: &Controller,
    args: HotWaterArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let device = util::resolve_module(controller, &args.module)?;
    let thermostat = HotWaterThermostat::new(controller.clone(), &device);

    match args.command.unwrap_or(HotWaterCommand::Status) {
        HotWaterCommand::Status => {
            let status = thermostat.status().await?;
            let color = output::should_color(&global.color);
            let out = output::render_single(
                &global.output,
                &status,
                |s| detail(s, color),
                |s| format!("{}\t{:.1}", s.current_state, s.current_temperature),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
        HotWaterCommand::Target { celsius } => {
            let celsius = util::validate_celsius(celsius)?;
            thermostat.set_target_temperature(celsius).await?;
            if !global.quiet {
                eprintln!("Hot water {} target set to {celsius:.1}°C", device.id);
            }
            Ok(())
        }
    }
}
