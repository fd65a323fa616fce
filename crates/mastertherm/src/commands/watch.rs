//! Live view: one line per snapshot replacement until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use futures_util::StreamExt;
use futures_util::stream::select_all;
use serde::Serialize;

use mastertherm_core::{
    Controller, ControllerConfig, DeviceAccessories, DeviceIdentity, HotWaterStatus, Snapshot,
    SnapshotStream, ThermostatStatus,
};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct WatchEvent {
    device_id: String,
    fetched_at: chrono::DateTime<chrono::Utc>,
    heat_pump: ThermostatStatus,
    hot_water: HotWaterStatus,
    outdoor: f64,
}

pub async fn handle(
    mut config: ControllerConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(secs) = args.interval {
        config.poll_interval = Duration::from_secs(secs);
    }
    if config.poll_interval.is_zero() {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "watch needs a poll interval of at least one second".into(),
        });
    }
    if !args.module.is_empty() {
        config.devices = args.module;
    }

    let controller = Controller::new(config)?;
    controller.connect().await?;

    let result = watch_loop(&controller, global).await;
    controller.disconnect().await;
    result
}

async fn watch_loop(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let devices = controller.devices();
    if devices.is_empty() {
        return Err(CliError::NotFound {
            resource_type: "module".into(),
            identifier: "(any)".into(),
            list_command: "modules".into(),
        });
    }

    let streams = devices
        .iter()
        .map(|d| controller.subscribe(&d.id).map(SnapshotStream::into_stream))
        .collect::<Result<Vec<_>, _>>()?;
    let mut updates = select_all(streams);

    if !global.quiet {
        eprintln!("Watching {} module(s), Ctrl-C to stop", devices.len());
    }
    let color = output::should_color(&global.color);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            next = updates.next() => {
                let Some(snapshot) = next else { break };
                let Some(device) = controller.device(&snapshot.device_id) else { continue };
                // A failed read is reported and the watch carries on.
                match event(controller, &device, &snapshot).await {
                    Ok(ev) => emit(&ev, &device, global, color)?,
                    Err(e) => eprintln!("{}: {e}", device.id),
                }
            }
        }
    }

    Ok(())
}

async fn event(
    controller: &Controller,
    device: &DeviceIdentity,
    snapshot: &Arc<Snapshot>,
) -> Result<WatchEvent, CliError> {
    let accessories = DeviceAccessories::new(controller, device);
    Ok(WatchEvent {
        device_id: device.id.clone(),
        fetched_at: snapshot.fetched_at,
        heat_pump: accessories.heat_pump.status().await?,
        hot_water: accessories.hot_water.status().await?,
        outdoor: accessories.outdoor.current_temperature().await?,
    })
}

fn emit(
    ev: &WatchEvent,
    device: &DeviceIdentity,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    if global.quiet {
        return Ok(());
    }
    let line = match global.output {
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            output::render_json(ev, true)?
        }
        OutputFormat::Table | OutputFormat::Plain => format!(
            "{}  {:<16} {:<5} {:<5} in {}  target {}  dhw {}  out {}",
            ev.fetched_at.with_timezone(&Local).format("%H:%M:%S"),
            device.name,
            output::paint_state(ev.heat_pump.current_state, color),
            output::paint_state(ev.heat_pump.target_state, color),
            output::celsius(Some(ev.heat_pump.current_temperature)),
            output::celsius(Some(ev.heat_pump.target_temperature)),
            output::celsius(Some(ev.hot_water.current_temperature)),
            output::celsius(Some(ev.outdoor)),
        ),
    };
    println!("{line}");
    Ok(())
}
