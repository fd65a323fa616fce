//! Raw point access: dump, read, write.

use serde::Serialize;
use tabled::Tabled;

use mastertherm_core::{Controller, PointId, PointKind, PointValue, codec};

use crate::cli::{GetArgs, GlobalOpts, PointsArgs, SetArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct PointEntry {
    point: PointId,
    kind: PointKind,
    value: PointValue,
}

#[derive(Tabled)]
struct PointRow {
    #[tabled(rename = "Point")]
    point: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl From<&PointEntry> for PointRow {
    fn from(e: &PointEntry) -> Self {
        Self {
            point: e.point.to_string(),
            kind: kind_label(e.kind).into(),
            value: e.value.to_string(),
        }
    }
}

fn kind_label(kind: PointKind) -> &'static str {
    match kind {
        PointKind::Digital => "digital",
        PointKind::Integer => "integer",
        PointKind::Analog => "analog",
    }
}

fn entry(point: PointId, value: PointValue) -> PointEntry {
    PointEntry {
        point,
        kind: point.kind,
        value,
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle_points(
    controller: &Controller,
    args: PointsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let PointsArgs { module, kind } = args;
    let device = util::resolve_module(controller, &module)?;
    let snapshot = controller.snapshot(&device.id).await?;

    let entries: Vec<PointEntry> = codec::points(&snapshot, controller.layout())
        .into_iter()
        .filter(|(point, _)| kind.is_none_or(|k| point.kind == k))
        .map(|(point, value)| entry(point, value))
        .collect();

    if entries.is_empty() && !global.quiet {
        eprintln!("No points decoded for module {}", device.id);
    }

    let out = output::render_list(
        &global.output,
        &entries,
        |e| PointRow::from(e),
        |e| format!("{}={}", e.point, e.value),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle_get(
    controller: &Controller,
    args: GetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let device = util::resolve_module(controller, &args.module)?;

    let mut entries = Vec::with_capacity(args.points.len());
    for point in args.points {
        let value = controller.read_point(&device.id, point).await?;
        entries.push(entry(point, value));
    }

    let out = output::render_list(
        &global.output,
        &entries,
        |e| PointRow::from(e),
        |e| e.value.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle_set(
    controller: &Controller,
    args: SetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let SetArgs {
        module,
        point,
        value,
    } = args;
    let device = util::resolve_module(controller, &module)?;
    let value = codec::parse_value(point, &value).map_err(|e| CliError::Validation {
        field: point.to_string(),
        reason: e.to_string(),
    })?;

    controller.write_point(&device.id, point, value).await?;
    if !global.quiet {
        eprintln!("{point} set to {value} on module {}", device.id);
    }
    Ok(())
}
