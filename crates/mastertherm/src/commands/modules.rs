//! Module listing.

use tabled::Tabled;

use mastertherm_core::{Controller, DeviceIdentity};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ModuleRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
}

impl From<&DeviceIdentity> for ModuleRow {
    fn from(d: &DeviceIdentity) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let devices = controller.devices();
    if devices.is_empty() && !global.quiet {
        eprintln!("No heat-pump modules on this account");
        return Ok(());
    }

    let out = output::render_list(
        &global.output,
        devices.as_slice(),
        |d| ModuleRow::from(d),
        |d| d.id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
