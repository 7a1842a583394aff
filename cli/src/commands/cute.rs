use std::path::PathBuf;

use anyhow::Result;

use frond_core::settings::{FileBackend, SettingsService};

/// Show or flip the persisted cute-mode display toggle.
pub(crate) fn cmd_cute(settings_path: PathBuf, set_to: Option<bool>, json: bool) -> Result<()> {
    let mut service = SettingsService::load(Box::new(FileBackend::new(settings_path)));

    if let Some(on) = set_to {
        service.set_cute_mode(on)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&service.settings())?);
    } else if service.cute_mode() {
        println!("Cute mode is on ✨");
    } else {
        println!("Cute mode is off");
    }

    Ok(())
}
