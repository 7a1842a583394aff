use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

use frond_core::guide::{render_html, render_markdown};
use frond_core::models::Plant;

/// Render the care guide and write it to `output`, or stdout when no path
/// is given.
pub(crate) fn cmd_export(plants: &[Plant], format: &str, output: Option<&Path>) -> Result<()> {
    let rendered = match format.to_lowercase().as_str() {
        "markdown" | "md" => render_markdown(plants),
        "html" => render_html(plants),
        other => bail!("Unknown format '{other}'. Use 'markdown' or 'html'"),
    };

    match output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write guide to {}", path.display()))?;
            eprintln!("Wrote care guide to {}", path.display());
        }
        None => print!("{rendered}"),
    }

    Ok(())
}
