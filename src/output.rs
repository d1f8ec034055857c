use std::path::Path;

use eyre::{Result, WrapErr};
use log::debug;

use crate::summarize::Summary;

/// Render a summary as indented JSON; non-ASCII text is kept as-is
pub fn render_summary(summary: &Summary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

pub fn write_transcript(path: &Path, transcript: &str) -> Result<()> {
    write_file(path, transcript)
}

pub fn write_summary(path: &Path, summary: &Summary) -> Result<()> {
    write_file(path, &render_summary(summary)?)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents).wrap_err_with(|| format!("could not write {}", path.display()))?;
    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}
