use anyhow::Result;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::sources::TranscriptEntry;

pub mod formatters;

pub use formatters::*;

/// Render entries in the requested format
pub fn render(entries: &[TranscriptEntry], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_as_json(entries),
        OutputFormat::Yaml => format_as_yaml(entries),
        OutputFormat::Csv => format_as_csv(entries),
        OutputFormat::Text => format_as_text(entries),
    }
}

/// Save transcript to file
pub fn save_to_file(entries: &[TranscriptEntry], path: &Path, format: OutputFormat) -> Result<()> {
    let content = render(entries, format);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent)?;
    }

    fs_err::write(path, content)?;
    Ok(())
}

/// Print transcript to console
pub fn print_to_console(entries: &[TranscriptEntry], format: OutputFormat) -> Result<()> {
    let content = render(entries, format);

    println!("{}", content.trim_end_matches('\n'));
    Ok(())
}
