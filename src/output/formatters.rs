use crate::sources::TranscriptEntry;

// Entries are plain strings and floats serialized into memory, which cannot fail

/// Format entries as a JSON list of {text, start, duration}
pub fn format_as_json(entries: &[TranscriptEntry]) -> String {
    serde_json::to_string_pretty(entries).unwrap_or_default()
}

/// Format entries as a YAML list of {text, start, duration}
pub fn format_as_yaml(entries: &[TranscriptEntry]) -> String {
    serde_yaml::to_string(entries).unwrap_or_default()
}

/// Format entries as CSV with a `text,start,duration` header
pub fn format_as_csv(entries: &[TranscriptEntry]) -> String {
    let mut out = String::from("text,start,duration\n");

    for entry in entries {
        out.push_str(&csv_field(&entry.text));
        out.push(',');
        out.push_str(&entry.start.to_string());
        out.push(',');
        out.push_str(&entry.duration.to_string());
        out.push('\n');
    }

    out
}

/// Plain text, one entry per line
pub fn format_as_text(entries: &[TranscriptEntry]) -> String {
    entries
        .iter()
        .map(|entry| entry.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
