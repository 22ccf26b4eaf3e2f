use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Check if a host belongs to YouTube
pub fn is_youtube_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == "youtube.com"
        || host == "youtu.be"
        || host.ends_with(".youtube.com")
        || host == "youtube-nocookie.com"
        || host.ends_with(".youtube-nocookie.com")
}

/// Extract the video identifier from a URL or bare identifier.
///
/// Never fails: anything that is not recognisably a YouTube URL is returned
/// trimmed, and validation is left to `VideoId::parse`.
pub fn video_id_from_input(input: &str) -> String {
    let input = input.trim();

    if let Ok(url) = Url::parse(input) {
        if let Some(id) = video_id_from_url(&url) {
            return id;
        }
    }

    // Scheme-less forms such as "youtube.com/watch?v=..." or "youtu.be/..."
    if !input.contains("://") && input.contains('/') {
        if let Ok(url) = Url::parse(&format!("https://{}", input)) {
            if let Some(id) = video_id_from_url(&url) {
                return id;
            }
        }
    }

    if let Some((_, after)) = input.rsplit_once("v=") {
        return after
            .split(|c| c == '&' || c == '#')
            .next()
            .unwrap_or_default()
            .to_string();
    }

    input.to_string()
}

fn video_id_from_url(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    if !is_youtube_host(host) {
        return None;
    }

    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    if host.eq_ignore_ascii_case("youtu.be") {
        return segments.next().map(str::to_string);
    }

    if url.path().starts_with("/watch") {
        return url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty());
    }

    match (segments.next(), segments.next()) {
        (Some("shorts" | "embed" | "v" | "live"), Some(id)) => Some(id.to_string()),
        _ => None,
    }
}

/// Markup tags inside caption text; a `<` not followed by a tag name is content
static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[A-Za-z][^<>]*>").unwrap());

/// Strip markup from caption text, decode entities and collapse whitespace
pub fn clean_caption_text(raw: &str) -> String {
    let without_tags = MARKUP_TAG.replace_all(raw, "");

    html_escape::decode_html_entities(&without_tags)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check if the current environment has the tools a backend needs
pub async fn check_dependencies(yt_dlp_path: &str) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(yt_dlp_path).await {
        missing.push(format!("{} - required by the yt-dlp backend", yt_dlp_path));
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg("--version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
