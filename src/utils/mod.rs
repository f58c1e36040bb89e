/// Replace every character outside `[A-Za-z0-9_-]` so a cache key is a safe file stem
pub fn sanitize_cache_key(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => c,
            _ => '_',
        })
        .collect()
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Subtitle clock `HH:MM:SS<sep>mmm`; SRT uses `,`, WebVTT uses `.`
pub fn format_clock(seconds: f64, millis_separator: char) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;

    format!("{:02}:{:02}:{:02}{}{:03}", hours, minutes, secs, millis_separator, millis)
}

/// Short `[mm:ss]` / `[h:mm:ss]` marker for plain-text output
pub fn format_offset(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("[{}:{:02}:{:02}]", hours, minutes, secs)
    } else {
        format!("[{:02}:{:02}]", minutes, secs)
    }
}
