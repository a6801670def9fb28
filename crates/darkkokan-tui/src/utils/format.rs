use chrono::Duration;

/// Truncate a string to a maximum number of characters, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Remaining unlock time, e.g. "29m 59s" or "45s"
pub fn format_remaining(remaining: Duration) -> String {
    let total = remaining.num_seconds().max(0);
    let (minutes, seconds) = (total / 60, total % 60);
    if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Ad countdown line shown while the stub ad plays
pub fn format_countdown(secs: u64) -> String {
    match secs {
        0 => "Ad finished".to_string(),
        1 => "Ad ends in 1 second".to_string(),
        n => format!("Ad ends in {} seconds", n),
    }
}
