//! Formatting helpers.

use std::time::Duration;

/// `1d 2h 3m 4s`, omitting zero parts. Durations under a second render as `0s`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (days, hours, minutes, seconds) = (
        total / 86_400,
        (total / 3_600) % 24,
        (total / 60) % 60,
        total % 60,
    );

    let parts: Vec<String> = [(days, "d"), (hours, "h"), (minutes, "m"), (seconds, "s")]
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect();

    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}

/// Track-position style: `3:05`, or `1:02:03` past the hour.
pub fn format_clock(millis: u64) -> String {
    let total = millis / 1000;
    let (hours, minutes, seconds) = (total / 3600, (total / 60) % 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Milliseconds written as `1:30`, `1:02:03`, plain seconds (`90`) or units (`1h 30m 5s`).
pub fn parse_time(input: &str) -> Option<u64> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }

    if input.contains(':') {
        let parts: Vec<&str> = input.split(':').collect();
        let well_formed = parts.len() <= 3
            && parts
                .iter()
                .all(|part| (1..=2).contains(&part.len()) && part.chars().all(|c| c.is_ascii_digit()));
        if !well_formed {
            return None;
        }
        let seconds = parts
            .iter()
            .try_fold(0u64, |total, part| Some(total * 60 + part.parse::<u64>().ok()?))?;
        return seconds.checked_mul(1000);
    }

    if input.chars().all(|c| c.is_ascii_digit()) {
        return input.parse::<u64>().ok()?.checked_mul(1000);
    }

    let mut total: u64 = 0;
    let mut amount = String::new();
    for c in input.chars() {
        let unit: u64 = match c {
            '0'..='9' => {
                amount.push(c);
                continue;
            }
            ' ' => continue,
            'd' => 86_400_000,
            'h' => 3_600_000,
            'm' => 60_000,
            's' => 1_000,
            _ => return None,
        };
        let value: u64 = amount.parse().ok()?;
        amount.clear();
        total = total.checked_add(value.checked_mul(unit)?)?;
    }
    // A number without a unit at the end.
    if !amount.is_empty() {
        return None;
    }
    Some(total)
}

/// Cut `text` to at most `max` characters, ending with an ellipsis when cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// Text progress bar like `▬▬▬🔘▬▬▬▬▬▬`.
pub fn progress_bar(position: u64, length: u64, width: usize) -> String {
    if length == 0 || width == 0 {
        return "▬".repeat(width);
    }
    let filled = ((position.min(length) as f64 / length as f64) * width as f64) as usize;
    let filled = filled.min(width - 1);
    format!("{}🔘{}", "▬".repeat(filled), "▬".repeat(width - 1 - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_skip_zero_parts() {
        assert_eq!(format_duration(Duration::from_millis(93_784_000)), "1d 2h 3m 4s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
        assert_eq!(format_duration(Duration::from_millis(400)), "0s");
    }

    #[test]
    fn clock_format_switches_to_hours() {
        assert_eq!(format_clock(183_000), "3:03");
        assert_eq!(format_clock(3_723_000), "1:02:03");
    }

    #[test]
    fn times_parse_in_every_notation() {
        assert_eq!(parse_time("1:30"), Some(90_000));
        assert_eq!(parse_time("1:02:03"), Some(3_723_000));
        assert_eq!(parse_time("90"), Some(90_000));
        assert_eq!(parse_time("1h 30m"), Some(5_400_000));
        assert_eq!(parse_time("2M10S"), Some(130_000));
        assert_eq!(parse_time("0"), Some(0));

        assert_eq!(parse_time(""), None);
        assert_eq!(parse_time("1:2:3:4"), None);
        assert_eq!(parse_time("100:00"), None);
        assert_eq!(parse_time("1m 30"), None);
        assert_eq!(parse_time("soon"), None);
        assert_eq!(parse_time("-5"), None);
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Never Gonna Give You Up", 10), "Never Gon…");
        assert_eq!(truncate("日本語のタイトル", 4), "日本語…");
    }

    #[test]
    fn progress_bar_marks_position() {
        assert_eq!(progress_bar(0, 100, 5), "🔘▬▬▬▬");
        assert_eq!(progress_bar(50, 100, 5), "▬▬🔘▬▬");
        assert_eq!(progress_bar(100, 100, 5), "▬▬▬▬🔘");
    }
}
