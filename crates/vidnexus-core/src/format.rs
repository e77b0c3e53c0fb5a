use std::time::Duration;

use chrono::NaiveDate;

use crate::types::{Summary, VideoDetails};

const DESCRIPTION_PREVIEW_CHARS: usize = 400;
const FILE_NAME_TITLE_CHARS: usize = 50;

/// Format a `YYYYMMDD` upload date as e.g. `Mar 07, 2024`
pub fn format_date(date: &str) -> String {
    if date.is_empty() {
        return "Unknown Date".to_string();
    }
    match NaiveDate::parse_from_str(date, "%Y%m%d") {
        Ok(parsed) => parsed.format("%b %d, %Y").to_string(),
        Err(_) => date.to_string(),
    }
}

/// Format a video length in seconds as `Xm Ys`
pub fn format_video_duration(seconds: u64) -> String {
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// Format wall-clock time spent on a step
pub fn format_elapsed(d: Duration) -> String {
    let tenths = (d.as_secs_f64() * 10.0).round() as u64;
    if tenths < 600 {
        format!("{}.{}s", tenths / 10, tenths % 10)
    } else {
        let secs = d.as_secs_f64().round() as u64;
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Group digits by thousands: `1234567` -> `1,234,567`
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn truncate_description(description: &str) -> String {
    if description.is_empty() {
        return "No description available.".to_string();
    }
    if description.chars().count() <= DESCRIPTION_PREVIEW_CHARS {
        return description.to_string();
    }
    let preview: String = description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
    format!("{}...", preview)
}

/// File name for a saved summary, derived from the video title
pub fn summary_file_name(title: &str) -> String {
    let stem: String = title
        .chars()
        .take(FILE_NAME_TITLE_CHARS)
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = stem.trim();
    if stem.is_empty() {
        "video_summary.txt".to_string()
    } else {
        format!("{}_summary.txt", stem)
    }
}

/// Format video details as human-readable markdown
pub fn format_details_readable(details: &VideoDetails) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", details.title));

    output.push_str(&format!(
        "**Uploader:** {} | **Upload Date:** {} | **Views:** {} | **Duration:** {}\n\n",
        details.uploader,
        format_date(&details.upload_date),
        format_count(details.view_count),
        format_video_duration(details.duration)
    ));

    output.push_str("## Description\n\n");
    output.push_str(&truncate_description(&details.description));
    output.push('\n');

    output
}

pub fn format_summary_readable(summary: &Summary) -> String {
    format!("## Final Summary\n\n{}\n", summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_upload_dates() {
        assert_eq!(format_date("20240307"), "Mar 07, 2024");
        assert_eq!(format_date(""), "Unknown Date");
        assert_eq!(format_date("yesterday"), "yesterday");
    }

    #[test]
    fn formats_counts_and_durations() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
        assert_eq!(format_video_duration(149), "2m 29s");
        assert_eq!(format_elapsed(Duration::from_millis(4200)), "4.2s");
        assert_eq!(format_elapsed(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_elapsed(Duration::from_millis(119_700)), "2m 0s");
        assert_eq!(format_elapsed(Duration::from_millis(59_970)), "1m 0s");
    }

    #[test]
    fn truncates_long_descriptions() {
        let long = "x".repeat(450);
        let preview = truncate_description(&long);
        assert_eq!(preview.len(), 403);
        assert!(preview.ends_with("..."));
        assert_eq!(truncate_description("short"), "short");
        assert_eq!(truncate_description(""), "No description available.");
    }

    #[test]
    fn summary_file_names_are_path_safe() {
        assert_eq!(summary_file_name("A/B: test?"), "A_B_ test__summary.txt");
        assert_eq!(summary_file_name("   "), "video_summary.txt");
        let long = "t".repeat(80);
        assert_eq!(summary_file_name(&long), format!("{}_summary.txt", "t".repeat(50)));
    }

    #[test]
    fn details_render_as_markdown() {
        let details = VideoDetails {
            title: "Talk".into(),
            upload_date: "20231231".into(),
            view_count: 12345,
            duration: 61,
            ..VideoDetails::default()
        };
        let out = format_details_readable(&details);
        assert!(out.starts_with("# Talk\n\n"));
        assert!(out.contains("**Upload Date:** Dec 31, 2023"));
        assert!(out.contains("**Views:** 12,345"));
        assert!(out.contains("**Duration:** 1m 1s"));
        assert!(out.contains("No description available."));
    }
}
