//! Display helpers for CLI output.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

/// Group digits in fours from the right: `12345678` -> `1234,5678`.
pub fn format_number(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 4 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 4 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_size(bytes: i64) -> String {
    const KB: f64 = 1024.0;
    let size = bytes as f64;
    if size < KB {
        format!("{bytes} B")
    } else if size < KB * KB {
        format!("{:.2} KB", size / KB)
    } else if size < KB * KB * KB {
        format!("{:.2} MB", size / (KB * KB))
    } else {
        format!("{:.2} GB", size / (KB * KB * KB))
    }
}

pub fn format_timestamp<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    ts.format("%Y-%m-%d %H:%M").to_string()
}

/// Five-glyph star bar followed by the rating to one decimal.
pub fn render_stars(rating: Option<f64>) -> String {
    let Some(rating) = rating.filter(|r| r.is_finite()) else {
        return "no rating".to_string();
    };
    let full = rating.clamp(0.0, 5.0).floor() as usize;
    let mut stars = "★".repeat(full);
    stars.push_str(&"☆".repeat(5 - full));
    format!("{stars} {rating:.1}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(1234), "1234");
        assert_eq!(format_number(12345), "1,2345");
        assert_eq!(format_number(12345678), "1234,5678");
        assert_eq!(format_number(-123456789), "-1,2345,6789");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn test_format_timestamp() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_timestamp(&ts), "2025-01-02 03:04");
    }

    #[test]
    fn test_render_stars() {
        assert_eq!(render_stars(None), "no rating");
        assert_eq!(render_stars(Some(3.6)), "★★★☆☆ 3.6");
        assert_eq!(render_stars(Some(5.0)), "★★★★★ 5.0");
        assert_eq!(render_stars(Some(0.0)), "☆☆☆☆☆ 0.0");
    }
}
