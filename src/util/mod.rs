pub(crate) fn now_ms() -> i64 {
    js_sys::Date::now().round() as i64
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Render a store timestamp (`YYYY-MM-DD...`, usually full ISO-8601) as
/// e.g. `Aug 25, 2026` for the note header.
///
/// Anything that doesn't look like a date is returned as-is rather than
/// guessed at.
pub(crate) fn format_date_year(created_at: &str) -> String {
    let s = created_at.trim();
    if s.len() < 10 || !s.is_ascii() {
        return s.to_string();
    }

    let (y, m, d) = (&s[0..4], &s[5..7], &s[8..10]);
    let year: u16 = match y.parse() {
        Ok(v) => v,
        Err(_) => return s.to_string(),
    };
    let month: usize = match m.parse::<usize>() {
        Ok(v) if (1..=12).contains(&v) => v,
        _ => return s.to_string(),
    };
    let day: u8 = match d.parse() {
        Ok(v) if (1..=31).contains(&v) => v,
        _ => return s.to_string(),
    };

    format!("{} {}, {}", MONTHS[month - 1], day, year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_iso_timestamp() {
        assert_eq!(
            format_date_year("2026-08-25T10:15:00.000Z"),
            "Aug 25, 2026"
        );
        assert_eq!(format_date_year("2024-01-02"), "Jan 2, 2024");
    }

    #[test]
    fn passes_through_unparseable_values() {
        assert_eq!(format_date_year(""), "");
        assert_eq!(format_date_year("yesterday"), "yesterday");
        assert_eq!(format_date_year("2026-13-01T00:00:00Z"), "2026-13-01T00:00:00Z");
    }
}
