//! Date helper functions

use chrono::{DateTime, Datelike, FixedOffset, TimeZone};
use chrono_tz::Tz;

const PT_BR_MONTHS: [&str; 12] = [
    "janeiro", "fevereiro", "março", "abril", "maio", "junho", "julho", "agosto", "setembro",
    "outubro", "novembro", "dezembro",
];
const PT_BR_MONTHS_SHORT: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];
const PT_BR_WEEKDAYS: [&str; 7] = [
    "segunda-feira",
    "terça-feira",
    "quarta-feira",
    "quinta-feira",
    "sexta-feira",
    "sábado",
    "domingo",
];
const PT_BR_WEEKDAYS_SHORT: [&str; 7] = ["seg", "ter", "qua", "qui", "sex", "sáb", "dom"];

/// Format a date using a Moment.js-style format string in the given language
///
/// # Examples
/// ```ignore
/// format_date(&date, "DD MMM YYYY", "pt-BR") // -> "19 mar 2021"
/// ```
pub fn format_date<Tz2: TimeZone>(date: &DateTime<Tz2>, format: &str, language: &str) -> String
where
    Tz2::Offset: std::fmt::Display,
{
    let mut chrono_format = moment_to_chrono_format(format);

    if is_portuguese(language) {
        // Weekday index is Monday-based
        let month = date.month0() as usize;
        let weekday = date.weekday().num_days_from_monday() as usize;
        chrono_format = chrono_format
            .replace("%B", PT_BR_MONTHS[month])
            .replace("%b", PT_BR_MONTHS_SHORT[month])
            .replace("%A", PT_BR_WEEKDAYS[weekday])
            .replace("%a", PT_BR_WEEKDAYS_SHORT[weekday]);
    }

    date.format(&chrono_format).to_string()
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Tz2: TimeZone>(date: &DateTime<Tz2>) -> String
where
    Tz2::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Resolve an IANA timezone name; empty or unknown names fall back to UTC
pub fn site_timezone(name: &str) -> Tz {
    if name.trim().is_empty() {
        return Tz::UTC;
    }
    name.parse::<Tz>().unwrap_or_else(|_| {
        tracing::warn!("Unknown timezone {:?}, using UTC", name);
        Tz::UTC
    })
}

/// Move a repository timestamp into the site timezone
pub fn localize(date: &DateTime<FixedOffset>, timezone: &str) -> DateTime<Tz> {
    date.with_timezone(&site_timezone(timezone))
}

fn is_portuguese(language: &str) -> bool {
    language.to_ascii_lowercase().starts_with("pt")
}

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    // Longest tokens first within each letter
    let replacements = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("DD", "%d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("dddd", "%A"),
        ("ddd", "%a"),
        ("ZZ", "%z"),
    ];

    let mut result = format.to_string();

    for (from, to) in replacements {
        result = result.replace(from, to);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::parse_timestamp;
    use chrono::Utc;

    #[test]
    fn test_format_date_portuguese() {
        let date = Utc.with_ymd_and_hms(2021, 3, 19, 21, 34, 10).unwrap();
        assert_eq!(format_date(&date, "DD MMM YYYY", "pt-BR"), "19 mar 2021");
        assert_eq!(
            format_date(&date, "dddd, DD [de] MMMM", "pt-BR"),
            "sexta-feira, 19 [de] março"
        );
    }

    #[test]
    fn test_format_date_english() {
        let date = Utc.with_ymd_and_hms(2021, 2, 5, 8, 0, 0).unwrap();
        assert_eq!(format_date(&date, "DD MMM YYYY", "en"), "05 Feb 2021");
        assert_eq!(format_date(&date, "YYYY-MM-DD HH:mm", "en"), "2021-02-05 08:00");
    }

    #[test]
    fn test_localize_crosses_midnight() {
        let date = parse_timestamp("2021-03-20T01:30:00+0000").unwrap();
        let local = localize(&date, "America/Sao_Paulo");
        assert_eq!(format_date(&local, "DD MMM YYYY", "pt-BR"), "19 mar 2021");

        let utc = localize(&date, "");
        assert_eq!(format_date(&utc, "DD MMM YYYY", "pt-BR"), "20 mar 2021");
    }

    #[test]
    fn test_unknown_timezone_is_utc() {
        assert_eq!(site_timezone("Mars/Olympus_Mons"), Tz::UTC);
    }

    #[test]
    fn test_date_xml() {
        let date = parse_timestamp("2021-03-19T21:34:10+0000").unwrap();
        assert_eq!(date_xml(&date), "2021-03-19T21:34:10+00:00");
    }

    #[test]
    fn test_moment_to_chrono() {
        assert_eq!(moment_to_chrono_format("DD MMM YYYY"), "%d %b %Y");
        assert_eq!(moment_to_chrono_format("HH:mm:ss"), "%H:%M:%S");
    }
}
