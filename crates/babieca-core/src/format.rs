//! Display helpers in the marketplace's locale (es-ES, euros).

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};

const MONTHS: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sept", "oct", "nov", "dic",
];

/// Formats an amount as euros: `1234,50 €`, `12.345,67 €`.
///
/// Thousands are grouped with `.` only from five integer digits on, as the
/// es-ES locale does.
pub fn currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let integer = (cents / 100).to_string();
    let fraction = cents % 100;

    let grouped = if integer.len() >= 5 {
        group_thousands(&integer)
    } else {
        integer
    };
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}{grouped},{fraction:02} €")
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Short date and time: `19 oct 2026, 14:05`.
pub fn date<Tz: TimeZone>(when: &DateTime<Tz>) -> String {
    let month = MONTHS[when.month0() as usize];
    format!(
        "{} {month} {}, {:02}:{:02}",
        when.day(),
        when.year(),
        when.hour(),
        when.minute()
    )
}

/// Countdown until `end`: `Finalizada` once over, `5h 30m` under twelve
/// hours, `3d 4h` beyond.
pub fn time_remaining(end: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = end - now;
    if diff <= chrono::Duration::zero() {
        return "Finalizada".to_string();
    }

    let hours = diff.num_hours();
    if hours < 12 {
        let minutes = diff.num_minutes() % 60;
        return format!("{hours}h {minutes}m");
    }
    format!("{}d {}h", hours / 24, hours % 24)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn currency_groups_from_five_digits() {
        assert_eq!(currency(0.0), "0,00 €");
        assert_eq!(currency(150.0), "150,00 €");
        assert_eq!(currency(1234.5), "1234,50 €");
        assert_eq!(currency(12_345.67), "12.345,67 €");
        assert_eq!(currency(1_234_567.0), "1.234.567,00 €");
        assert_eq!(currency(-20.5), "-20,50 €");
    }

    #[test]
    fn date_uses_spanish_month_abbreviations() {
        let when = Utc.with_ymd_and_hms(2026, 10, 19, 14, 5, 0).unwrap();
        assert_eq!(date(&when), "19 oct 2026, 14:05");
        let when = Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, 0).unwrap();
        assert_eq!(date(&when), "1 sept 2026, 08:00");
    }

    #[test]
    fn time_remaining_switches_units_at_twelve_hours() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        assert_eq!(time_remaining(now, now), "Finalizada");
        assert_eq!(time_remaining(now - Duration::hours(1), now), "Finalizada");
        assert_eq!(
            time_remaining(now + Duration::minutes(5 * 60 + 30), now),
            "5h 30m"
        );
        assert_eq!(time_remaining(now + Duration::hours(12), now), "0d 12h");
        assert_eq!(time_remaining(now + Duration::hours(76), now), "3d 4h");
    }
}
