/// Common text, number and date helpers shared across services and jobs
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};

/// Parses a leading integer the way browsers' `parseInt` does:
/// optional whitespace and sign, then as many digits as are present.
/// `"12abc"` is 12, `"abc"` is `None`.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let value: i64 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Escapes the five HTML-significant characters
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Truncates to at most `max` characters
pub fn truncate_chars(raw: &str, max: usize) -> String {
    raw.chars().take(max).collect()
}

/// Formats a number with US thousands separators and up to three decimals
pub fn format_us_number(value: Decimal) -> String {
    let rounded = value
        .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part.to_string(), Some(frac_part.to_string())),
        None => (text, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

pub fn format_us_integer(value: i64) -> String {
    format_us_number(Decimal::from(value))
}

/// `$` prefixed money figure
pub fn format_money(value: Decimal) -> String {
    format!("${}", format_us_number(value))
}

/// Keeps only digits and dots, as listing prices are free text ("$45,000 OBO")
pub fn price_digits(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Parses a free-text price into a number when it has one
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let digits = price_digits(raw);
    if digits.is_empty() {
        return None;
    }
    digits.parse::<Decimal>().ok()
}

/// Rounds half away from zero to a whole number
pub fn round_whole(value: Decimal) -> i64 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or_default()
}

/// `March 9, 2026`
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// `March 9, 2026 at 02:05 PM`
pub fn format_submitted_at(at: DateTime<Utc>) -> String {
    at.format("%B %-d, %Y at %I:%M %p").to_string()
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date
pub fn parse_quote_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case("42", Some(42))]
    #[case("  7 ", Some(7))]
    #[case("12abc", Some(12))]
    #[case("-3", Some(-3))]
    #[case("abc", None)]
    #[case("", None)]
    #[case("+", None)]
    fn parses_leading_integers(#[case] raw: &str, #[case] expected: Option<i64>) {
        assert_eq!(parse_leading_int(raw), expected);
    }

    #[test]
    fn escapes_html_specials() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[rstest]
    #[case(dec!(0), "0")]
    #[case(dec!(999), "999")]
    #[case(dec!(1000), "1,000")]
    #[case(dec!(1234567), "1,234,567")]
    #[case(dec!(12500.5), "12,500.5")]
    #[case(dec!(3.14159), "3.142")]
    #[case(dec!(45000.00), "45,000")]
    #[case(dec!(-2500), "-2,500")]
    fn formats_us_numbers(#[case] value: Decimal, #[case] expected: &str) {
        assert_eq!(format_us_number(value), expected);
    }

    #[test]
    fn extracts_price_digits() {
        assert_eq!(parse_price("$45,000 OBO"), Some(dec!(45000)));
        assert_eq!(parse_price("CALL"), None);
        assert_eq!(parse_price("1.2.3"), None);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_whole(dec!(2.5)), 3);
        assert_eq!(round_whole(dec!(2.4)), 2);
    }

    #[test]
    fn formats_dates() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(format_long_date(date), "March 9, 2026");
        let at = Utc.with_ymd_and_hms(2026, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(format_submitted_at(at), "March 9, 2026 at 02:05 PM");
    }

    #[test]
    fn parses_quote_dates() {
        let expected = NaiveDate::from_ymd_opt(2026, 1, 31);
        assert_eq!(parse_quote_date("2026-01-31"), expected);
        assert_eq!(parse_quote_date("2026-01-31T15:00:00Z"), expected);
        assert_eq!(parse_quote_date("tomorrow"), None);
    }
}
