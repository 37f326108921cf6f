// Number helpers shared by the views, the report and the console output.
use num_format::{Locale, ToFormattedString};

/// Round to `decimals` places, ties away from zero (`1.125 -> 1.13`).
///
/// Non-finite input is returned unchanged so a zero-pressure score stays
/// non-finite instead of turning into a number.
pub fn round_half_up(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    // Keep `-0.0` out of tables.
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Shortest plain rendering of a sensor value: `120`, `7.5`, `-3.25`.
///
/// Matches how the values appear in the uploaded dataset, without forcing a
/// fixed number of decimals.
pub fn format_value(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    format!("{}", n)
}

/// Score as displayed on the leaderboard; non-finite scores read `n/a`.
pub fn format_score(score: f64) -> String {
    if score.is_finite() {
        format_number(score, 2)
    } else {
        "n/a".to_string()
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators (`1,234.50`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Percentage of `done` over `total`, rounded to the nearest whole number
/// and clamped to `0..=100`. An empty payload counts as complete.
pub fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = done.min(total) as f64 * 100.0 / total as f64;
    pct.round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_ties_up() {
        assert_eq!(round_half_up(5.0 / 4.0, 2), 1.25);
        assert_eq!(round_half_up(1.0 / 8.0, 2), 0.13);
        assert_eq!(round_half_up(10.0 / 3.0, 2), 3.33);
    }

    #[test]
    fn rounding_keeps_non_finite_values() {
        assert!(round_half_up(f64::INFINITY, 2).is_infinite());
        assert!(round_half_up(f64::NAN, 2).is_nan());
    }

    #[test]
    fn rounding_never_yields_negative_zero() {
        let v = round_half_up(-0.001, 2);
        assert_eq!(v, 0.0);
        assert!(v.is_sign_positive());
    }

    #[test]
    fn formats_values_without_padding() {
        assert_eq!(format_value(120.0), "120");
        assert_eq!(format_value(7.5), "7.5");
        assert_eq!(format_value(f64::INFINITY), "Infinity");
    }

    #[test]
    fn formats_numbers_with_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-12.5, 1), "-12.5");
        assert_eq!(format_int(9855u64), "9,855");
    }

    #[test]
    fn percent_is_clamped() {
        assert_eq!(percent(0, 10), 0);
        assert_eq!(percent(5, 10), 50);
        assert_eq!(percent(20, 10), 100);
        assert_eq!(percent(0, 0), 100);
    }

    #[test]
    fn percent_rounds_to_nearest() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 200), 1);
        assert_eq!(percent(199, 200), 100);
        assert_eq!(percent(1, 1000), 0);
    }
}
