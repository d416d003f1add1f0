/// Decimal places kept when rendering an aggregate result.
pub const DISPLAY_DECIMALS: usize = 10;

/// Format a number for display.
///
/// Rounds to [`DISPLAY_DECIMALS`] places and drops trailing zeros, so
/// `0.1 + 0.2` shows as `0.3` and `6` shows as `6`. Magnitudes from 1e21 up
/// use exponent notation. Non-finite values show as `#NUM!`.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return "#NUM!".to_string();
    }
    if n.abs() >= 1e21 {
        return format!("{:e}", n);
    }

    let fixed = format!("{:.*}", DISPLAY_DECIMALS, n);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::format_number;

    #[test]
    fn test_integers_have_no_decimal_point() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(6.0), "6");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(100.0), "100");
        assert_eq!(format_number(1e20), "100000000000000000000");
    }

    #[test]
    fn test_float_artifacts_are_rounded_away() {
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(1.0 / 3.0), "0.3333333333");
    }

    #[test]
    fn test_negative_zero_and_tiny_values() {
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(-1e-12), "0");
    }

    #[test]
    fn test_large_and_non_finite() {
        assert_eq!(format_number(1e21), "1e21");
        assert_eq!(format_number(f64::INFINITY), "#NUM!");
        assert_eq!(format_number(f64::NAN), "#NUM!");
    }
}
