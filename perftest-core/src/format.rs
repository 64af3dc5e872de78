//! Number formatting with a fixed count of significant digits.

/// Pretty-print `value` with `digits` significant digits.
///
/// Trailing zeros are dropped; very small or very large magnitudes switch
/// to scientific notation.
pub fn pp(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let digits = digits.max(1) as i32;
    let magnitude = value.abs().log10().floor() as i32;

    if !(-5..15).contains(&magnitude) {
        let text = format!("{:.*e}", (digits - 1) as usize, value);
        return match text.split_once('e') {
            Some((mantissa, exponent)) => format!("{}e{}", trim_fraction(mantissa), exponent),
            None => text,
        };
    }

    let decimals = digits - 1 - magnitude;
    if decimals <= 0 {
        let factor = 10f64.powi(-decimals);
        return format!("{:.0}", (value / factor).round() * factor);
    }

    trim_fraction(&format!("{:.*}", decimals as usize, value)).to_string()
}

fn trim_fraction(text: &str) -> &str {
    if !text.contains('.') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.')
}
