//! FILENAME: core/engine/src/numeric.rs
//! PURPOSE: The shared lenient numeric parser.
//! CONTEXT: Filtering, sorting, binning, and aggregation all coerce text
//! through this one function so a value like "¥1,200万" means the same
//! number everywhere. A parse failure is represented as None and is always
//! absorbed locally by the caller as non-matching / null-equivalent.

/// Currency marks stripped before parsing.
const CURRENCY_CHARS: [char; 5] = ['$', '¥', '￥', '€', '£'];

/// Parses a human-entered number. Handles:
/// - currency symbols, thousand separators, surrounding parentheses
/// - a trailing percent sign (divides by 100 after the multiplier)
/// - unit suffixes: k/K ×1e3, m/M ×1e6, b/B ×1e9, w/W/万 ×1e4, 亿 ×1e8
///
/// Returns None when no digit is present. Parentheses are stripped, not
/// treated as an accounting negative.
pub fn parse_number(raw: &str) -> Option<f64> {
    let mut s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let mut percent = false;
    if let Some(rest) = s.strip_suffix('%') {
        percent = true;
        s = rest.trim_end();
    }

    // Strip wrappers and separators before looking for a unit suffix, so
    // forms like "(1k)" and "¥2万" still carry their multiplier.
    let mut cleaned = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            ',' | ' ' | '\u{00A0}' | '(' | ')' => {}
            c if CURRENCY_CHARS.contains(&c) => {}
            c => cleaned.push(c),
        }
    }

    let mut multiplier = 1.0;
    if let Some(last) = cleaned.chars().next_back() {
        let unit = match last {
            'k' | 'K' => Some(1e3),
            'm' | 'M' => Some(1e6),
            'b' | 'B' => Some(1e9),
            'w' | 'W' | '万' => Some(1e4),
            '亿' => Some(1e8),
            _ => None,
        };
        if let Some(m) = unit {
            multiplier = m;
            cleaned.pop();
        }
    }

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let mut value: f64 = cleaned.parse().ok()?;
    value *= multiplier;
    if percent {
        value /= 100.0;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_numbers() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("-3.5"), Some(-3.5));
        assert_eq!(parse_number("  7 "), Some(7.0));
    }

    #[test]
    fn currency_and_separators() {
        assert_eq!(parse_number("$1,234.56"), Some(1234.56));
        assert_eq!(parse_number("¥1,000"), Some(1000.0));
        assert_eq!(parse_number("(500)"), Some(500.0));
    }

    #[test]
    fn unit_suffixes() {
        assert_eq!(parse_number("1.5k"), Some(1500.0));
        assert_eq!(parse_number("2M"), Some(2_000_000.0));
        assert_eq!(parse_number("3B"), Some(3_000_000_000.0));
        assert_eq!(parse_number("2万"), Some(20_000.0));
        assert_eq!(parse_number("1.5亿"), Some(150_000_000.0));
        assert_eq!(parse_number("3w"), Some(30_000.0));
    }

    #[test]
    fn suffix_survives_wrappers() {
        assert_eq!(parse_number("(1k)"), Some(1000.0));
        assert_eq!(parse_number("¥2万"), Some(20_000.0));
        assert_eq!(parse_number("$1.5M "), Some(1_500_000.0));
    }

    #[test]
    fn percent_after_multiplier() {
        assert_eq!(parse_number("30%"), Some(0.3));
        assert_eq!(parse_number("1k%"), Some(10.0));
    }

    #[test]
    fn rejects_digitless_input() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("%"), None);
        assert_eq!(parse_number("$"), None);
    }
}
