//! Amount normalization.
//!
//! DART reports amounts in units of 1 KRW. Canonical records carry thousands
//! of KRW, obtained by dropping the last three digits of the reported text.
//! The value is truncated, never rounded.

/// Number of trailing characters dropped from every reported amount.
pub const UNIT_SUFFIX_LEN: usize = 3;

/// Normalizes a raw amount string.
///
/// Absent, empty or whitespace-only input yields the empty string. Otherwise
/// the trimmed value loses its last [`UNIT_SUFFIX_LEN`] characters; inputs of
/// three characters or fewer therefore normalize to the empty string too.
/// Works on characters rather than bytes and cannot fail.
#[must_use]
pub fn normalize(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return String::new();
    };

    let keep = raw.chars().count().saturating_sub(UNIT_SUFFIX_LEN);
    raw.chars().take(keep).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncates_last_three_characters() {
        assert_eq!(normalize(Some("1000000")), "1000");
        assert_eq!(normalize(Some("500000")), "500");
        assert_eq!(normalize(Some("123456789")), "123456");
        assert_eq!(normalize(Some("1999")), "1");
    }

    #[test]
    fn test_truncation_does_not_round() {
        assert_eq!(normalize(Some("1999999")), "1999");
    }

    #[test]
    fn test_negative_amounts() {
        assert_eq!(normalize(Some("-2500000")), "-2500");
        // Sign counts as a character, as DART text is truncated blindly.
        assert_eq!(normalize(Some("-500")), "-");
    }

    #[test]
    fn test_absent_and_empty() {
        assert_eq!(normalize(None), "");
        assert_eq!(normalize(Some("")), "");
        assert_eq!(normalize(Some("   ")), "");
    }

    #[test]
    fn test_short_inputs_become_empty() {
        assert_eq!(normalize(Some("999")), "");
        assert_eq!(normalize(Some("12")), "");
        assert_eq!(normalize(Some("7")), "");
    }

    #[test]
    fn test_multibyte_input_does_not_panic() {
        assert_eq!(normalize(Some("가나다라마")), "가나");
    }
}
