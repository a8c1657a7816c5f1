//! Phone number normalization.

/// Default international dialing prefix (Brazil).
pub const DEFAULT_COUNTRY_CODE: &str = "55";

/// Keep only ASCII digits.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Strip non-digits and prepend `country_code` when missing.
///
/// Returns `None` when the input has no digits at all. Idempotent:
/// normalizing an already-normalized number returns it unchanged.
pub fn normalize_phone(raw: &str, country_code: &str) -> Option<String> {
    let digits = digits_only(raw);
    if digits.is_empty() {
        return None;
    }

    if digits.starts_with(country_code) {
        Some(digits)
    } else {
        Some(format!("{}{}", country_code, digits))
    }
}
