//! Phone and price formatting.
//!
//! Two families of formatters live here:
//!
//! - **Input formatters** (`format_phone_input`, `format_price_input`) run on
//!   every keystroke and produce the canonical stored value.
//! - **Display formatters** (`display_phone`, `display_price`) run when the
//!   preview is painted. They accept whatever is stored, including values that
//!   were already formatted or carry a different digit count.
//!
//! All four are total: malformed text degrades to an empty string, the input
//! itself, or the "not specified" placeholder. None of them return errors.

/// Maximum number of significant digits kept in a phone number.
pub const PHONE_DIGITS: usize = 10;

/// Currency suffix appended to grouped prices.
pub const CURRENCY_SUFFIX: &str = " TL";

/// Thousands separator of the target locale (tr-TR).
pub const THOUSANDS_SEPARATOR: char = '.';

/// Shown by the preview when no price can be read from the stored value.
pub const PRICE_NOT_SPECIFIED: &str = "Belirtilmemiş";

/// Leading digit of local mobile numbers.
const MOBILE_PREFIX: char = '5';

fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Format a phone number as it is typed.
///
/// Keeps the first ten digits and appends one group each time the digit count
/// crosses 0, 3, 6 and 8: `(ddd`, `) ddd`, ` dd`, ` dd`.
///
/// ```
/// use resital_story::format::format_phone_input;
///
/// assert_eq!(format_phone_input("5551"), "(555) 1");
/// assert_eq!(format_phone_input("555123456789"), "(555) 123 45 67");
/// ```
pub fn format_phone_input(raw: &str) -> String {
    let digits: String = digits_only(raw).chars().take(PHONE_DIGITS).collect();
    if digits.is_empty() {
        return String::new();
    }

    // Every retained character is an ASCII digit, so byte slicing is safe.
    let len = digits.len();
    let mut out = String::with_capacity(15);
    out.push('(');
    out.push_str(&digits[..len.min(3)]);
    if len > 3 {
        out.push_str(") ");
        out.push_str(&digits[3..len.min(6)]);
    }
    if len > 6 {
        out.push(' ');
        out.push_str(&digits[6..len.min(8)]);
    }
    if len > 8 {
        out.push(' ');
        out.push_str(&digits[8..len]);
    }
    out
}

/// Format a price as it is typed: grouped digits followed by ` TL`.
///
/// Leading zeros are dropped like an integer parse would, and the grouping
/// works on the digit string, so magnitude is unbounded.
///
/// ```
/// use resital_story::format::format_price_input;
///
/// assert_eq!(format_price_input("1250000"), "1.250.000 TL");
/// assert_eq!(format_price_input("abc"), "");
/// ```
pub fn format_price_input(raw: &str) -> String {
    match group_thousands(&digits_only(raw)) {
        Some(grouped) => format!("{}{}", grouped, CURRENCY_SUFFIX),
        None => String::new(),
    }
}

/// Re-group a stored phone number for the preview.
///
/// Exactly ten digits become `(ddd) ddd dd dd`. Longer numbers that start with
/// the mobile prefix keep their last ten digits. Any other count yields the
/// stored text unchanged.
pub fn display_phone(stored: &str) -> String {
    let cleaned = digits_only(stored);
    let candidate = if cleaned.len() > PHONE_DIGITS && cleaned.starts_with(MOBILE_PREFIX) {
        &cleaned[cleaned.len() - PHONE_DIGITS..]
    } else {
        cleaned.as_str()
    };

    if candidate.len() != PHONE_DIGITS {
        return stored.to_string();
    }

    format!(
        "({}) {} {} {}",
        &candidate[0..3],
        &candidate[3..6],
        &candidate[6..8],
        &candidate[8..10]
    )
}

/// Re-group a stored price for the preview, or return the placeholder.
pub fn display_price(stored: &str) -> String {
    match group_thousands(&digits_only(stored)) {
        Some(grouped) => format!("{}{}", grouped, CURRENCY_SUFFIX),
        None => PRICE_NOT_SPECIFIED.to_string(),
    }
}

/// Group a string of ASCII digits in threes, locale style. `None` if empty.
pub fn group_thousands(digits: &str) -> Option<String> {
    if digits.is_empty() {
        return None;
    }
    let trimmed = digits.trim_start_matches('0');
    let significant = if trimmed.is_empty() { "0" } else { trimmed };

    let len = significant.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in significant.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(THOUSANDS_SEPARATOR);
        }
        out.push(ch);
    }
    Some(out)
}
