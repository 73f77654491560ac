use std::sync::LazyLock;

use regex::Regex;

/// Minimum number of digits a phone number must carry
pub const MIN_PHONE_DIGITS: usize = 10;

/// Check `local@domain.tld` shape
pub fn is_valid_email(email: &str) -> bool {
    static REGEX: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex")
    });

    REGEX.is_match(email.trim())
}

/// Strip the separators people type into phone numbers
pub fn strip_phone_separators(phone: &str) -> String {
    phone
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')' | '+'))
        .collect()
}

/// Phone must be all digits (after separators are removed) and at least 10 long
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = strip_phone_separators(phone);
    digits.len() >= MIN_PHONE_DIGITS && digits.chars().all(|c| c.is_ascii_digit())
}
