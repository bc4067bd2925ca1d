//! Input validators. Each returns false rather than failing.

use regex::Regex;
use std::sync::OnceLock;

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$";
const PHONE_PATTERN: &str = r"^\+?1?\d{9,15}$";

fn is_match(cell: &'static OnceLock<Option<Regex>>, pattern: &str, input: &str) -> bool {
    cell.get_or_init(|| Regex::new(pattern).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(input))
}

pub fn is_email(email: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    is_match(&RE, EMAIL_PATTERN, email)
}

/// Spaces, dashes, dots and parentheses are ignored; what remains must be 9 to 15 digits with
/// an optional leading `+` and country code 1.
pub fn is_phone(phone: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    let digits: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();
    is_match(&RE, PHONE_PATTERN, &digits)
}

/// At least 8 characters with an uppercase letter, a lowercase letter and a digit.
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| c.is_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

pub fn is_url(url: &str) -> bool {
    reqwest::Url::parse(url)
        .map(|u| !u.scheme().is_empty() && u.host_str().is_some_and(|h| !h.is_empty()))
        .unwrap_or(false)
}
