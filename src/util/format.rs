//! Date, currency and digest formatting.

use chrono::{NaiveDate, NaiveDateTime};
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Reformat `value` from `input_format` to `output_format` (chrono strftime syntax).
/// Returns `value` unchanged when it does not parse or cannot be rendered.
pub fn format_date(value: &str, input_format: &str, output_format: &str) -> String {
    let mut out = String::new();
    let rendered = if let Ok(dt) = NaiveDateTime::parse_from_str(value, input_format) {
        write!(out, "{}", dt.format(output_format))
    } else if let Ok(date) = NaiveDate::parse_from_str(value, input_format) {
        write!(out, "{}", date.format(output_format))
    } else {
        return value.to_string();
    };
    match rendered {
        Ok(()) => out,
        Err(_) => value.to_string(),
    }
}

/// Two decimals, `,` every three integer digits, `-` before the symbol for negatives.
pub fn format_currency(amount: f64, symbol: &str) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}{}.{}", sign, symbol, grouped, frac_part)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    #[default]
    Sha256,
}

/// Lowercase hex digest of the UTF-8 bytes of `data`.
pub fn hash_data(data: &str, algorithm: HashAlgorithm) -> String {
    match algorithm {
        HashAlgorithm::Md5 => hex::encode(Md5::digest(data.as_bytes())),
        HashAlgorithm::Sha1 => hex::encode(Sha1::digest(data.as_bytes())),
        HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data.as_bytes())),
    }
}
