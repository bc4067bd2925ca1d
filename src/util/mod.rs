//! Standalone helpers: input validation, formatting and hashing, file I/O, network checks.

pub mod files;
pub mod format;
pub mod network;
pub mod validate;

pub use files::{read_csv, read_json, read_text, write_csv, write_json, write_text};
pub use format::{format_currency, format_date, hash_data, HashAlgorithm};
pub use network::{check_connectivity, is_port_open, local_ip};
pub use validate::{is_email, is_phone, is_strong_password, is_url};
