//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_relay;
pub use validate::run_validate;

/// Mask a secret for display, keeping the last four characters
pub(crate) fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.is_empty() {
        return "(not set)".to_string();
    }
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}
