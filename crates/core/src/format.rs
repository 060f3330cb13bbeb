//! Display helpers shared by every action response.

use crate::errors::DomainError;

const MASK_CHAR: char = '*';
const MIN_LICENSE_LEN: usize = 6;

fn strip_separators(value: &str) -> String {
    value.chars().filter(|ch| !matches!(ch, '-' | '_') && !ch.is_whitespace()).collect()
}

/// Calendar-day portion of an ISO-8601 timestamp. No timezone conversion.
pub fn display_date(value: &str) -> String {
    match value.split_once('T') {
        Some((date, _)) => date.to_string(),
        None => value.chars().take(10).collect(),
    }
}

/// Keeps the first and last two characters, masking the rest. Values of four
/// characters or fewer are masked entirely.
pub fn mask_sensitive(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return MASK_CHAR.to_string().repeat(chars.len());
    }

    let mut masked = String::with_capacity(value.len());
    masked.extend(&chars[..2]);
    masked.extend(std::iter::repeat(MASK_CHAR).take(chars.len() - 4));
    masked.extend(&chars[chars.len() - 2..]);
    masked
}

/// `DL123456789` -> `DL-123-456789`. Shorter values come back without separators.
pub fn display_license_number(value: &str) -> String {
    let clean = strip_separators(value);
    let chars: Vec<char> = clean.chars().collect();
    if chars.len() < MIN_LICENSE_LEN {
        return clean;
    }

    let head: String = chars[..2].iter().collect();
    let middle: String = chars[2..5].iter().collect();
    let tail: String = chars[5..].iter().collect();
    format!("{head}-{middle}-{tail}")
}

/// Superficial shape check: at least six characters once separators are
/// removed, ASCII letters and digits only.
pub fn validate_license_number(value: &str) -> Result<(), DomainError> {
    let clean = strip_separators(value);
    let valid = clean.chars().count() >= MIN_LICENSE_LEN
        && clean.chars().all(|ch| ch.is_ascii_alphanumeric());

    if valid {
        Ok(())
    } else {
        Err(DomainError::InvalidLicenseNumber(value.to_string()))
    }
}

/// Case-insensitive comparison of a spoken name against the name on record.
pub fn names_match(supplied: &str, on_record: &str) -> bool {
    let supplied = supplied.trim().to_lowercase();
    !supplied.is_empty() && supplied == on_record.trim().to_lowercase()
}

pub fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
