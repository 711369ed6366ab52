//! Input rules for account and video metadata.

use thiserror::Error;

/// Shortest accepted username.
pub const USERNAME_MIN_LEN: usize = 3;
/// Longest accepted username.
pub const USERNAME_MAX_LEN: usize = 30;
/// Longest accepted display name.
pub const DISPLAY_NAME_MAX_LEN: usize = 50;
/// Longest accepted video title.
pub const TITLE_MAX_LEN: usize = 200;

/// Rejected account or video metadata.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProfileError {
    /// Username has the wrong length or characters.
    #[error("Username must be {USERNAME_MIN_LEN}-{USERNAME_MAX_LEN} characters of a-z, 0-9 or _")]
    InvalidUsername,

    /// Display name is empty or too long.
    #[error("Display name must be 1-{DISPLAY_NAME_MAX_LEN} characters")]
    InvalidDisplayName,

    /// Title is empty or too long.
    #[error("Title must be 1-{TITLE_MAX_LEN} characters")]
    InvalidTitle,

    /// Price is negative.
    #[error("Price cannot be negative: {0}")]
    NegativePrice(i64),
}

/// Lowercases and checks a username.
///
/// # Errors
///
/// Returns `InvalidUsername` unless the result is 3-30 chars of `[a-z0-9_]`.
pub fn normalize_username(raw: &str) -> Result<String, ProfileError> {
    let username = raw.trim().to_lowercase();
    let len = username.chars().count();
    let valid_chars = username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) || !valid_chars {
        return Err(ProfileError::InvalidUsername);
    }
    Ok(username)
}

/// Trims and checks a display name.
///
/// # Errors
///
/// Returns `InvalidDisplayName` if empty after trimming or too long.
pub fn normalize_display_name(raw: &str) -> Result<String, ProfileError> {
    let name = raw.trim();
    let len = name.chars().count();
    if len == 0 || len > DISPLAY_NAME_MAX_LEN {
        return Err(ProfileError::InvalidDisplayName);
    }
    Ok(name.to_string())
}

/// Trims and checks a video title.
///
/// # Errors
///
/// Returns `InvalidTitle` if empty after trimming or too long.
pub fn normalize_title(raw: &str) -> Result<String, ProfileError> {
    let title = raw.trim();
    let len = title.chars().count();
    if len == 0 || len > TITLE_MAX_LEN {
        return Err(ProfileError::InvalidTitle);
    }
    Ok(title.to_string())
}

/// Checks a video price.
///
/// # Errors
///
/// Returns `NegativePrice` for prices below zero.
pub const fn validate_price(price: i64) -> Result<i64, ProfileError> {
    if price < 0 {
        return Err(ProfileError::NegativePrice(price));
    }
    Ok(price)
}
