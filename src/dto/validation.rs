//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::codes::{ROOM_CODE_ALPHABET, ROOM_CODE_LENGTH};

/// Longest display name accepted when joining a room.
pub const MAX_DISPLAY_NAME_LENGTH: usize = 20;

/// Validates that a join code is exactly six characters from the
/// ambiguity-free room-code alphabet.
pub fn validate_room_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != ROOM_CODE_LENGTH {
        let mut err = ValidationError::new("room_code_length");
        err.message = Some(
            format!(
                "Room code must be exactly {} characters (got {})",
                ROOM_CODE_LENGTH,
                code.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)) {
        let mut err = ValidationError::new("room_code_format");
        err.message =
            Some("Room code must contain only uppercase letters and digits 2-9".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a player display name: non-empty after trimming, at most
/// [`MAX_DISPLAY_NAME_LENGTH`] characters, word characters/spaces/hyphens.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("display_name_empty");
        err.message = Some("Display name must not be empty".into());
        return Err(err);
    }

    if trimmed.chars().count() > MAX_DISPLAY_NAME_LENGTH {
        let mut err = ValidationError::new("display_name_length");
        err.message = Some(
            format!("Display name must be at most {MAX_DISPLAY_NAME_LENGTH} characters").into(),
        );
        return Err(err);
    }

    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == ' ')
    {
        let mut err = ValidationError::new("display_name_format");
        err.message = Some(
            "Display name can only contain letters, numbers, spaces, and hyphens".into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Normalize a display name for storage: trimmed and capped.
pub fn sanitize_display_name(name: &str) -> String {
    name.trim()
        .chars()
        .take(MAX_DISPLAY_NAME_LENGTH)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_room_code_valid() {
        assert!(validate_room_code("ABCDEF").is_ok());
        assert!(validate_room_code("X2Y3Z4").is_ok());
        assert!(validate_room_code("234567").is_ok());
    }

    #[test]
    fn test_validate_room_code_invalid_length() {
        assert!(validate_room_code("ABCDE").is_err()); // too short
        assert!(validate_room_code("ABCDEFG").is_err()); // too long
        assert!(validate_room_code("").is_err()); // empty
    }

    #[test]
    fn test_validate_room_code_invalid_format() {
        assert!(validate_room_code("abcdef").is_err()); // lowercase
        assert!(validate_room_code("ABCDE0").is_err()); // ambiguous zero
        assert!(validate_room_code("ABCDE1").is_err()); // ambiguous one
        assert!(validate_room_code("ABCDEO").is_err()); // ambiguous O
        assert!(validate_room_code("ABC DE").is_err()); // space
    }

    #[test]
    fn test_validate_display_name() {
        assert!(validate_display_name("Ada").is_ok());
        assert!(validate_display_name("Team Rocket-2").is_ok());
        assert!(validate_display_name("   ").is_err());
        assert!(validate_display_name("no@email").is_err());
        assert!(validate_display_name(&"x".repeat(21)).is_err());
    }

    #[test]
    fn test_sanitize_display_name() {
        assert_eq!(sanitize_display_name("  Ada  "), "Ada");
        assert_eq!(sanitize_display_name(&"y".repeat(30)).len(), 20);
    }
}
