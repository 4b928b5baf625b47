//! Validation utilities for the laptop tracking platform

// ============================================================================
// Identifier Validations
// ============================================================================

/// Normalise a serial number for storage and lookups (trimmed, uppercase)
pub fn normalize_serial_number(serial: &str) -> String {
    serial.trim().to_ascii_uppercase()
}

/// Validate a laptop serial number: 3-100 ASCII letters, digits, dashes or underscores
pub fn validate_serial_number(serial: &str) -> Result<(), &'static str> {
    let serial = serial.trim();
    if serial.len() < 3 {
        return Err("Serial number must be at least 3 characters");
    }
    if serial.len() > 100 {
        return Err("Serial number must be at most 100 characters");
    }
    if !serial
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err("Serial number may only contain letters, digits, '-' and '_'");
    }
    Ok(())
}

/// Validate a JIRA ticket key such as `SCOP-1234`
pub fn validate_jira_ticket(ticket: &str) -> Result<(), &'static str> {
    let (project, number) = ticket
        .trim()
        .split_once('-')
        .ok_or("JIRA ticket must look like PROJECT-123")?;

    if project.is_empty()
        || !project
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_uppercase())
        || !project
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err("JIRA project key must be uppercase letters and digits");
    }
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return Err("JIRA ticket must end in a number");
    }
    Ok(())
}

// ============================================================================
// Upload Validations
// ============================================================================

/// Image extensions accepted for inspection photos
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "heic"];

/// Validate the extension of an uploaded photo and return it lowercased
pub fn validate_photo_filename(filename: &str) -> Result<String, &'static str> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .ok_or("Photo file name has no extension")?;

    if PHOTO_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err("Photo must be a JPG, PNG, WEBP or HEIC image")
    }
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}
