//! Request validation helpers.
//!
//! Each helper returns `Err(message)` describing the problem; handlers
//! map the message onto an `ApiError::validation` with the field name.

/// Session codes are uppercase alphanumerics of a fixed length
pub fn validate_session_code(code: &str, expected_length: usize) -> Result<(), String> {
    if code.len() != expected_length {
        return Err(format!("must be exactly {} characters", expected_length));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err("must contain only uppercase letters and digits".to_string());
    }
    Ok(())
}

pub fn validate_display_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("must not be empty".to_string());
    }
    if trimmed.len() > 64 {
        return Err("must be at most 64 characters".to_string());
    }
    Ok(())
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), String> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err("latitude must be between -90 and 90".to_string());
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err("longitude must be between -180 and 180".to_string());
    }
    Ok(())
}

/// Candidate ids are stable ids: non-empty ASCII alphanumerics
pub fn validate_candidate_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("must not be empty".to_string());
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("must contain only ASCII letters and digits".to_string());
    }
    Ok(())
}

pub fn validate_participant_id(id: &str) -> Result<(), String> {
    if id.trim().is_empty() {
        return Err("must not be empty".to_string());
    }
    Ok(())
}

pub fn validate_radius_m(radius_m: u32) -> Result<(), String> {
    if radius_m == 0 {
        return Err("must be greater than zero".to_string());
    }
    if radius_m > 50_000 {
        return Err("must be at most 50000 meters".to_string());
    }
    Ok(())
}
