//! Form checks that run before any backend call

use crate::BeaconError;

/// Number of digits in a one-time code
pub const OTP_LENGTH: usize = 6;

/// Minimum accepted length for a new password
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Accept exactly six ASCII digits
pub fn validate_otp(otp: &str) -> crate::Result<()> {
    if otp.len() == OTP_LENGTH && otp.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(BeaconError::Validation(
            "Please enter a valid 6-digit code".to_string(),
        ))
    }
}

/// Check a new password against its confirmation and the length floor
pub fn validate_new_password(new_password: &str, confirm_password: &str) -> crate::Result<()> {
    if new_password != confirm_password {
        return Err(BeaconError::Validation(
            "New passwords do not match.".to_string(),
        ));
    }
    if new_password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(BeaconError::Validation(format!(
            "Password must be at least {} characters long.",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Reject a blank email address
pub fn validate_email(email: &str) -> crate::Result<()> {
    if email.trim().is_empty() {
        return Err(BeaconError::Validation("Email is required".to_string()));
    }
    Ok(())
}
