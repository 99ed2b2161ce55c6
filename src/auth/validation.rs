pub const PASSWORDS_DO_NOT_MATCH: &str = "Passwords do not match";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters long";
pub const INVALID_EMAIL: &str = "Please enter a valid email address";
pub const EMAIL_TAKEN: &str =
    "An account with this email already exists. Please sign in instead.";
pub const INVALID_CREDENTIALS: &str = "Invalid email or password. Please try again.";
pub const EMAIL_NOT_VERIFIED: &str =
    "Please verify your email before logging in. Check your inbox for the verification link.";
pub const STAFF_TYPE_REQUIRED: &str = "Please select your staff type.";
pub const ROLE_ALREADY_SET: &str = "Your role is already set. Ask an administrator to change it.";
pub const ROLE_NEEDS_ADMIN: &str = "That role is assigned by an administrator.";

const MIN_PASSWORD_LEN: usize = 6;
const MIN_EMAIL_LEN: usize = 5;

/// Sign-up form checks, first failure wins: confirmation, length, then email shape.
pub fn validate_sign_up(email: &str, password: &str, confirm: &str) -> Result<(), &'static str> {
    if password != confirm {
        return Err(PASSWORDS_DO_NOT_MATCH);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PASSWORD_TOO_SHORT);
    }
    let email = email.trim();
    if !email.contains('@') || email.len() < MIN_EMAIL_LEN {
        return Err(INVALID_EMAIL);
    }
    Ok(())
}
