//! Boundary checks applied to request bodies before anything touches the store.

use crate::error::ApiError;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 32;
pub const PASSWORD_MIN: usize = 6;
pub const PROBLEM_TITLE_MIN: usize = 10;
pub const PROBLEM_DESCRIPTION_MIN: usize = 50;

pub fn validate_register(username: &str, email: &str, password: &str) -> Result<(), ApiError> {
    if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::invalid(
            "All fields (email, password, username) are required.",
        ));
    }
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(ApiError::invalid(format!(
            "Username must be between {} and {} characters.",
            USERNAME_MIN, USERNAME_MAX
        )));
    }
    if password.chars().count() < PASSWORD_MIN {
        return Err(ApiError::invalid(format!(
            "Password must be at least {} characters long.",
            PASSWORD_MIN
        )));
    }
    if !looks_like_email(email) {
        return Err(ApiError::invalid("Invalid email format."));
    }
    Ok(())
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ApiError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::invalid("Email and password are required."));
    }
    Ok(())
}

pub fn validate_problem(title: &str, description: &str) -> Result<(), ApiError> {
    let title = title.trim();
    let description = description.trim();
    if title.is_empty() || description.is_empty() {
        return Err(ApiError::invalid("Problem title and description are required."));
    }
    if title.chars().count() < PROBLEM_TITLE_MIN
        || description.chars().count() < PROBLEM_DESCRIPTION_MIN
    {
        return Err(ApiError::invalid(format!(
            "Title must be at least {} characters and description at least {}.",
            PROBLEM_TITLE_MIN, PROBLEM_DESCRIPTION_MIN
        )));
    }
    Ok(())
}

pub fn validate_solution(text: &str) -> Result<(), ApiError> {
    if text.trim().is_empty() {
        return Err(ApiError::invalid("Solution text is required."));
    }
    Ok(())
}

/// `local@domain.tld` with no whitespace.
fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
