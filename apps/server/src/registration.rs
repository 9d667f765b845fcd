//! Sign-up and contact form validation.
//!
//! Registration is a two step flow (account, then profile). Every submission
//! reports at most one error: the first check that fails.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MIN_TESTIMONY_LENGTH: usize = 100;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex is valid"));

static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{3,30}$").expect("static regex is valid"));

/// A rejected form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email.trim())
}

pub fn is_valid_username(username: &str) -> bool {
    USERNAME.is_match(username)
}

// =============================================================================
// Password strength
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PasswordStrength {
    /// 0 to 5, one point per satisfied rule
    pub score: u8,
    pub label: &'static str,
}

/// Scores length (8+), lowercase, uppercase, digit and symbol presence
pub fn password_strength(password: &str) -> PasswordStrength {
    let rules = [
        password.chars().count() >= MIN_PASSWORD_LENGTH,
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];
    let score = rules.iter().filter(|ok| **ok).count() as u8;

    let label = match score {
        0 | 1 => "Very Weak",
        2 => "Weak",
        3 => "Fair",
        4 => "Good",
        _ => "Strong",
    };

    PasswordStrength { score, label }
}

// =============================================================================
// Registration flow
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AccountStep {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileStep {
    pub full_name: String,
    pub username: String,
    pub testimony: String,
    #[serde(default)]
    pub agree_to_terms: bool,
    #[serde(default)]
    pub agree_to_guidelines: bool,
}

/// Checks step 1: email format, then matching passwords, then length
pub fn validate_account(account: &AccountStep) -> Result<(), ValidationError> {
    if !is_valid_email(&account.email) {
        return Err(ValidationError::new(
            "email",
            "Please enter a valid email address",
        ));
    }
    if account.password != account.confirm_password {
        return Err(ValidationError::new(
            "confirm_password",
            "Passwords do not match",
        ));
    }
    if account.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::new(
            "password",
            "Password must be at least 8 characters long",
        ));
    }
    Ok(())
}

/// Checks step 2: name, username, testimony length, then agreements
pub fn validate_profile(profile: &ProfileStep) -> Result<(), ValidationError> {
    if profile.full_name.trim().is_empty() {
        return Err(ValidationError::new("full_name", "Full name is required"));
    }
    let username = profile.username.trim();
    if username.is_empty() {
        return Err(ValidationError::new("username", "Username is required"));
    }
    if !is_valid_username(username) {
        return Err(ValidationError::new(
            "username",
            "Username must be 3-30 characters using letters, numbers or underscores",
        ));
    }
    if profile.testimony.trim().chars().count() < MIN_TESTIMONY_LENGTH {
        return Err(ValidationError::new(
            "testimony",
            "Testimony must be at least 100 characters long",
        ));
    }
    if !profile.agree_to_terms || !profile.agree_to_guidelines {
        return Err(ValidationError::new(
            "terms",
            "Please agree to the terms and community guidelines",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStep {
    Account,
    Profile,
    Submitted,
}

/// Validated sign-up data, ready to be stored
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub username: String,
    pub testimony: String,
}

/// Account -> Profile -> Submitted.
///
/// A failed submission keeps the current step and records its single error.
#[derive(Debug)]
pub struct RegistrationFlow {
    step: RegistrationStep,
    account: Option<AccountStep>,
    error: Option<ValidationError>,
}

impl Default for RegistrationFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationFlow {
    pub fn new() -> Self {
        Self {
            step: RegistrationStep::Account,
            account: None,
            error: None,
        }
    }

    pub fn step(&self) -> RegistrationStep {
        self.step
    }

    /// Error from the last submission, if it failed
    pub fn error(&self) -> Option<&ValidationError> {
        self.error.as_ref()
    }

    pub fn submit_account(&mut self, account: AccountStep) -> Result<(), ValidationError> {
        if self.step != RegistrationStep::Account {
            return self.fail(ValidationError::new("step", "Account details already submitted"));
        }
        if let Err(e) = validate_account(&account) {
            return self.fail(e);
        }

        self.account = Some(account);
        self.step = RegistrationStep::Profile;
        self.error = None;
        Ok(())
    }

    /// Returns to the account step, keeping nothing from it
    pub fn back(&mut self) {
        if self.step == RegistrationStep::Profile {
            self.step = RegistrationStep::Account;
            self.account = None;
            self.error = None;
        }
    }

    pub fn submit_profile(&mut self, profile: ProfileStep) -> Result<Registration, ValidationError> {
        if self.step != RegistrationStep::Profile {
            return self.fail(ValidationError::new(
                "step",
                "Complete the account step first",
            ));
        }
        if let Err(e) = validate_profile(&profile) {
            return self.fail(e);
        }

        let Some(account) = self.account.take() else {
            return self.fail(ValidationError::new(
                "step",
                "Complete the account step first",
            ));
        };

        self.step = RegistrationStep::Submitted;
        self.error = None;

        Ok(Registration {
            email: account.email.trim().to_lowercase(),
            password: account.password,
            full_name: profile.full_name.trim().to_string(),
            username: profile.username.trim().to_string(),
            testimony: profile.testimony.trim().to_string(),
        })
    }

    fn fail<T>(&mut self, error: ValidationError) -> Result<T, ValidationError> {
        self.error = Some(error.clone());
        Err(error)
    }
}

// =============================================================================
// Contact form
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

pub fn validate_contact(form: &ContactForm) -> Result<(), ValidationError> {
    if form.name.trim().is_empty() || form.email.trim().is_empty() || form.message.trim().is_empty()
    {
        return Err(ValidationError::new("form", "Please fill in all fields."));
    }
    if !is_valid_email(&form.email) {
        return Err(ValidationError::new(
            "email",
            "Please enter a valid email address.",
        ));
    }
    Ok(())
}
