//! Form field validation for signup, login, and account settings.
//!
//! Invalid input disables the submit action instead of raising an error, so
//! every check is a plain predicate. `validate_signup` collects the failing
//! fields for highlighting.

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;

use std::sync::LazyLock;

use regex::Regex;

pub const MIN_CREDENTIAL_LEN: usize = 6;
pub const MAX_CREDENTIAL_LEN: usize = 30;

static USERNAME_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{6,30}$").ok());
static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[A-Za-z]{2,}$").ok());

fn matches(re: &LazyLock<Option<Regex>>, input: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(input))
}

/// Letters, digits, and underscores, 6 to 30 long.
#[must_use]
pub fn is_valid_username(username: &str) -> bool {
    matches(&USERNAME_RE, username)
}

/// 6 to 30 characters with at least one letter and one digit, no whitespace.
#[must_use]
pub fn is_valid_password(password: &str) -> bool {
    let len = password.chars().count();
    (MIN_CREDENTIAL_LEN..=MAX_CREDENTIAL_LEN).contains(&len)
        && !password.chars().any(char::is_whitespace)
        && password.chars().any(char::is_alphabetic)
        && password.chars().any(|c| c.is_ascii_digit())
}

/// 2 to 20 characters with no leading or trailing whitespace.
#[must_use]
pub fn is_valid_nickname(nickname: &str) -> bool {
    let len = nickname.chars().count();
    (2..=20).contains(&len) && nickname.trim() == nickname
}

#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    matches(&EMAIL_RE, email)
}

/// A signup form field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Username,
    Password,
    PasswordConfirm,
    Nickname,
    Email,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub password_confirm: String,
    pub nickname: String,
    pub email: String,
}

/// Fields of `form` that fail validation, in form order. Empty means submittable.
#[must_use]
pub fn validate_signup(form: &SignupForm) -> Vec<Field> {
    let mut invalid = Vec::new();
    if !is_valid_username(&form.username) {
        invalid.push(Field::Username);
    }
    if !is_valid_password(&form.password) {
        invalid.push(Field::Password);
    }
    if form.password != form.password_confirm {
        invalid.push(Field::PasswordConfirm);
    }
    if !is_valid_nickname(&form.nickname) {
        invalid.push(Field::Nickname);
    }
    if !is_valid_email(&form.email) {
        invalid.push(Field::Email);
    }
    invalid
}

/// Login only needs both fields within length bounds.
#[must_use]
pub fn can_submit_login(username: &str, password: &str) -> bool {
    let within = |s: &str| (MIN_CREDENTIAL_LEN..=MAX_CREDENTIAL_LEN).contains(&s.chars().count());
    within(username) && within(password)
}
