// Signup and login forms

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::FormErrors;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"));

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const RESERVED_USERNAME: &str = "This username is reserved.";
pub const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";
pub const INVALID_LOGIN: &str = "Please enter a correct username and password.";

/// First path segments owned by fixed routes; a profile there could never be reached.
const RESERVED_USERNAMES: &[&str] = &["new", "follow", "group", "auth", "about", "media"];

pub fn is_reserved_username(username: &str) -> bool {
    RESERVED_USERNAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(username))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SignupForm {
    #[validate(length(min = 1, max = 150, message = "Enter a username of at most 150 characters."))]
    pub username: String,
    #[serde(skip_serializing)]
    #[validate(length(min = 8, message = "This password is too short. It must contain at least 8 characters."))]
    pub password1: String,
    #[serde(skip_serializing)]
    pub password2: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub username: String,
    #[serde(skip_serializing)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
    pub next: Option<String>,
}

impl SignupForm {
    /// Field-level checks; username uniqueness is checked against the database by the view.
    pub fn clean(&self) -> Result<(), FormErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FormErrors::new(),
            Err(validation) => FormErrors::from(validation),
        };
        if !self.username.is_empty() && !USERNAME_RE.is_match(&self.username) {
            errors.add("username", INVALID_USERNAME);
        } else if is_reserved_username(&self.username) {
            errors.add("username", RESERVED_USERNAME);
        }
        if self.password1 != self.password2 {
            errors.add("password2", PASSWORD_MISMATCH);
        }
        errors.into_result()
    }
}

impl LoginForm {
    pub fn clean(&self) -> Result<(), FormErrors> {
        self.validate().map_err(FormErrors::from)
    }
}

/// Only local absolute paths are followed after login.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path,
        _ => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(username: &str, password1: &str, password2: &str) -> SignupForm {
        SignupForm {
            username: username.to_string(),
            password1: password1.to_string(),
            password2: password2.to_string(),
        }
    }

    #[test]
    fn test_signup_validation() {
        assert!(signup("john", "long enough", "long enough").clean().is_ok());
        assert!(signup("Nagibator2007", "long enough", "long enough").clean().is_ok());
        assert!(signup("иван", "long enough", "long enough").clean().is_ok());

        let errors = signup("john doe", "long enough", "long enough").clean().unwrap_err();
        assert_eq!(errors.get("username").unwrap(), [INVALID_USERNAME.to_string()]);

        let errors = signup("john", "short", "short").clean().unwrap_err();
        assert!(errors.has("password1"));

        let errors = signup("john", "long enough", "long enougH").clean().unwrap_err();
        assert_eq!(errors.get("password2").unwrap(), [PASSWORD_MISMATCH.to_string()]);

        let errors = signup(&"x".repeat(151), "long enough", "long enough").clean().unwrap_err();
        assert!(errors.has("username"));
    }

    #[test]
    fn test_reserved_usernames() {
        for name in ["new", "follow", "group", "auth", "about", "media", "Media"] {
            let errors = signup(name, "long enough", "long enough").clean().unwrap_err();
            assert_eq!(errors.get("username").unwrap(), [RESERVED_USERNAME.to_string()], "{}", name);
        }
        assert!(signup("newton", "long enough", "long enough").clean().is_ok());
    }

    #[test]
    fn test_passwords_are_not_serialized() {
        let json = serde_json::to_value(signup("john", "secret123", "secret123")).unwrap();
        assert!(json.get("password1").is_none());
        assert!(json.get("password2").is_none());
        assert_eq!(json["username"], "john");
    }

    #[test]
    fn test_login_requires_both_fields() {
        let form = LoginForm {
            username: "john".to_string(),
            password: String::new(),
            next: None,
        };
        assert!(form.clean().unwrap_err().has("password"));
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/new/")), "/new/");
        assert_eq!(safe_next(Some("//evil.example/")), "/");
        assert_eq!(safe_next(Some("https://evil.example/")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
