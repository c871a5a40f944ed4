use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}

pub const USERNAME_MAX_LEN: usize = 64;
pub const EMAIL_MAX_LEN: usize = 254;

pub fn parse_username(input: &str) -> Result<Username, ValidationError> {
    Username::parse(input)
}

pub fn parse_email(input: &str) -> Result<Email, ValidationError> {
    Email::parse(input)
}

/// Normalizes a display name into a slug base: lowercase, every
/// non-alphanumeric rune mapped to `-`, runs of `-` collapsed.
///
/// `"John Doe"` becomes `john-doe`. The result is not guaranteed to be a
/// valid [`Username`]; an all-symbol input collapses to `-` and an empty
/// input stays empty. Callers pick a fallback base in that case.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_hyphen = false;
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
            last_hyphen = false;
        } else if !last_hyphen {
            out.push('-');
            last_hyphen = true;
        }
    }
    out
}

/// URL-safe unique slug identifying a user's public page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ValidationError("username must not be empty".to_string()));
        }
        if s.len() > USERNAME_MAX_LEN {
            return Err(ValidationError(format!(
                "username exceeds max length {USERNAME_MAX_LEN}"
            )));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ValidationError(
                "username must match [a-z0-9-]+".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ValidationError("email must not be empty".to_string()));
        }
        if s.len() > EMAIL_MAX_LEN {
            return Err(ValidationError(format!(
                "email exceeds max length {EMAIL_MAX_LEN}"
            )));
        }
        let Some((local, domain)) = s.split_once('@') else {
            return Err(ValidationError("email must contain '@'".to_string()));
        };
        if local.is_empty() || domain.is_empty() || !domain.contains('.') {
            return Err(ValidationError("email must be local@domain.tld".to_string()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owner reference shared by every dependent record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The admin's account and public profile. Created on first sign-in, mutated
/// through profile edits, never deleted in-app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub image: String,
    pub username: Username,
    pub location: String,
    pub headline: String,
    pub description: String,
    pub whatsapp: String,
    pub cta_label: String,
    pub cta_url: String,
    pub job_title: String,
    pub job_company: String,
    pub study_course: String,
    pub study_institution: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Partial profile update; `None` leaves the stored field untouched.
/// Username uniqueness is checked by the caller before applying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub image: Option<String>,
    pub username: Option<String>,
    pub location: Option<String>,
    pub headline: Option<String>,
    pub description: Option<String>,
    pub whatsapp: Option<String>,
    pub cta_label: Option<String>,
    pub cta_url: Option<String>,
    pub job_title: Option<String>,
    pub job_company: Option<String>,
    pub study_course: Option<String>,
    pub study_institution: Option<String>,
}

impl ProfilePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.image.is_none()
            && self.username.is_none()
            && self.location.is_none()
            && self.headline.is_none()
            && self.description.is_none()
            && self.whatsapp.is_none()
            && self.cta_label.is_none()
            && self.cta_url.is_none()
            && self.job_title.is_none()
            && self.job_company.is_none()
            && self.study_course.is_none()
            && self.study_institution.is_none()
    }
}
