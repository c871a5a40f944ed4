#![forbid(unsafe_code)]
//! Folio model SSOT.
//!
//! Every record the service persists is defined here, together with the
//! validated identifier types (`Username`, `Email`, `UserId`) the other
//! crates share. No I/O happens in this crate.

mod record;
mod user;

pub use record::{Company, CompanyPatch, PortfolioItem, Testimonial};
pub use user::{
    parse_email, parse_username, slugify, Email, ProfilePatch, User, UserId, Username,
    ValidationError, EMAIL_MAX_LEN, USERNAME_MAX_LEN,
};

pub const CRATE_NAME: &str = "folio-model";
