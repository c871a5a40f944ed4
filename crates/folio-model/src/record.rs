use crate::user::UserId;
use serde::{Deserialize, Serialize};

/// One entry on the owner's public portfolio grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioItem {
    pub id: i64,
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub url: String,
    pub image_url: String,
    pub order: i64,
    pub created_at: i64,
}

/// A company endorsement row (name + link + favicon).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub user_id: UserId,
    pub name: String,
    pub url: String,
    pub favicon_url: String,
    pub order: i64,
    pub created_at: i64,
}

/// Partial company update; `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub url: Option<String>,
    pub favicon_url: Option<String>,
}

/// Visitor-submitted testimonial. `approved` defaults to false and only the
/// owner flips it; the public page never shows unapproved records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: i64,
    pub user_id: UserId,
    pub author_name: String,
    pub author_image: String,
    pub text: String,
    pub approved: bool,
    pub created_at: i64,
}
