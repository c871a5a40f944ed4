use crate::{
    connection, parse_stored_email, parse_stored_username, unix_seconds, user_id, Database,
    StoreError,
};
use folio_model::{
    Company, CompanyPatch, Email, PortfolioItem, ProfilePatch, Testimonial, User, UserId, Username,
};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

pub struct NewUser {
    pub email: Email,
    pub name: String,
    pub image: String,
    pub username: Username,
}

pub struct NewPortfolioItem {
    pub title: String,
    pub description: String,
    pub url: String,
    pub image_url: String,
}

pub struct NewCompany {
    pub name: String,
    pub url: String,
    pub favicon_url: String,
}

pub struct NewTestimonial {
    pub author_name: String,
    pub author_image: String,
    pub text: String,
}

const USER_COLS: &str = "id, email, name, image, username, location, headline, description, \
                         whatsapp, cta_label, cta_url, job_title, job_company, study_course, \
                         study_institution, created_at, updated_at";

struct UserRow {
    id: i64,
    email: String,
    name: String,
    image: String,
    username: String,
    location: String,
    headline: String,
    description: String,
    whatsapp: String,
    cta_label: String,
    cta_url: String,
    job_title: String,
    job_company: String,
    study_course: String,
    study_institution: String,
    created_at: i64,
    updated_at: i64,
}

fn user_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        image: row.get(3)?,
        username: row.get(4)?,
        location: row.get(5)?,
        headline: row.get(6)?,
        description: row.get(7)?,
        whatsapp: row.get(8)?,
        cta_label: row.get(9)?,
        cta_url: row.get(10)?,
        job_title: row.get(11)?,
        job_company: row.get(12)?,
        study_course: row.get(13)?,
        study_institution: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

fn into_user(r: UserRow) -> Result<User, StoreError> {
    Ok(User {
        id: user_id(r.id),
        email: parse_stored_email(r.email)?,
        name: r.name,
        image: r.image,
        username: parse_stored_username(r.username)?,
        location: r.location,
        headline: r.headline,
        description: r.description,
        whatsapp: r.whatsapp,
        cta_label: r.cta_label,
        cta_url: r.cta_url,
        job_title: r.job_title,
        job_company: r.job_company,
        study_course: r.study_course,
        study_institution: r.study_institution,
        created_at: r.created_at,
        updated_at: r.updated_at,
    })
}

fn get_user(
    conn: &Connection,
    where_sql: &str,
    param: &dyn ToSql,
) -> Result<Option<User>, StoreError> {
    let sql = format!("SELECT {USER_COLS} FROM users WHERE {where_sql}");
    let row = conn
        .query_row(&sql, [param], user_row)
        .optional()
        .map_err(StoreError::from)?;
    row.map(into_user).transpose()
}

pub(crate) fn username_exists(conn: &Connection, candidate: &str) -> Result<bool, StoreError> {
    let hit: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM users WHERE username = ?",
            [candidate],
            |r| r.get(0),
        )
        .optional()
        .map_err(StoreError::from)?;
    Ok(hit.is_some())
}

fn portfolio_row(row: &Row<'_>) -> rusqlite::Result<PortfolioItem> {
    Ok(PortfolioItem {
        id: row.get(0)?,
        user_id: UserId(row.get(1)?),
        title: row.get(2)?,
        description: row.get(3)?,
        url: row.get(4)?,
        image_url: row.get(5)?,
        order: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn company_row(row: &Row<'_>) -> rusqlite::Result<Company> {
    Ok(Company {
        id: row.get(0)?,
        user_id: UserId(row.get(1)?),
        name: row.get(2)?,
        url: row.get(3)?,
        favicon_url: row.get(4)?,
        order: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn testimonial_row(row: &Row<'_>) -> rusqlite::Result<Testimonial> {
    Ok(Testimonial {
        id: row.get(0)?,
        user_id: UserId(row.get(1)?),
        author_name: row.get(2)?,
        author_image: row.get(3)?,
        text: row.get(4)?,
        approved: row.get::<_, i64>(5)? != 0,
        created_at: row.get(6)?,
    })
}

impl Database {
    pub async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let guard = self.handle().await?;
        let conn = connection(&guard)?;
        let now = unix_seconds();
        conn.execute(
            "INSERT INTO users (email, name, image, username, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                new.email.as_str(),
                new.name,
                new.image,
                new.username.as_str(),
                now,
                now
            ],
        )?;
        let id = conn.last_insert_rowid();
        get_user(conn, "id = ?", &id)?.ok_or(StoreError::NotFound)
    }

    pub async fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let guard = self.handle().await?;
        let conn = connection(&guard)?;
        get_user(conn, "id = ?", &id.0)
    }

    pub async fn user_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        let guard = self.handle().await?;
        let conn = connection(&guard)?;
        get_user(conn, "email = ?", &email.as_str())
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let guard = self.handle().await?;
        let conn = connection(&guard)?;
        get_user(conn, "username = ?", &username)
    }

    /// Applies the non-`None` fields of the patch. Username uniqueness and
    /// format are the caller's business; the unique index still backstops a
    /// racing duplicate as [`StoreError::Conflict`].
    pub async fn update_profile(
        &self,
        id: UserId,
        patch: &ProfilePatch,
    ) -> Result<User, StoreError> {
        let guard = self.handle().await?;
        let conn = connection(&guard)?;
        let now = unix_seconds();
        let mut sets: Vec<&'static str> = Vec::new();
        let mut values: Vec<&dyn ToSql> = Vec::new();
        let fields: [(&'static str, &Option<String>); 13] = [
            ("name = ?", &patch.name),
            ("image = ?", &patch.image),
            ("username = ?", &patch.username),
            ("location = ?", &patch.location),
            ("headline = ?", &patch.headline),
            ("description = ?", &patch.description),
            ("whatsapp = ?", &patch.whatsapp),
            ("cta_label = ?", &patch.cta_label),
            ("cta_url = ?", &patch.cta_url),
            ("job_title = ?", &patch.job_title),
            ("job_company = ?", &patch.job_company),
            ("study_course = ?", &patch.study_course),
            ("study_institution = ?", &patch.study_institution),
        ];
        for (clause, value) in &fields {
            if let Some(v) = value {
                sets.push(clause);
                values.push(v);
            }
        }
        sets.push("updated_at = ?");
        values.push(&now);
        values.push(&id.0);
        let sql = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
        let changed = conn.execute(&sql, &values[..])?;
        if changed == 0 {
            return Err(StoreError::NotFound);
        }
        get_user(conn, "id = ?", &id.0)?.ok_or(StoreError::NotFound)
    }

    pub async fn portfolio_for(&self, owner: UserId) -> Result<Vec<PortfolioItem>, StoreError> {
        let guard = self.handle().await?;
        let conn = connection(&guard)?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, title, description, url, image_url, position, created_at
             FROM portfolio_items WHERE user_id = ?
             ORDER BY position ASC, created_at DESC",
        )?;
        let rows = stmt.query_map([owner.0], portfolio_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::from)
    }

    pub async fn create_portfolio_item(
        &self,
        owner: UserId,
        new: NewPortfolioItem,
    ) -> Result<PortfolioItem, StoreError> {
        let guard = self.handle().await?;
        let conn = connection(&guard)?;
        conn.execute(
            "INSERT INTO portfolio_items (user_id, title, description, url, image_url, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                owner.0,
                new.title,
                new.description,
                new.url,
                new.image_url,
                unix_seconds()
            ],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            "SELECT id, user_id, title, description, url, image_url, position, created_at
             FROM portfolio_items WHERE id = ?",
            [id],
            portfolio_row,
        )
        .map_err(StoreError::from)
    }

    /// Owner-scoped, idempotent: a missing or foreign id deletes nothing.
    pub async fn delete_portfolio_item(&self, owner: UserId, id: i64) -> Result<bool, StoreError> {
        let guard = self.handle().await?;
        let conn = connection(&guard)?;
        let changed = conn.execute(
            "DELETE FROM portfolio_items WHERE id = ? AND user_id = ?",
            params![id, owner.0],
        )?;
        Ok(changed > 0)
    }

    pub async fn companies_for(&self, owner: UserId) -> Result<Vec<Company>, StoreError> {
        let guard = self.handle().await?;
        let conn = connection(&guard)?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, url, favicon_url, position, created_at
             FROM companies WHERE user_id = ?
             ORDER BY position ASC, created_at DESC",
        )?;
        let rows = stmt.query_map([owner.0], company_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::from)
    }

    pub async fn create_company(
        &self,
        owner: UserId,
        new: NewCompany,
    ) -> Result<Company, StoreError> {
        let guard = self.handle().await?;
        let conn = connection(&guard)?;
        conn.execute(
            "INSERT INTO companies (user_id, name, url, favicon_url, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![owner.0, new.name, new.url, new.favicon_url, unix_seconds()],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            "SELECT id, user_id, name, url, favicon_url, position, created_at
             FROM companies WHERE id = ?",
            [id],
            company_row,
        )
        .map_err(StoreError::from)
    }

    pub async fn update_company(
        &self,
        owner: UserId,
        id: i64,
        patch: &CompanyPatch,
    ) -> Result<Company, StoreError> {
        let guard = self.handle().await?;
        let conn = connection(&guard)?;
        let mut sets: Vec<&'static str> = Vec::new();
        let mut values: Vec<&dyn ToSql> = Vec::new();
        if let Some(v) = &patch.name {
            sets.push("name = ?");
            values.push(v);
        }
        if let Some(v) = &patch.url {
            sets.push("url = ?");
            values.push(v);
        }
        if let Some(v) = &patch.favicon_url {
            sets.push("favicon_url = ?");
            values.push(v);
        }
        if !sets.is_empty() {
            values.push(&id);
            values.push(&owner.0);
            let sql = format!(
                "UPDATE companies SET {} WHERE id = ? AND user_id = ?",
                sets.join(", ")
            );
            let changed = conn.execute(&sql, &values[..])?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
        }
        conn.query_row(
            "SELECT id, user_id, name, url, favicon_url, position, created_at
             FROM companies WHERE id = ? AND user_id = ?",
            params![id, owner.0],
            company_row,
        )
        .map_err(StoreError::from)
    }

    pub async fn delete_company(&self, owner: UserId, id: i64) -> Result<bool, StoreError> {
        let guard = self.handle().await?;
        let conn = connection(&guard)?;
        let changed = conn.execute(
            "DELETE FROM companies WHERE id = ? AND user_id = ?",
            params![id, owner.0],
        )?;
        Ok(changed > 0)
    }

    /// Owner view: pending submissions first, newest first within each group.
    pub async fn testimonials_for_owner(
        &self,
        owner: UserId,
    ) -> Result<Vec<Testimonial>, StoreError> {
        let guard = self.handle().await?;
        let conn = connection(&guard)?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, author_name, author_image, text, approved, created_at
             FROM testimonials WHERE user_id = ?
             ORDER BY approved DESC, created_at DESC",
        )?;
        let rows = stmt.query_map([owner.0], testimonial_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::from)
    }

    /// Public view: approved records only.
    pub async fn approved_testimonials(
        &self,
        owner: UserId,
    ) -> Result<Vec<Testimonial>, StoreError> {
        let guard = self.handle().await?;
        let conn = connection(&guard)?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, author_name, author_image, text, approved, created_at
             FROM testimonials WHERE user_id = ? AND approved = 1
             ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([owner.0], testimonial_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::from)
    }

    /// Public submission path: always lands unapproved.
    pub async fn create_testimonial(
        &self,
        owner: UserId,
        new: NewTestimonial,
    ) -> Result<Testimonial, StoreError> {
        let guard = self.handle().await?;
        let conn = connection(&guard)?;
        conn.execute(
            "INSERT INTO testimonials (user_id, author_name, author_image, text, approved, created_at)
             VALUES (?, ?, ?, ?, 0, ?)",
            params![
                owner.0,
                new.author_name,
                new.author_image,
                new.text,
                unix_seconds()
            ],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            "SELECT id, user_id, author_name, author_image, text, approved, created_at
             FROM testimonials WHERE id = ?",
            [id],
            testimonial_row,
        )
        .map_err(StoreError::from)
    }

    pub async fn set_testimonial_approved(
        &self,
        owner: UserId,
        id: i64,
        approved: bool,
    ) -> Result<Testimonial, StoreError> {
        let guard = self.handle().await?;
        let conn = connection(&guard)?;
        let changed = conn.execute(
            "UPDATE testimonials SET approved = ? WHERE id = ? AND user_id = ?",
            params![approved as i64, id, owner.0],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound);
        }
        conn.query_row(
            "SELECT id, user_id, author_name, author_image, text, approved, created_at
             FROM testimonials WHERE id = ? AND user_id = ?",
            params![id, owner.0],
            testimonial_row,
        )
        .map_err(StoreError::from)
    }

    pub async fn delete_testimonial(&self, owner: UserId, id: i64) -> Result<bool, StoreError> {
        let guard = self.handle().await?;
        let conn = connection(&guard)?;
        let changed = conn.execute(
            "DELETE FROM testimonials WHERE id = ? AND user_id = ?",
            params![id, owner.0],
        )?;
        Ok(changed > 0)
    }
}
