use crate::StoreError;
use rusqlite::Connection;

/// Idempotent schema init, run once per process on the first open.
pub(crate) fn init(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

         CREATE TABLE IF NOT EXISTS users (
             id                INTEGER PRIMARY KEY,
             email             TEXT NOT NULL,
             name              TEXT NOT NULL,
             image             TEXT NOT NULL DEFAULT '',
             username          TEXT NOT NULL,
             location          TEXT NOT NULL DEFAULT '',
             headline          TEXT NOT NULL DEFAULT '',
             description       TEXT NOT NULL DEFAULT '',
             whatsapp          TEXT NOT NULL DEFAULT '',
             cta_label         TEXT NOT NULL DEFAULT '',
             cta_url           TEXT NOT NULL DEFAULT '',
             job_title         TEXT NOT NULL DEFAULT '',
             job_company       TEXT NOT NULL DEFAULT '',
             study_course      TEXT NOT NULL DEFAULT '',
             study_institution TEXT NOT NULL DEFAULT '',
             created_at        INTEGER NOT NULL,
             updated_at        INTEGER NOT NULL
         );
         CREATE UNIQUE INDEX IF NOT EXISTS users_email_uq ON users(email);
         CREATE UNIQUE INDEX IF NOT EXISTS users_username_uq ON users(username);

         CREATE TABLE IF NOT EXISTS portfolio_items (
             id          INTEGER PRIMARY KEY,
             user_id     INTEGER NOT NULL REFERENCES users(id),
             title       TEXT NOT NULL,
             description TEXT NOT NULL DEFAULT '',
             url         TEXT NOT NULL DEFAULT '',
             image_url   TEXT NOT NULL DEFAULT '',
             position    INTEGER NOT NULL DEFAULT 0,
             created_at  INTEGER NOT NULL
         );
         CREATE INDEX IF NOT EXISTS portfolio_items_user_idx ON portfolio_items(user_id);

         CREATE TABLE IF NOT EXISTS companies (
             id          INTEGER PRIMARY KEY,
             user_id     INTEGER NOT NULL REFERENCES users(id),
             name        TEXT NOT NULL,
             url         TEXT NOT NULL,
             favicon_url TEXT NOT NULL DEFAULT '',
             position    INTEGER NOT NULL DEFAULT 0,
             created_at  INTEGER NOT NULL
         );
         CREATE INDEX IF NOT EXISTS companies_user_idx ON companies(user_id);

         CREATE TABLE IF NOT EXISTS testimonials (
             id           INTEGER PRIMARY KEY,
             user_id      INTEGER NOT NULL REFERENCES users(id),
             author_name  TEXT NOT NULL,
             author_image TEXT NOT NULL DEFAULT '',
             text         TEXT NOT NULL,
             approved     INTEGER NOT NULL DEFAULT 0,
             created_at   INTEGER NOT NULL
         );
         CREATE INDEX IF NOT EXISTS testimonials_user_idx ON testimonials(user_id);",
    )
    .map_err(StoreError::from)
}
