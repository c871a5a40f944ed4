use crate::queries::username_exists;
use crate::{connection, Database, StoreError};
use folio_model::{slugify, Username, USERNAME_MAX_LEN};

// Leave room for a numeric suffix under the username length cap.
const BASE_MAX_LEN: usize = USERNAME_MAX_LEN - 8;

impl Database {
    /// Allocates an unused slug for a display name: the normalized base
    /// first, then `base-1`, `base-2`, … Probe-then-insert is not atomic;
    /// two racing sign-ups can pick the same candidate and the unique index
    /// on `users.username` rejects the loser.
    pub async fn allocate_username(&self, display_name: &str) -> Result<Username, StoreError> {
        let guard = self.handle().await?;
        let conn = connection(&guard)?;
        let mut base = slugify(display_name);
        if base.is_empty() {
            base = "user".to_string();
        }
        if base.len() > BASE_MAX_LEN {
            base.truncate(BASE_MAX_LEN);
        }
        let mut candidate = base.clone();
        let mut counter = 1u64;
        while username_exists(conn, &candidate)? {
            candidate = format!("{base}-{counter}");
            counter += 1;
        }
        Username::parse(&candidate)
            .map_err(|e| StoreError::Storage(format!("allocated slug invalid: {e}")))
    }
}
