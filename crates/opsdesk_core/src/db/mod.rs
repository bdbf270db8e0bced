//! SQLite container for the embedded persistence binding.
//!
//! The container is one `kv_store` table holding serialized documents. Its
//! layout version lives in `PRAGMA user_version` and is independent of the
//! document `schemaVersion`: a newer container is refused, while a stale
//! document inside a current container is reseeded by the repository.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;

pub use open::{container_version, open_db, open_db_in_memory};

/// Container layout written by this build.
pub const CONTAINER_VERSION: u32 = 1;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was written by a newer build with a different table layout.
    NewerContainer { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::NewerContainer { found, supported } => write!(
                f,
                "database container version {found} is newer than supported {supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::NewerContainer { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
