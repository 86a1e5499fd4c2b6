//! Record-level access control.
//!
//! Every diary record belongs to exactly one user, and only that user may
//! read or change it.

use tracing::warn;

use crate::db::{Article, Category, Entry};
use crate::error::{Error, Result};
use crate::middleware::AuthUser;

/// A record with a single owning user.
pub trait Owned {
    fn owner_id(&self) -> i64;
}

impl Owned for Entry {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

impl Owned for Category {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

impl Owned for Article {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

/// Allow access only when `identity` owns `record`.
///
/// Anonymous callers get `Unauthenticated`; other users get `Forbidden`.
pub fn authorize<T: Owned>(identity: Option<&AuthUser>, record: &T) -> Result<()> {
    let identity = identity.ok_or(Error::Unauthenticated)?;

    if record.owner_id() != identity.user_id {
        warn!(
            user_id = identity.user_id,
            owner_id = record.owner_id(),
            "Denied access to record owned by another user"
        );
        return Err(Error::Forbidden);
    }

    Ok(())
}
