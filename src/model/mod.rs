//! PPDA backend data model module.
//!
//! # Purpose
//! Re-exports the user/institution/membership/ppda records and the refresh
//! token row used by the auth core, API handlers, and store backends.
mod institution;
mod membership;
mod ppda;
mod refresh;
mod user;

pub use institution::Institution;
pub use membership::{Role, UserInstitution};
pub use ppda::{Ppda, PpdaPatch};
pub use refresh::RefreshToken;
pub use user::{User, UserPatch};

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current wall-clock time as whole epoch seconds.
///
/// Timestamps are stored as integer epochs throughout (creation, update, and
/// token expiry columns). If the clock is skewed before the epoch, clamp to
/// zero to avoid panics.
pub fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs() as i64
}
