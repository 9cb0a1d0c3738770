//! User identity resolution.
//!
//! Resolution order:
//! 1) The host user's numeric id, when a host exposes a user
//! 2) A guest id `guest_<unix millis>`, generated fresh for every session
//!
//! Guest ids are not persisted anywhere, so a guest's tasks stored under an
//! identity-scoped backend cannot be found again by a later session.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::host::HostEnvironment;

pub const GUEST_PREFIX: &str = "guest_";

static LAST_GUEST_MS: AtomicI64 = AtomicI64::new(0);

/// Opaque per-user key scoping persisted task collections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserIdentity {
    id: String,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidArgument(
                "user identity cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            id: trimmed.to_string(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_guest(&self) -> bool {
        self.id.starts_with(GUEST_PREFIX)
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Resolve the identity for a session. Never fails: a missing host identity
/// falls back to a guest id.
pub async fn resolve(host: &dyn HostEnvironment) -> UserIdentity {
    match host_identity(host) {
        Ok(identity) => {
            tracing::debug!(user = %identity, "resolved host identity");
            identity
        }
        Err(err) => {
            let identity = guest_identity();
            tracing::debug!(reason = %err, user = %identity, "using guest identity");
            identity
        }
    }
}

fn host_identity(host: &dyn HostEnvironment) -> Result<UserIdentity> {
    let user = host.user().ok_or(Error::IdentityUnavailable)?;
    UserIdentity::new(user.id.to_string())
}

/// Generate a guest identity from the current time. Ids handed out within
/// one process are strictly increasing even if the clock has not moved.
pub fn guest_identity() -> UserIdentity {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_GUEST_MS.load(Ordering::SeqCst);
    let millis = loop {
        let next = if now > last { now } else { last + 1 };
        match LAST_GUEST_MS.compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => break next,
            Err(actual) => last = actual,
        }
    };
    UserIdentity {
        id: format!("{GUEST_PREFIX}{millis}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{CloudStorage, HostUser, NoHost};
    use std::sync::Arc;

    struct UserOnlyHost(i64);

    impl HostEnvironment for UserOnlyHost {
        fn user(&self) -> Option<HostUser> {
            Some(HostUser { id: self.0 })
        }

        fn cloud_storage(&self) -> Option<Arc<dyn CloudStorage>> {
            None
        }
    }

    fn is_guest_pattern(id: &str) -> bool {
        id.strip_prefix(GUEST_PREFIX)
            .map(|digits| !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit()))
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn host_user_id_is_stringified() {
        let identity = resolve(&UserOnlyHost(123456789)).await;
        assert_eq!(identity.id(), "123456789");
        assert!(!identity.is_guest());
    }

    #[tokio::test]
    async fn missing_host_falls_back_to_guest() {
        let identity = resolve(&NoHost).await;
        assert!(identity.is_guest());
        assert!(is_guest_pattern(identity.id()), "got {identity}");
    }

    #[tokio::test]
    async fn guest_ids_differ_between_resolutions() {
        let first = resolve(&NoHost).await;
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = resolve(&NoHost).await;
        assert_ne!(first, second);
        assert!(is_guest_pattern(first.id()));
        assert!(is_guest_pattern(second.id()));
    }

    #[test]
    fn guest_ids_unique_within_same_millisecond() {
        let ids: Vec<UserIdentity> = (0..50).map(|_| guest_identity()).collect();
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn empty_identity_rejected() {
        assert!(UserIdentity::new("   ").is_err());
        assert_eq!(UserIdentity::new(" 42 ").expect("identity").id(), "42");
    }
}
