//! Guest session identity.
//!
//! Identity is owned by an external auth service. The checkout only reads
//! the opaque guest identifier to pre-fill the email field.

/// Source of the signed-in guest's identifier
pub trait GuestSession: Send + Sync {
    /// Current guest identifier, if anyone is signed in
    fn guest_id(&self) -> Option<String>;
}

/// Session with a fixed identifier
#[derive(Clone, Debug, Default)]
pub struct StaticSession {
    guest_id: Option<String>,
}

impl StaticSession {
    /// Session for a signed-in guest
    ///
    /// A blank identifier is treated as signed out.
    #[must_use]
    pub fn new(guest_id: impl Into<String>) -> Self {
        let guest_id = guest_id.into();
        Self {
            guest_id: (!guest_id.trim().is_empty()).then_some(guest_id),
        }
    }

    /// Session with nobody signed in
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { guest_id: None }
    }
}

impl GuestSession for StaticSession {
    fn guest_id(&self) -> Option<String> {
        self.guest_id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_id_is_anonymous() {
        assert_eq!(StaticSession::new("  ").guest_id(), None);
        assert_eq!(StaticSession::anonymous().guest_id(), None);
        assert_eq!(
            StaticSession::new("ada@example.com").guest_id().as_deref(),
            Some("ada@example.com")
        );
    }
}
