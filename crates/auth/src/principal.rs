use crate::{IdentityClaim, Role};

/// Identity attached to a request after credential extraction.
///
/// `Anonymous` is a valid, distinguishable state (no credential, or the
/// credential did not verify in optional mode), never an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identity {
    Verified(IdentityClaim),
    #[default]
    Anonymous,
}

impl Identity {
    pub fn claim(&self) -> Option<&IdentityClaim> {
        match self {
            Identity::Verified(claim) => Some(claim),
            Identity::Anonymous => None,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Identity::Verified(_))
    }

    pub fn subject(&self) -> Option<&str> {
        self.claim().map(|c| c.user_id.as_str())
    }

    pub fn role(&self) -> Option<Role> {
        self.claim().map(|c| c.role)
    }
}

impl From<IdentityClaim> for Identity {
    fn from(value: IdentityClaim) -> Self {
        Identity::Verified(value)
    }
}

impl From<Option<IdentityClaim>> for Identity {
    fn from(value: Option<IdentityClaim>) -> Self {
        value.map_or(Identity::Anonymous, Identity::Verified)
    }
}
