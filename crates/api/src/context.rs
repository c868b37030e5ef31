use mercato_auth::{Identity, IdentityClaim};

/// Identity context for a request.
///
/// Inserted into request extensions by the identity middleware. Handlers
/// behind the mandatory layer always see `Identity::Verified`; handlers behind
/// the optional layer must handle `Identity::Anonymous`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestContext {
    identity: Identity,
}

impl RequestContext {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    pub fn verified(claim: IdentityClaim) -> Self {
        Self::new(Identity::Verified(claim))
    }

    pub fn anonymous() -> Self {
        Self::new(Identity::Anonymous)
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn claim(&self) -> Option<&IdentityClaim> {
        self.identity.claim()
    }
}
