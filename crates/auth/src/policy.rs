//! Access policy evaluation.
//!
//! Pure decision rules over an [`Identity`]: no IO, no panics. Protected
//! operations call these inline; the API layer maps [`PolicyDenied`] to a
//! status code at a single place.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::{Identity, IdentityClaim, Role};

/// Why a policy denied a request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyDenied {
    /// No verified identity on the request.
    #[error("authentication required")]
    Unauthenticated,

    /// Authenticated, but the role does not satisfy the policy.
    #[error("forbidden: requires one of [{0}]")]
    Forbidden(String),

    /// The resource is not visible to the caller. Used instead of `Forbidden`
    /// so another party's resource is never confirmed to exist.
    #[error("not found")]
    NotFound,

    /// The caller targeted its own account with a destructive action.
    #[error("cannot perform this action on your own account")]
    SelfTarget,
}

impl PolicyDenied {
    /// Structured reason string suitable for a response body.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

/// Resources whose visibility is scoped to one or more owning subjects.
pub trait Owned {
    /// Subject ids that own this resource (e.g. buyer and seller).
    fn owner_ids(&self) -> Vec<&str>;
}

/// Reusable policy evaluator.
///
/// Holds the configured bypass subjects: a fixed operational escape hatch
/// whose members are treated as admin-equivalent regardless of their declared
/// role. This is a known policy exception and is empty unless configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    bypass_subjects: BTreeSet<String>,
}

impl AccessPolicy {
    pub fn new<I, S>(bypass_subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bypass_subjects: bypass_subjects.into_iter().map(Into::into).collect(),
        }
    }

    pub fn bypass_subjects(&self) -> impl Iterator<Item = &str> {
        self.bypass_subjects.iter().map(String::as_str)
    }

    pub fn is_bypass(&self, claim: &IdentityClaim) -> bool {
        self.bypass_subjects.contains(&claim.user_id)
    }

    /// Admin role or bypass subject.
    pub fn is_admin_equivalent(&self, claim: &IdentityClaim) -> bool {
        claim.role.is_admin() || self.is_bypass(claim)
    }

    pub fn require_authenticated<'a>(&self, identity: &'a Identity) -> Result<&'a IdentityClaim, PolicyDenied> {
        identity.claim().ok_or(PolicyDenied::Unauthenticated)
    }

    pub fn require_role<'a>(
        &self,
        identity: &'a Identity,
        allowed: &[Role],
    ) -> Result<&'a IdentityClaim, PolicyDenied> {
        let claim = self.require_authenticated(identity)?;
        if allowed.contains(&claim.role) || self.is_bypass(claim) {
            return Ok(claim);
        }

        tracing::warn!(
            target: "security",
            user_id = %claim.user_id,
            role = %claim.role,
            "role check denied"
        );
        Err(PolicyDenied::Forbidden(
            allowed.iter().map(Role::as_str).collect::<Vec<_>>().join(", "),
        ))
    }

    pub fn require_admin<'a>(&self, identity: &'a Identity) -> Result<&'a IdentityClaim, PolicyDenied> {
        self.require_role(identity, &[Role::Admin])
    }

    /// Allow when the subject matches at least one owner field.
    ///
    /// A mismatch is reported as `NotFound`.
    pub fn require_ownership<'a>(
        &self,
        identity: &'a Identity,
        owner_fields: &[&str],
    ) -> Result<&'a IdentityClaim, PolicyDenied> {
        let claim = self.require_authenticated(identity)?;
        if owner_fields.iter().any(|owner| *owner == claim.user_id) {
            Ok(claim)
        } else {
            Err(PolicyDenied::NotFound)
        }
    }

    /// Ownership over a looked-up resource; a missing resource is `NotFound` too.
    pub fn require_owned<'a, R: Owned>(
        &self,
        identity: &'a Identity,
        resource: Option<&R>,
    ) -> Result<&'a IdentityClaim, PolicyDenied> {
        let claim = self.require_authenticated(identity)?;
        match resource {
            Some(r) => self.require_ownership(identity, &r.owner_ids()),
            None => {
                tracing::debug!(user_id = %claim.user_id, "owned resource not found");
                Err(PolicyDenied::NotFound)
            }
        }
    }

    /// Authenticated AND (admin-equivalent OR owner).
    ///
    /// Admin role and bypass subjects short-circuit the ownership comparison.
    pub fn require_owner_or_admin<'a>(
        &self,
        identity: &'a Identity,
        owner_fields: &[&str],
    ) -> Result<&'a IdentityClaim, PolicyDenied> {
        let claim = self.require_authenticated(identity)?;
        if self.is_admin_equivalent(claim) {
            return Ok(claim);
        }
        self.require_ownership(identity, owner_fields)
    }

    /// Deny destructive account actions that target the caller itself.
    ///
    /// Evaluated independently of role: admins cannot delete themselves either.
    pub fn forbid_self_target<'a>(
        &self,
        identity: &'a Identity,
        target_subject: &str,
    ) -> Result<&'a IdentityClaim, PolicyDenied> {
        let claim = self.require_authenticated(identity)?;
        if claim.user_id == target_subject {
            tracing::warn!(target: "security", user_id = %claim.user_id, "self-targeted action denied");
            return Err(PolicyDenied::SelfTarget);
        }
        Ok(claim)
    }
}

/// Declarative access rule attached to a protected operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRule {
    Public,
    Authenticated,
    AdminOnly,
    Roles(Vec<Role>),
    /// Owner of the resource, or admin-equivalent.
    OwnerOrAdmin,
}

impl AccessRule {
    /// Evaluate the rule. `owner_fields` is only consulted by `OwnerOrAdmin`.
    ///
    /// Returns the verified claim when one is present, `None` for a public
    /// rule evaluated without identity.
    pub fn evaluate<'a>(
        &self,
        policy: &AccessPolicy,
        identity: &'a Identity,
        owner_fields: &[&str],
    ) -> Result<Option<&'a IdentityClaim>, PolicyDenied> {
        match self {
            AccessRule::Public => Ok(identity.claim()),
            AccessRule::Authenticated => policy.require_authenticated(identity).map(Some),
            AccessRule::AdminOnly => policy.require_admin(identity).map(Some),
            AccessRule::Roles(roles) => policy.require_role(identity, roles).map(Some),
            AccessRule::OwnerOrAdmin => policy.require_owner_or_admin(identity, owner_fields).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AccessPolicy {
        AccessPolicy::new(["dev-user-123"])
    }

    fn identity(user_id: &str, role: Role) -> Identity {
        Identity::Verified(IdentityClaim::new(user_id, format!("{user_id}@example.com"), role))
    }

    struct Order {
        buyer_id: String,
        seller_id: String,
    }

    impl Owned for Order {
        fn owner_ids(&self) -> Vec<&str> {
            vec![self.buyer_id.as_str(), self.seller_id.as_str()]
        }
    }

    #[test]
    fn anonymous_is_unauthenticated() {
        let p = policy();
        assert_eq!(p.require_authenticated(&Identity::Anonymous), Err(PolicyDenied::Unauthenticated));
        assert_eq!(p.require_admin(&Identity::Anonymous), Err(PolicyDenied::Unauthenticated));
        assert_eq!(
            p.require_ownership(&Identity::Anonymous, &["U1"]),
            Err(PolicyDenied::Unauthenticated)
        );
    }

    #[test]
    fn role_enforcement() {
        let p = policy();

        assert_eq!(
            p.require_role(&identity("U1", Role::Retailer), &[Role::Admin]),
            Err(PolicyDenied::Forbidden("admin".to_string()))
        );
        assert!(p.require_role(&identity("U2", Role::Admin), &[Role::Admin]).is_ok());
        assert!(
            p.require_role(&identity("U3", Role::Manufacturer), &[Role::Wholesaler, Role::Manufacturer])
                .is_ok()
        );
    }

    #[test]
    fn bypass_subject_is_admin_equivalent_regardless_of_role() {
        let p = policy();
        let dev = identity("dev-user-123", Role::Retailer);

        assert!(p.require_role(&dev, &[Role::Admin]).is_ok());
        assert!(p.require_owner_or_admin(&dev, &["someone-else"]).is_ok());

        // Without configuration the same subject is an ordinary retailer.
        assert!(AccessPolicy::default().require_role(&dev, &[Role::Admin]).is_err());
    }

    #[test]
    fn ownership_mismatch_is_hidden() {
        let p = policy();
        let u1 = identity("U1", Role::Retailer);

        assert!(p.require_ownership(&u1, &["U1"]).is_ok());
        assert_eq!(p.require_ownership(&u1, &["U2"]), Err(PolicyDenied::NotFound));
        assert!(p.require_ownership(&u1, &["U2", "U1"]).is_ok());
        assert_eq!(p.require_ownership(&u1, &[]), Err(PolicyDenied::NotFound));
    }

    #[test]
    fn owned_resource_any_owner_field() {
        let p = policy();
        let order = Order {
            buyer_id: "B".to_string(),
            seller_id: "S".to_string(),
        };

        assert!(p.require_owned(&identity("B", Role::Retailer), Some(&order)).is_ok());
        assert!(p.require_owned(&identity("S", Role::Wholesaler), Some(&order)).is_ok());
        assert_eq!(
            p.require_owned(&identity("X", Role::Retailer), Some(&order)),
            Err(PolicyDenied::NotFound)
        );
        assert_eq!(
            p.require_owned::<Order>(&identity("B", Role::Retailer), None),
            Err(PolicyDenied::NotFound)
        );
    }

    #[test]
    fn admin_short_circuits_ownership() {
        let p = policy();
        assert!(p.require_owner_or_admin(&identity("A", Role::Admin), &["U2"]).is_ok());
        assert_eq!(
            p.require_owner_or_admin(&identity("U1", Role::Retailer), &["U2"]),
            Err(PolicyDenied::NotFound)
        );
        assert_eq!(
            p.require_owner_or_admin(&Identity::Anonymous, &["U2"]),
            Err(PolicyDenied::Unauthenticated)
        );
    }

    #[test]
    fn self_target_denied_even_for_admin() {
        let p = policy();
        let admin = identity("A", Role::Admin);

        assert_eq!(p.forbid_self_target(&admin, "A"), Err(PolicyDenied::SelfTarget));
        assert!(p.forbid_self_target(&admin, "U1").is_ok());
        assert_eq!(
            p.forbid_self_target(&identity("dev-user-123", Role::Retailer), "dev-user-123"),
            Err(PolicyDenied::SelfTarget)
        );
    }

    #[test]
    fn declarative_rules() {
        let p = policy();
        let anon = Identity::Anonymous;
        let retailer = identity("U1", Role::Retailer);

        assert_eq!(AccessRule::Public.evaluate(&p, &anon, &[]), Ok(None));
        assert!(matches!(AccessRule::Public.evaluate(&p, &retailer, &[]), Ok(Some(_))));
        assert_eq!(
            AccessRule::Authenticated.evaluate(&p, &anon, &[]),
            Err(PolicyDenied::Unauthenticated)
        );
        assert!(matches!(
            AccessRule::AdminOnly.evaluate(&p, &retailer, &[]),
            Err(PolicyDenied::Forbidden(_))
        ));
        assert!(AccessRule::Roles(vec![Role::Retailer]).evaluate(&p, &retailer, &[]).is_ok());
        assert!(AccessRule::OwnerOrAdmin.evaluate(&p, &retailer, &["U1"]).is_ok());
        assert_eq!(
            AccessRule::OwnerOrAdmin.evaluate(&p, &retailer, &["U9"]),
            Err(PolicyDenied::NotFound)
        );
    }
}
