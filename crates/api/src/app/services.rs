//! Storage collaborator seam.
//!
//! The core only needs lookups; persistence lives elsewhere. The in-memory
//! directory backs the binary in development and the tests.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use mercato_auth::Owned;

/// An order between a buying and a selling party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub listing_id: String,
    pub quantity: u32,
}

impl Owned for Order {
    fn owner_ids(&self) -> Vec<&str> {
        vec![self.buyer_id.as_str(), self.seller_id.as_str()]
    }
}

/// Lookups the protected routes depend on.
pub trait Directory: Send + Sync {
    fn find_order(&self, id: &str) -> Option<Order>;

    /// Remove a user account. Returns `false` if it did not exist.
    fn remove_user(&self, id: &str) -> bool;
}

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    orders: RwLock<HashMap<String, Order>>,
    users: RwLock<HashSet<String>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(self, order: Order) -> Self {
        self.orders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(order.id.clone(), order);
        self
    }

    pub fn with_user(self, id: impl Into<String>) -> Self {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.into());
        self
    }
}

impl Directory for InMemoryDirectory {
    fn find_order(&self, id: &str) -> Option<Order> {
        self.orders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn remove_user(&self, id: &str) -> bool {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }
}
