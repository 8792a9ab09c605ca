//! Who is performing a request
//!
//! Session handling is not this crate's business: the surrounding application authenticates
//! the request (cookie, PIN, whatever) and resolves it into an [`Identity`] that is passed
//! to every [`Agenda`](crate::agenda::Agenda) operation. The crate treats it as authoritative.

use serde::{Deserialize, Serialize};

/// The internal identifier of a user
pub type UserId = String;

/// An authenticated caller, as resolved by the application's session layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    /// Admins may act on other users' tasks (assign, update, delete)
    pub is_admin: bool,
}

impl Identity {
    /// A regular user
    pub fn user<S: ToString>(user_id: S) -> Self {
        Self {
            user_id: user_id.to_string(),
            is_admin: false,
        }
    }

    /// A user with the admin role
    pub fn admin<S: ToString>(user_id: S) -> Self {
        Self {
            user_id: user_id.to_string(),
            is_admin: true,
        }
    }

    /// Whether this caller may act on a resource owned by `owner`
    pub fn can_act_on(&self, owner: &UserId) -> bool {
        self.is_admin || &self.user_id == owner
    }
}
