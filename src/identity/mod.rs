use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storefront roles. Derived from the account email, not a security model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
}

impl Role {
    /// `@seller` addresses are sellers, `@user` addresses are buyers,
    /// anything else has no storefront role.
    pub fn from_email(email: &str) -> Option<Role> {
        if email.contains("@seller") {
            Some(Role::Seller)
        } else if email.contains("@user") {
            Some(Role::Buyer)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Buyer => write!(f, "buyer"),
            Role::Seller => write!(f, "seller"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("invalid email: {0}")]
    InvalidEmail(String),

    #[error("no storefront role for email: {0}")]
    NoRole(String),
}

/// In-memory account directory. Answers the two questions the managers ask:
/// who is this user, and do they hold the seller role.
#[derive(Default)]
pub struct Directory {
    users: RwLock<HashMap<String, UserAccount>>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<UserAccount, IdentityError> {
        let email = email.into();
        if !email.contains('@') {
            return Err(IdentityError::InvalidEmail(email));
        }
        let role = Role::from_email(&email).ok_or_else(|| IdentityError::NoRole(email.clone()))?;
        let account = UserAccount {
            id: id.into(),
            name: name.into(),
            email,
            role,
        };
        self.users
            .write()
            .insert(account.id.clone(), account.clone());
        Ok(account)
    }

    pub fn get(&self, user_id: &str) -> Option<UserAccount> {
        self.users.read().get(user_id).cloned()
    }

    pub fn role_of(&self, user_id: &str) -> Option<Role> {
        self.users.read().get(user_id).map(|u| u.role)
    }

    pub fn is_seller(&self, user_id: &str) -> bool {
        self.role_of(user_id) == Some(Role::Seller)
    }
}
