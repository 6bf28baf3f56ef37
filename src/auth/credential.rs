use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::utils::jwt::Claims;

/// Verified caller, added to request extensions by the scope guard.
///
/// Handlers read it with `Extension<Credential>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub subject_id: String,
    /// Space-delimited scope string as carried by the token
    pub granted_scopes: String,
}

impl Credential {
    pub fn new(subject_id: impl Into<String>, granted_scopes: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            granted_scopes: granted_scopes.into(),
        }
    }

    /// Granted scopes as a set; repeated whitespace is ignored.
    pub fn scopes(&self) -> HashSet<&str> {
        self.granted_scopes.split_whitespace().collect()
    }
}

impl From<Claims> for Credential {
    fn from(claims: Claims) -> Self {
        Self {
            subject_id: claims.sub,
            granted_scopes: claims.scope,
        }
    }
}
