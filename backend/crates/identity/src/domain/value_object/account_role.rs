use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IdentityError, IdentityResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum AccountRole {
    #[default]
    User = 0,
    Moderator = 1,
    Admin = 2,
}

impl AccountRole {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        use AccountRole::*;
        match self {
            User => "user",
            Moderator => "moderator",
            Admin => "admin",
        }
    }

    #[inline]
    pub const fn is_moderator_or_higher(&self) -> bool {
        use AccountRole::*;
        matches!(self, Moderator | Admin)
    }

    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, AccountRole::Admin)
    }

    pub fn from_id(id: i16) -> IdentityResult<Self> {
        use AccountRole::*;
        match id {
            0 => Ok(User),
            1 => Ok(Moderator),
            2 => Ok(Admin),
            _ => Err(IdentityError::Internal(format!(
                "Invalid AccountRole id: {}",
                id
            ))),
        }
    }

    pub fn from_code(code: &str) -> IdentityResult<Self> {
        use AccountRole::*;
        match code {
            "user" => Ok(User),
            "moderator" => Ok(Moderator),
            "admin" => Ok(Admin),
            _ => Err(IdentityError::Validation(format!(
                "Invalid role: {}",
                code
            ))),
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
