//! User model, roles and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::library::Library;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Owner, Role::Admin, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Role::Owner => 0b001,
            Role::Admin => 0b010,
            Role::User => 0b100,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

text_column!(Role);

/// Set of roles accepted by a route group (an OR-list, written `admin|owner`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const OWNER: RoleSet = RoleSet::of(Role::Owner);
    pub const ADMIN: RoleSet = RoleSet::of(Role::Admin);
    pub const USER: RoleSet = RoleSet::of(Role::User);
    pub const ANY: RoleSet = RoleSet::OWNER.or(Role::Admin).or(Role::User);

    pub const fn of(role: Role) -> Self {
        RoleSet(role.bit())
    }

    pub const fn or(self, role: Role) -> Self {
        RoleSet(self.0 | role.bit())
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> {
        let set = *self;
        Role::ALL.into_iter().filter(move |r| set.contains(*r))
    }
}

impl std::fmt::Display for RoleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.roles().map(|r| r.as_str()).collect();
        write!(f, "{}", names.join("|"))
    }
}

impl std::str::FromStr for RoleSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = RoleSet(0);
        for part in s.split('|') {
            set = set.or(part.trim().parse()?);
        }
        Ok(set)
    }
}

/// Caller identity resolved from a validated token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: i32,
    pub role: Role,
}

/// Full user model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub contact: Option<String>,
    pub role: Role,
    /// Hashed password (argon2)
    #[serde(skip_serializing, default)]
    pub password: String,
    pub created_at: DateTime<Utc>,
}

/// User together with the libraries it belongs to
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserWithLibraries {
    #[serde(flatten)]
    pub user: User,
    pub libraries: Vec<Library>,
}

/// Create owner request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOwner {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: String,
    pub contact: Option<String>,
    /// Must be `owner` when provided
    pub role: Option<Role>,
}

/// Create admin or user request (role is decided by the endpoint)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAccount {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: String,
    pub contact: Option<String>,
    /// Libraries the new account is linked to
    #[validate(length(min = 1, message = "At least one library is required"))]
    pub library_ids: Vec<i32>,
}

/// Login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Account ready for insertion (password already hashed)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub contact: Option<String>,
    pub role: Role,
    pub password: String,
}

/// JWT claims carried by every session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// User id
    pub sub: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_names() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("superuser".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_set_membership() {
        let set = RoleSet::ADMIN.or(Role::Owner);
        assert!(set.contains(Role::Admin));
        assert!(set.contains(Role::Owner));
        assert!(!set.contains(Role::User));

        assert!(RoleSet::USER.contains(Role::User));
        assert!(!RoleSet::USER.contains(Role::Admin));
        for role in Role::ALL {
            assert!(RoleSet::ANY.contains(role));
        }
    }

    #[test]
    fn test_role_set_display_and_parse() {
        assert_eq!(RoleSet::ADMIN.or(Role::Owner).to_string(), "owner|admin");
        assert_eq!(RoleSet::ANY.to_string(), "owner|admin|user");
        assert_eq!("admin|owner".parse::<RoleSet>(), Ok(RoleSet::OWNER.or(Role::Admin)));
        assert_eq!("user".parse::<RoleSet>(), Ok(RoleSet::USER));
        assert!("admin|".parse::<RoleSet>().is_err());
    }

    #[test]
    fn test_password_is_not_serialized() {
        let user = User {
            id: 1,
            name: "Ada".to_string(),
            email: "ada@example.org".to_string(),
            contact: None,
            role: Role::Admin,
            password: "$argon2id$v=19$secret".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "admin");
    }
}
