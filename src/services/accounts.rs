//! Login and account management service

use crate::{
    config::BootstrapConfig,
    error::{AppError, AppResult},
    models::{
        membership::{CreateMembership, Membership},
        user::{CreateAccount, CreateOwner, LoginRequest, NewUser, Role, User, UserWithLibraries},
    },
    repository::Repository,
};

use super::credentials::{hash_password, verify_password, TokenService};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Clone)]
pub struct AccountsService {
    repository: Repository,
    tokens: TokenService,
}

impl AccountsService {
    pub fn new(repository: Repository, tokens: TokenService) -> Self {
        Self { repository, tokens }
    }

    /// Authenticate by email and password, returning a session token
    pub async fn login(&self, login: &LoginRequest) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_email(&login.email)
            .await?
            .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&login.password, &user.password) {
            tracing::debug!(user_id = user.id, "Login rejected: wrong password");
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.tokens.issue(user.id, user.role)?;
        tracing::info!(user_id = user.id, role = %user.role, "User logged in");
        Ok((token, user))
    }

    /// Create an owner account
    pub async fn create_owner(&self, owner: CreateOwner) -> AppResult<User> {
        ensure_owner_role(owner.role)?;

        let user = self
            .repository
            .users
            .create(&NewUser {
                name: owner.name,
                email: owner.email,
                contact: owner.contact,
                role: Role::Owner,
                password: hash_password(&owner.password)?,
            })
            .await?;

        tracing::info!(user_id = user.id, "Owner account created");
        Ok(user)
    }

    /// Create an admin linked to the given libraries
    pub async fn create_admin(&self, account: CreateAccount) -> AppResult<UserWithLibraries> {
        self.create_member(account, Role::Admin).await
    }

    /// Create a reader linked to the given libraries
    pub async fn create_user(&self, account: CreateAccount) -> AppResult<UserWithLibraries> {
        self.create_member(account, Role::User).await
    }

    async fn create_member(&self, account: CreateAccount, role: Role) -> AppResult<UserWithLibraries> {
        let new_user = NewUser {
            name: account.name,
            email: account.email,
            contact: account.contact,
            role,
            password: hash_password(&account.password)?,
        };

        let (user, libraries) = self
            .repository
            .users
            .create_with_libraries(&new_user, &account.library_ids)
            .await?;

        tracing::info!(user_id = user.id, role = %role, libraries = libraries.len(), "Account created");
        Ok(UserWithLibraries { user, libraries })
    }

    /// Link an existing user to an existing library
    pub async fn add_membership(&self, membership: CreateMembership) -> AppResult<Membership> {
        let created = self.repository.memberships.create(&membership).await?;
        tracing::info!(
            user_id = created.user_id,
            library_id = created.library_id,
            "Membership linked"
        );
        Ok(created)
    }

    /// Create the first owner from configuration when the database has none.
    ///
    /// Returns the created account, or `None` when nothing had to be done.
    pub async fn bootstrap_owner(&self, config: &BootstrapConfig) -> AppResult<Option<User>> {
        let Some(owner) = bootstrap_request(config)? else {
            return Ok(None);
        };

        if self.repository.users.role_exists(Role::Owner).await? {
            tracing::debug!("Owner account already present, bootstrap skipped");
            return Ok(None);
        }

        let user = self.create_owner(owner).await?;
        tracing::info!(user_id = user.id, email = %user.email, "Bootstrap owner created");
        Ok(Some(user))
    }
}

/// An explicit role on owner creation may only be `owner`
fn ensure_owner_role(role: Option<Role>) -> AppResult<()> {
    match role {
        None | Some(Role::Owner) => Ok(()),
        Some(_) => Err(AppError::Validation("Invalid role, must be 'owner'".to_string())),
    }
}

/// Turn the bootstrap section into an owner request, if it is configured
fn bootstrap_request(config: &BootstrapConfig) -> AppResult<Option<CreateOwner>> {
    let Some(email) = config.owner_email.clone() else {
        return Ok(None);
    };
    let password = config.owner_password.clone().ok_or_else(|| {
        AppError::Internal("bootstrap.owner_password is required with bootstrap.owner_email".to_string())
    })?;

    Ok(Some(CreateOwner {
        name: config.owner_name.clone().unwrap_or_else(|| "Owner".to_string()),
        email,
        password,
        contact: None,
        role: Some(Role::Owner),
    }))
}
