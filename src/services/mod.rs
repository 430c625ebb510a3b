//! Business logic services

pub mod accounts;
pub mod catalog;
pub mod credentials;
pub mod issues;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub tokens: credentials::TokenService,
    pub accounts: accounts::AccountsService,
    pub catalog: catalog::CatalogService,
    pub issues: issues::IssuesService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: &AuthConfig) -> Self {
        let tokens = credentials::TokenService::new(auth_config);
        Self {
            accounts: accounts::AccountsService::new(repository.clone(), tokens.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            issues: issues::IssuesService::new(repository.clone()),
            tokens,
            repository,
        }
    }

    /// Check that the database answers
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        self.repository.ping().await
    }
}
