//! Account registration and lookup.

use chrono::Utc;
use record_store::{Filter, RecordStore};

use crate::document::Document;
use crate::error::DomainError;
use crate::repository::Repository;
use crate::value_objects::AccountId;

use super::{Account, Role};

/// Command to register a new account.
#[derive(Debug, Clone)]
pub struct RegisterAccount {
    pub role: Role,
    pub name: String,
    pub company_name: Option<String>,
    pub email: String,
    /// Produced by the authentication collaborator; stored verbatim.
    pub credential_hash: String,
}

impl RegisterAccount {
    /// Creates a registration without a company name.
    pub fn new(
        role: Role,
        name: impl Into<String>,
        email: impl Into<String>,
        credential_hash: impl Into<String>,
    ) -> Self {
        Self {
            role,
            name: name.into(),
            company_name: None,
            email: email.into(),
            credential_hash: credential_hash.into(),
        }
    }

    /// Sets the company the account registers on behalf of.
    pub fn with_company_name(mut self, company_name: impl Into<String>) -> Self {
        self.company_name = Some(company_name.into());
        self
    }
}

/// Service for managing accounts.
pub struct AccountService<S: RecordStore> {
    repo: Repository<S>,
}

impl<S: RecordStore> AccountService<S> {
    /// Creates a new account service over the given repository.
    pub fn new(repo: Repository<S>) -> Self {
        Self { repo }
    }

    /// Registers an account. Emails are unique, compared case-insensitively.
    #[tracing::instrument(skip(self, cmd), fields(role = %cmd.role))]
    pub async fn register(&self, cmd: RegisterAccount) -> Result<Account, DomainError> {
        let name = cmd.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::InvalidArgument("name is required".to_string()));
        }
        let email = cmd.email.trim().to_ascii_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::InvalidArgument(
                "a valid email is required".to_string(),
            ));
        }
        if cmd.credential_hash.is_empty() {
            return Err(DomainError::InvalidArgument(
                "credential hash is required".to_string(),
            ));
        }

        if self.find_by_email(&email).await?.is_some() {
            return Err(DomainError::Conflict(format!(
                "an account with email {email} already exists"
            )));
        }

        let mut account = Account {
            id: AccountId::new(),
            role: cmd.role,
            name,
            company_name: cmd
                .company_name
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            email,
            credential_hash: cmd.credential_hash,
            created_at: Utc::now(),
            version: Default::default(),
        };

        let records = self
            .repo
            .commit(account.insert_write()?.into())
            .await
            .map_err(|e| match e {
                DomainError::Store(ref store_err) if store_err.is_retryable() => {
                    DomainError::Conflict(format!(
                        "an account with email {} already exists",
                        account.email
                    ))
                }
                other => other,
            })?;
        account.set_version(records[0].version);

        tracing::info!(account_id = %account.id, "account registered");
        Ok(account)
    }

    /// Loads an account by ID.
    pub async fn get(&self, id: AccountId) -> Result<Option<Account>, DomainError> {
        self.repo.load(id).await
    }

    /// Looks an account up by email, ignoring case.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DomainError> {
        let email = email.trim().to_ascii_lowercase();
        Ok(self
            .repo
            .find::<Account>(Filter::new().eq("email", email).limit(1))
            .await?
            .into_iter()
            .next())
    }
}
