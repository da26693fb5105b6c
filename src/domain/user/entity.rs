//! User entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::team::TeamId;
use crate::domain::DomainError;

/// User identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a fresh random user ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from its string form
    pub fn parse(id: &str) -> Result<Self, DomainError> {
        Uuid::parse_str(id.trim())
            .map(Self)
            .map_err(|_| DomainError::validation(format!("Invalid user ID '{}'", id)))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Every stored field of a user, used to rebuild the entity from a store
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub billing_customer_id: String,
    pub reset_password_token: Option<String>,
    pub team_id: Option<TeamId>,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User account
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    first_name: String,
    last_name: String,
    /// Normalized (trimmed, lowercase) email
    email: String,
    /// Argon2 password hash - never exposed in serialization
    #[serde(skip_serializing)]
    password_hash: String,
    #[serde(skip_serializing)]
    billing_customer_id: String,
    #[serde(skip_serializing)]
    reset_password_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    team_id: Option<TeamId>,
    /// Billing period, synced from the billing provider
    #[serde(skip_serializing_if = "Option::is_none")]
    period_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    period_end: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user
    pub fn new(
        id: UserId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        billing_customer_id: impl Into<String>,
        team_id: Option<TeamId>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            billing_customer_id: billing_customer_id.into(),
            reset_password_token: None,
            team_id,
            period_start: None,
            period_end: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a user from stored fields
    pub fn restore(record: UserRecord) -> Self {
        Self {
            id: record.id,
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
            password_hash: record.password_hash,
            billing_customer_id: record.billing_customer_id,
            reset_password_token: record.reset_password_token,
            team_id: record.team_id,
            period_start: record.period_start,
            period_end: record.period_end,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    // Getters

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn billing_customer_id(&self) -> &str {
        &self.billing_customer_id
    }

    pub fn reset_password_token(&self) -> Option<&str> {
        self.reset_password_token.as_deref()
    }

    pub fn team_id(&self) -> Option<&TeamId> {
        self.team_id.as_ref()
    }

    pub fn period_start(&self) -> Option<DateTime<Utc>> {
        self.period_start
    }

    pub fn period_end(&self) -> Option<DateTime<Utc>> {
        self.period_end
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Mutators

    /// Apply already validated changes; absent fields are left untouched
    pub fn apply_changes(&mut self, changes: &UserChanges) {
        if let Some(first_name) = &changes.first_name {
            self.first_name = first_name.clone();
        }
        if let Some(last_name) = &changes.last_name {
            self.last_name = last_name.clone();
        }
        if let Some(email) = &changes.email {
            self.email = email.clone();
        }
        if let Some(password_hash) = &changes.password_hash {
            self.password_hash = password_hash.clone();
        }
        self.touch();
    }

    /// Open a recovery window, replacing any previous token
    pub fn set_reset_password_token(&mut self, token: impl Into<String>) {
        self.reset_password_token = Some(token.into());
        self.touch();
    }

    /// Set a new password hash and close the recovery window
    pub fn complete_password_reset(&mut self, password_hash: impl Into<String>) {
        self.password_hash = password_hash.into();
        self.reset_password_token = None;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password_hash", &"[hidden]")
            .field("billing_customer_id", &self.billing_customer_id)
            .field(
                "reset_password_token",
                &self.reset_password_token.as_ref().map(|_| "[hidden]"),
            )
            .field("team_id", &self.team_id)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Partial update of a user's own profile
///
/// Only fields that are `Some` are applied. The password is plaintext here and
/// is hashed by the identity service before it reaches the entity.
#[derive(Clone, Default)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.password.is_none()
    }
}

impl std::fmt::Debug for UserPatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserPatch")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[hidden]"))
            .finish()
    }
}

/// Validated profile changes ready to be written
///
/// Names are trimmed, the email is normalized and the password is already
/// hashed. Stores write only the fields that are `Some`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl std::fmt::Debug for UserChanges {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserChanges")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password_hash", &self.password_hash.as_ref().map(|_| "[hidden]"))
            .finish()
    }
}
