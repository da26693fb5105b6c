//! Identity service: account lifecycle and credential flows

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::billing::{BillingProvider, Invoice};
use crate::domain::invite::InviteId;
use crate::domain::mail::{Mailer, TemplatedEmail};
use crate::domain::user::{
    normalize_email, validate_email, validate_name, validate_password, User, UserChanges, UserId,
    UserPatch, UserValidationError,
};
use crate::domain::{AccountDirectory, DomainError};
use crate::infrastructure::auth::{CredentialCodec, ResetTokenGenerator, SessionTokenIssuer};

pub const FORGOT_PASSWORD_MESSAGE: &str =
    "A link to reset your password will be sent to your registered email.";
pub const PASSWORD_UPDATED_MESSAGE: &str = "Password updated successfully.";
pub const CARD_UPDATED_MESSAGE: &str = "Successfully updated billing information.";
pub const SUBSCRIBED_MESSAGE: &str = "Successfully subscribed to plan.";

fn invalid(error: UserValidationError) -> DomainError {
    DomainError::validation(error.to_string())
}

/// Request for creating a new account
#[derive(Clone)]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    /// Invite the signup link carried, if any
    pub invite_id: Option<String>,
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"[hidden]")
            .field("invite_id", &self.invite_id)
            .finish()
    }
}

/// An authenticated user together with a fresh session token
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub jwt: String,
    pub user: User,
}

/// Values injected into recovery emails
#[derive(Debug, Clone)]
pub struct IdentitySettings {
    /// Base URL of the web app, used to build the reset link
    pub app_base_url: String,
    pub mail_from: String,
    pub forgot_password_template_id: String,
}

impl IdentitySettings {
    fn reset_password_link(&self, token: &str) -> String {
        format!(
            "{}/reset-password?token={}",
            self.app_base_url.trim_end_matches('/'),
            token
        )
    }
}

/// Signup, login, password recovery and self-service account management
#[derive(Debug, Clone)]
pub struct IdentityService {
    directory: AccountDirectory,
    codec: Arc<dyn CredentialCodec>,
    tokens: Arc<dyn SessionTokenIssuer>,
    reset_tokens: Arc<dyn ResetTokenGenerator>,
    mailer: Arc<dyn Mailer>,
    billing: Arc<dyn BillingProvider>,
    settings: IdentitySettings,
}

impl IdentityService {
    pub fn new(
        directory: AccountDirectory,
        codec: Arc<dyn CredentialCodec>,
        tokens: Arc<dyn SessionTokenIssuer>,
        reset_tokens: Arc<dyn ResetTokenGenerator>,
        mailer: Arc<dyn Mailer>,
        billing: Arc<dyn BillingProvider>,
        settings: IdentitySettings,
    ) -> Self {
        Self {
            directory,
            codec,
            tokens,
            reset_tokens,
            mailer,
            billing,
            settings,
        }
    }

    pub fn directory(&self) -> &AccountDirectory {
        &self.directory
    }

    /// Create an account, joining the invite's team when there is one
    pub async fn signup(&self, request: SignupRequest) -> Result<AuthSession, DomainError> {
        let first_name = request.first_name.trim();
        let last_name = request.last_name.trim();
        let email = normalize_email(&request.email);

        validate_name("First name", first_name).map_err(invalid)?;
        validate_name("Last name", last_name).map_err(invalid)?;
        validate_email(&email).map_err(invalid)?;
        validate_password(&request.password).map_err(invalid)?;

        let invite_id = request
            .invite_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .map(InviteId::parse)
            .transpose()?;

        if self.directory.users().email_exists(&email).await? {
            return Err(DomainError::DuplicateAccount);
        }

        let team = match &invite_id {
            Some(id) => self.directory.team_of_invite(id).await?,
            None => None,
        };

        let password_hash = self.codec.hash(&request.password)?;
        let customer_id = self.billing.create_customer(&email).await?;

        let user = User::new(
            UserId::generate(),
            first_name,
            last_name,
            email,
            password_hash,
            customer_id.clone(),
            team.map(|t| *t.id()),
        );

        let user = match self.directory.users().create(user).await {
            Ok(user) => user,
            Err(e) => {
                if let Err(cleanup) = self.billing.delete_customer(&customer_id).await {
                    warn!(
                        customer_id = %customer_id,
                        error = %cleanup,
                        "Failed to delete billing customer after failed signup"
                    );
                }
                return Err(e.into_duplicate_account());
            }
        };

        let jwt = self.tokens.issue(user.id(), user.email())?;

        info!(
            user_id = %user.id(),
            team_id = ?user.team_id(),
            invite_id = ?invite_id.map(|id| id.to_string()),
            "User signed up"
        );

        Ok(AuthSession { jwt, user })
    }

    /// Exchange email and password for a session
    ///
    /// Unknown emails and wrong passwords fail identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, DomainError> {
        let email = normalize_email(email);

        let Some(user) = self.directory.users().get_by_email(&email).await? else {
            debug!("Login for unknown email");
            return Err(DomainError::AuthenticationFailed);
        };

        if !self.codec.verify(password, user.password_hash()) {
            debug!(user_id = %user.id(), "Login with wrong password");
            return Err(DomainError::AuthenticationFailed);
        }

        let jwt = self.tokens.issue(user.id(), user.email())?;
        info!(user_id = %user.id(), "User logged in");

        Ok(AuthSession { jwt, user })
    }

    /// Start password recovery
    ///
    /// The response is the same whether or not the email belongs to an account.
    pub async fn forgot_password(&self, email: &str) -> &'static str {
        let email = normalize_email(email);

        if let Err(e) = self.start_password_reset(&email).await {
            warn!(error = %e, "Failed to start password reset");
        }

        FORGOT_PASSWORD_MESSAGE
    }

    async fn start_password_reset(&self, email: &str) -> Result<(), DomainError> {
        let Some(user) = self.directory.users().get_by_email(email).await? else {
            debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = self.reset_tokens.generate();
        let user = self.directory.users().set_reset_token(user.id(), &token).await?;

        info!(user_id = %user.id(), "Password reset token issued");

        self.mailer
            .send(TemplatedEmail {
                template_id: self.settings.forgot_password_template_id.clone(),
                to: user.email().to_string(),
                from: self.settings.mail_from.clone(),
                data: json!({
                    "email": user.email(),
                    "resetPasswordLink": self.settings.reset_password_link(&token),
                }),
            })
            .await
    }

    /// Redeem a reset token for a new password
    pub async fn reset_password(
        &self,
        password: &str,
        token: &str,
    ) -> Result<&'static str, DomainError> {
        validate_password(password).map_err(invalid)?;

        if token.is_empty()
            || self
                .directory
                .users()
                .get_by_reset_token(token)
                .await?
                .is_none()
        {
            return Err(DomainError::InvalidResetToken);
        }

        let password_hash = self.codec.hash(password)?;

        let user = self
            .directory
            .users()
            .redeem_reset_token(token, &password_hash)
            .await?
            .ok_or(DomainError::InvalidResetToken)?;

        info!(user_id = %user.id(), "Password reset completed");

        Ok(PASSWORD_UPDATED_MESSAGE)
    }

    /// Apply a partial update to the caller's own account
    pub async fn update_user(&self, caller: &UserId, patch: UserPatch) -> Result<User, DomainError> {
        if patch.is_empty() {
            return Err(DomainError::validation("No fields to update"));
        }

        let mut changes = UserChanges::default();

        if let Some(first_name) = &patch.first_name {
            let first_name = first_name.trim();
            validate_name("First name", first_name).map_err(invalid)?;
            changes.first_name = Some(first_name.to_string());
        }

        if let Some(last_name) = &patch.last_name {
            let last_name = last_name.trim();
            validate_name("Last name", last_name).map_err(invalid)?;
            changes.last_name = Some(last_name.to_string());
        }

        if let Some(email) = &patch.email {
            let email = normalize_email(email);
            validate_email(&email).map_err(invalid)?;
            changes.email = Some(email);
        }

        if let Some(password) = &patch.password {
            validate_password(password).map_err(invalid)?;
            changes.password_hash = Some(self.codec.hash(password)?);
        }

        let user = self
            .directory
            .users()
            .apply_changes(caller, &changes)
            .await
            .map_err(DomainError::into_duplicate_account)?;

        info!(user_id = %user.id(), "User updated");
        Ok(user)
    }

    /// Delete the caller's own account and return the removed record
    pub async fn delete_user(&self, caller: &UserId) -> Result<User, DomainError> {
        let user = self
            .directory
            .users()
            .delete(caller)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", caller)))?;

        info!(user_id = %user.id(), "User deleted");
        Ok(user)
    }

    /// The caller's current account
    pub async fn me(&self, caller: &UserId) -> Result<User, DomainError> {
        self.current_user(caller).await
    }

    /// Invoices of the caller's billing customer
    pub async fn payment_history(&self, caller: &UserId) -> Result<Vec<Invoice>, DomainError> {
        let user = self.current_user(caller).await?;
        self.billing.list_invoices(user.billing_customer_id()).await
    }

    /// Attach a tokenized card to the caller's billing customer
    pub async fn add_credit_card(
        &self,
        caller: &UserId,
        card_token: &str,
    ) -> Result<&'static str, DomainError> {
        if card_token.trim().is_empty() {
            return Err(DomainError::validation("Card token cannot be empty"));
        }

        let user = self.current_user(caller).await?;
        self.billing
            .attach_card(user.billing_customer_id(), card_token)
            .await?;

        info!(user_id = %user.id(), "Billing card updated");
        Ok(CARD_UPDATED_MESSAGE)
    }

    /// Subscribe the caller's billing customer to a plan
    pub async fn subscribe_plan(
        &self,
        caller: &UserId,
        plan_id: &str,
    ) -> Result<&'static str, DomainError> {
        if plan_id.trim().is_empty() {
            return Err(DomainError::validation("Plan ID cannot be empty"));
        }

        let user = self.current_user(caller).await?;
        self.billing
            .subscribe(user.billing_customer_id(), plan_id)
            .await?;

        info!(user_id = %user.id(), plan_id = %plan_id, "Subscribed to plan");
        Ok(SUBSCRIBED_MESSAGE)
    }

    async fn current_user(&self, caller: &UserId) -> Result<User, DomainError> {
        self.directory
            .users()
            .get(caller)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", caller)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::MockBillingProvider;
    use crate::domain::invite::Invite;
    use crate::domain::mail::MockMailer;
    use crate::domain::team::{Team, TeamId};
    use crate::domain::user::{MockUserRepository, UserRepository};
    use crate::infrastructure::auth::{Argon2Codec, JwtConfig, JwtService, OsResetTokenGenerator};
    use crate::infrastructure::billing::InMemoryBillingProvider;
    use crate::infrastructure::invite::InMemoryInviteRepository;
    use crate::infrastructure::mail::InMemoryMailer;
    use crate::infrastructure::team::InMemoryTeamRepository;
    use crate::infrastructure::user::InMemoryUserRepository;
    use chrono::Utc;
    use tokio_test::{assert_err, assert_ok};

    struct Harness {
        service: IdentityService,
        users: Arc<InMemoryUserRepository>,
        mailer: Arc<InMemoryMailer>,
        billing: Arc<InMemoryBillingProvider>,
        tokens: Arc<JwtService>,
    }

    fn settings() -> IdentitySettings {
        IdentitySettings {
            app_base_url: "https://app.example.com".to_string(),
            mail_from: "support@example.com".to_string(),
            forgot_password_template_id: "tpl-forgot".to_string(),
        }
    }

    fn codec() -> Arc<Argon2Codec> {
        Arc::new(Argon2Codec::with_cost(1024, 1, 1).unwrap())
    }

    fn jwt() -> Arc<JwtService> {
        Arc::new(JwtService::new(JwtConfig::new("test-secret", 24)).unwrap())
    }

    fn directory_with(
        users: Arc<dyn UserRepository>,
        teams: Vec<Team>,
        invites: Arc<InMemoryInviteRepository>,
    ) -> AccountDirectory {
        AccountDirectory::new(
            users,
            Arc::new(InMemoryTeamRepository::with_teams(teams)),
            invites,
        )
    }

    fn harness_with_teams(teams: Vec<Team>) -> Harness {
        let users = Arc::new(InMemoryUserRepository::new());
        let mailer = Arc::new(InMemoryMailer::new());
        let billing = Arc::new(InMemoryBillingProvider::new());
        let tokens = jwt();

        let service = IdentityService::new(
            directory_with(users.clone(), teams, Arc::new(InMemoryInviteRepository::new())),
            codec(),
            tokens.clone(),
            Arc::new(OsResetTokenGenerator::new()),
            mailer.clone(),
            billing.clone(),
            settings(),
        );

        Harness {
            service,
            users,
            mailer,
            billing,
            tokens,
        }
    }

    fn harness() -> Harness {
        harness_with_teams(vec![])
    }

    fn signup_request(email: &str) -> SignupRequest {
        SignupRequest {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.to_string(),
            password: "correct horse".to_string(),
            invite_id: None,
        }
    }

    async fn reset_token_of(h: &Harness, email: &str) -> String {
        h.users
            .get_by_email(email)
            .await
            .unwrap()
            .unwrap()
            .reset_password_token()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_signup_issues_token_for_new_user() {
        let h = harness();

        let session = h.service.signup(signup_request(" Ada@Example.com ")).await.unwrap();

        assert_eq!(session.user.email(), "ada@example.com");
        assert_eq!(session.user.full_name(), "Ada Lovelace");
        assert_ne!(session.user.password_hash(), "correct horse");
        assert!(h.billing.has_customer(session.user.billing_customer_id()).await);

        let claims = h.tokens.validate(&session.jwt).unwrap();
        assert_eq!(&claims.user_id().unwrap(), session.user.id());
        assert_eq!(claims.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_signup_duplicate_email() {
        let h = harness();
        h.service.signup(signup_request("ada@example.com")).await.unwrap();

        let result = h.service.signup(signup_request("ADA@example.com")).await;

        assert!(matches!(result, Err(DomainError::DuplicateAccount)));
        assert_eq!(h.users.len().await, 1);
        assert_eq!(h.billing.customer_count().await, 1);
    }

    #[tokio::test]
    async fn test_signup_validation_happens_first() {
        let h = harness();

        let mut request = signup_request("ada@example.com");
        request.password = "short".to_string();
        assert!(matches!(
            h.service.signup(request).await,
            Err(DomainError::Validation { .. })
        ));

        assert_err!(h.service.signup(signup_request("not-an-email")).await);

        let mut request = signup_request("ada@example.com");
        request.invite_id = Some("not-a-uuid".to_string());
        assert!(matches!(
            h.service.signup(request).await,
            Err(DomainError::Validation { .. })
        ));

        assert_eq!(h.users.len().await, 0);
        assert_eq!(h.billing.customer_count().await, 0);
    }

    #[tokio::test]
    async fn test_signup_with_invite_inherits_team() {
        let team = Team::new(TeamId::generate(), "Acme");
        let h = harness_with_teams(vec![team.clone()]);
        let inviter = UserId::generate();

        let invite = h
            .service
            .directory()
            .invites()
            .create(Invite::new("b@example.com", "Bob", "Smith", inviter, Some(*team.id())))
            .await
            .unwrap();

        let mut request = signup_request("b@example.com");
        request.invite_id = Some(invite.id().to_string());

        let session = h.service.signup(request).await.unwrap();
        assert_eq!(session.user.team_id(), Some(team.id()));
    }

    #[tokio::test]
    async fn test_signup_with_teamless_or_unknown_invite() {
        let h = harness();
        let inviter = UserId::generate();

        let invite = h
            .service
            .directory()
            .invites()
            .create(Invite::new("b@example.com", "Bob", "Smith", inviter, None))
            .await
            .unwrap();

        let mut request = signup_request("b@example.com");
        request.invite_id = Some(invite.id().to_string());
        let session = h.service.signup(request).await.unwrap();
        assert!(session.user.team_id().is_none());

        let mut request = signup_request("c@example.com");
        request.invite_id = Some(InviteId::generate().to_string());
        let session = h.service.signup(request).await.unwrap();
        assert!(session.user.team_id().is_none());
    }

    #[tokio::test]
    async fn test_signup_billing_failure_writes_no_user() {
        let users = Arc::new(InMemoryUserRepository::new());
        let mut billing = MockBillingProvider::new();
        billing
            .expect_create_customer()
            .times(1)
            .returning(|_| Err(DomainError::provider("billing", "unavailable")));
        billing.expect_delete_customer().never();

        let service = IdentityService::new(
            directory_with(users.clone(), vec![], Arc::new(InMemoryInviteRepository::new())),
            codec(),
            jwt(),
            Arc::new(OsResetTokenGenerator::new()),
            Arc::new(InMemoryMailer::new()),
            Arc::new(billing),
            settings(),
        );

        let result = service.signup(signup_request("ada@example.com")).await;

        assert!(matches!(result, Err(DomainError::Provider { .. })));
        assert_eq!(users.len().await, 0);
    }

    #[tokio::test]
    async fn test_signup_store_conflict_deletes_billing_customer() {
        let mut users = MockUserRepository::new();
        users.expect_email_exists().returning(|_| Ok(false));
        users
            .expect_create()
            .times(1)
            .returning(|_| Err(DomainError::conflict("Email already exists")));

        let mut billing = MockBillingProvider::new();
        billing
            .expect_create_customer()
            .times(1)
            .returning(|_| Ok("cus_race".to_string()));
        billing
            .expect_delete_customer()
            .withf(|id| id == "cus_race")
            .times(1)
            .returning(|_| Ok(()));

        let service = IdentityService::new(
            directory_with(Arc::new(users), vec![], Arc::new(InMemoryInviteRepository::new())),
            codec(),
            jwt(),
            Arc::new(OsResetTokenGenerator::new()),
            Arc::new(InMemoryMailer::new()),
            Arc::new(billing),
            settings(),
        );

        let result = service.signup(signup_request("ada@example.com")).await;
        assert!(matches!(result, Err(DomainError::DuplicateAccount)));
    }

    #[tokio::test]
    async fn test_login_requires_both_factors() {
        let h = harness();
        let created = h.service.signup(signup_request("ada@example.com")).await.unwrap();

        let session = h.service.login("ADA@example.com", "correct horse").await.unwrap();
        assert_eq!(session.user.id(), created.user.id());
        assert_ok!(h.tokens.validate(&session.jwt));

        let wrong_password = h.service.login("ada@example.com", "wrong horse").await;
        let unknown_email = h.service.login("nobody@example.com", "correct horse").await;

        let wrong_password = wrong_password.unwrap_err();
        let unknown_email = unknown_email.unwrap_err();
        assert!(matches!(wrong_password, DomainError::AuthenticationFailed));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_forgot_password_is_uniform() {
        let h = harness();
        h.service.signup(signup_request("ada@example.com")).await.unwrap();

        let known = h.service.forgot_password("ada@example.com").await;
        let unknown = h.service.forgot_password("nobody@example.com").await;

        assert_eq!(known, unknown);
        assert_eq!(known, FORGOT_PASSWORD_MESSAGE);

        let sent = h.mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ada@example.com");
        assert_eq!(sent[0].template_id, "tpl-forgot");

        let token = reset_token_of(&h, "ada@example.com").await;
        assert_eq!(
            sent[0].data["resetPasswordLink"],
            format!("https://app.example.com/reset-password?token={}", token)
        );
    }

    #[tokio::test]
    async fn test_forgot_password_hides_mailer_failure() {
        let users = Arc::new(InMemoryUserRepository::new());
        users
            .create(User::new(
                UserId::generate(),
                "Ada",
                "Lovelace",
                "ada@example.com",
                "hash",
                "cus_1",
                None,
            ))
            .await
            .unwrap();

        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .times(1)
            .returning(|_| Err(DomainError::provider("mail", "unavailable")));

        let service = IdentityService::new(
            directory_with(users.clone(), vec![], Arc::new(InMemoryInviteRepository::new())),
            codec(),
            jwt(),
            Arc::new(OsResetTokenGenerator::new()),
            Arc::new(mailer),
            Arc::new(InMemoryBillingProvider::new()),
            settings(),
        );

        assert_eq!(
            service.forgot_password("ada@example.com").await,
            FORGOT_PASSWORD_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_reset_token_is_single_use() {
        let h = harness();
        h.service.signup(signup_request("ada@example.com")).await.unwrap();
        h.service.forgot_password("ada@example.com").await;
        let token = reset_token_of(&h, "ada@example.com").await;

        let message = h.service.reset_password("new password", &token).await.unwrap();
        assert_eq!(message, PASSWORD_UPDATED_MESSAGE);

        let again = h.service.reset_password("newer password", &token).await;
        assert!(matches!(again, Err(DomainError::InvalidResetToken)));

        assert_ok!(h.service.login("ada@example.com", "new password").await);
        assert_err!(h.service.login("ada@example.com", "correct horse").await);

        let user = h.users.get_by_email("ada@example.com").await.unwrap().unwrap();
        assert!(user.reset_password_token().is_none());
    }

    #[tokio::test]
    async fn test_second_forgot_password_replaces_token() {
        let h = harness();
        h.service.signup(signup_request("ada@example.com")).await.unwrap();

        h.service.forgot_password("ada@example.com").await;
        let first = reset_token_of(&h, "ada@example.com").await;
        h.service.forgot_password("ada@example.com").await;
        let second = reset_token_of(&h, "ada@example.com").await;

        assert_ne!(first, second);
        assert!(matches!(
            h.service.reset_password("new password", &first).await,
            Err(DomainError::InvalidResetToken)
        ));
        assert_ok!(h.service.reset_password("new password", &second).await);
    }

    #[tokio::test]
    async fn test_reset_password_unknown_token() {
        let h = harness();

        assert!(matches!(
            h.service.reset_password("new password", "nope").await,
            Err(DomainError::InvalidResetToken)
        ));
        assert!(matches!(
            h.service.reset_password("new password", "").await,
            Err(DomainError::InvalidResetToken)
        ));
        assert!(matches!(
            h.service.reset_password("short", "nope").await,
            Err(DomainError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_user_applies_present_fields() {
        let h = harness();
        let session = h.service.signup(signup_request("ada@example.com")).await.unwrap();
        let id = *session.user.id();

        let updated = h
            .service
            .update_user(
                &id,
                UserPatch {
                    last_name: Some("Byron".to_string()),
                    email: Some(" Ada.Byron@Example.com".to_string()),
                    password: Some("brand new password".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.first_name(), "Ada");
        assert_eq!(updated.last_name(), "Byron");
        assert_eq!(updated.email(), "ada.byron@example.com");
        assert_eq!(updated.team_id(), session.user.team_id());

        assert_ok!(h.service.login("ada.byron@example.com", "brand new password").await);
        assert_err!(h.service.login("ada@example.com", "correct horse").await);
    }

    #[tokio::test]
    async fn test_update_user_rejects_empty_and_duplicate() {
        let h = harness();
        let session = h.service.signup(signup_request("ada@example.com")).await.unwrap();
        h.service.signup(signup_request("taken@example.com")).await.unwrap();
        let id = *session.user.id();

        assert!(matches!(
            h.service.update_user(&id, UserPatch::default()).await,
            Err(DomainError::Validation { .. })
        ));

        let result = h
            .service
            .update_user(
                &id,
                UserPatch {
                    email: Some("taken@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(DomainError::DuplicateAccount)));

        let result = h
            .service
            .update_user(
                &id,
                UserPatch {
                    first_name: Some("  ".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_delete_user_and_me() {
        let h = harness();
        let session = h.service.signup(signup_request("ada@example.com")).await.unwrap();
        let id = *session.user.id();

        assert_eq!(h.service.me(&id).await.unwrap().email(), "ada@example.com");

        let deleted = h.service.delete_user(&id).await.unwrap();
        assert_eq!(deleted.id(), &id);

        assert!(matches!(
            h.service.me(&id).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            h.service.delete_user(&id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_billing_operations() {
        let h = harness();
        let session = h.service.signup(signup_request("ada@example.com")).await.unwrap();
        let id = *session.user.id();
        let customer_id = session.user.billing_customer_id();

        let now = Utc::now();
        h.billing
            .add_invoice(
                customer_id,
                Invoice {
                    amount_due: 900,
                    amount_paid: 900,
                    invoice_pdf: None,
                    status: Some("paid".to_string()),
                    date: now,
                    period_start: now,
                    period_end: now,
                },
            )
            .await
            .unwrap();

        let invoices = h.service.payment_history(&id).await.unwrap();
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].amount_due, 900);

        assert_eq!(
            h.service.add_credit_card(&id, "tok_visa").await.unwrap(),
            CARD_UPDATED_MESSAGE
        );
        assert_eq!(
            h.service.subscribe_plan(&id, "plan_pro").await.unwrap(),
            SUBSCRIBED_MESSAGE
        );
        assert_eq!(h.billing.cards(customer_id).await, vec!["tok_visa"]);
        assert_eq!(h.billing.plans(customer_id).await, vec!["plan_pro"]);

        assert!(matches!(
            h.service.subscribe_plan(&id, " ").await,
            Err(DomainError::Validation { .. })
        ));
    }

    /// In-memory store that lets another request's write land between the
    /// service's read and its own write
    #[derive(Debug)]
    struct Interleaved {
        inner: Arc<InMemoryUserRepository>,
        redeem_before_changes: Option<String>,
        changes_before_token: Option<(UserId, UserChanges)>,
    }

    #[async_trait::async_trait]
    impl UserRepository for Interleaved {
        async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
            self.inner.get(id).await
        }

        async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
            self.inner.get_by_email(email).await
        }

        async fn get_by_reset_token(&self, token: &str) -> Result<Option<User>, DomainError> {
            self.inner.get_by_reset_token(token).await
        }

        async fn create(&self, user: User) -> Result<User, DomainError> {
            self.inner.create(user).await
        }

        async fn apply_changes(
            &self,
            id: &UserId,
            changes: &UserChanges,
        ) -> Result<User, DomainError> {
            if let Some(token) = &self.redeem_before_changes {
                self.inner
                    .redeem_reset_token(token, "hash-from-reset")
                    .await
                    .unwrap()
                    .unwrap();
            }
            self.inner.apply_changes(id, changes).await
        }

        async fn set_reset_token(&self, id: &UserId, token: &str) -> Result<User, DomainError> {
            if let Some((other, changes)) = &self.changes_before_token {
                self.inner.apply_changes(other, changes).await.unwrap();
            }
            self.inner.set_reset_token(id, token).await
        }

        async fn delete(&self, id: &UserId) -> Result<Option<User>, DomainError> {
            self.inner.delete(id).await
        }

        async fn redeem_reset_token(
            &self,
            token: &str,
            password_hash: &str,
        ) -> Result<Option<User>, DomainError> {
            self.inner.redeem_reset_token(token, password_hash).await
        }
    }

    fn service_over(users: Interleaved) -> IdentityService {
        IdentityService::new(
            directory_with(Arc::new(users), vec![], Arc::new(InMemoryInviteRepository::new())),
            codec(),
            jwt(),
            Arc::new(OsResetTokenGenerator::new()),
            Arc::new(InMemoryMailer::new()),
            Arc::new(InMemoryBillingProvider::new()),
            settings(),
        )
    }

    fn stored_user() -> User {
        User::new(
            UserId::generate(),
            "Ada",
            "Lovelace",
            "ada@example.com",
            "old-hash",
            "cus_1",
            None,
        )
    }

    #[tokio::test]
    async fn test_update_user_keeps_concurrent_reset() {
        let users = Arc::new(InMemoryUserRepository::new());
        let mut user = stored_user();
        user.set_reset_password_token("tok-1");
        users.create(user.clone()).await.unwrap();

        let service = service_over(Interleaved {
            inner: users.clone(),
            redeem_before_changes: Some("tok-1".to_string()),
            changes_before_token: None,
        });

        let updated = service
            .update_user(
                user.id(),
                UserPatch {
                    first_name: Some("Augusta".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.first_name(), "Augusta");
        assert_eq!(updated.password_hash(), "hash-from-reset");
        assert!(updated.reset_password_token().is_none());

        assert!(matches!(
            service.reset_password("another password", "tok-1").await,
            Err(DomainError::InvalidResetToken)
        ));
    }

    #[tokio::test]
    async fn test_forgot_password_keeps_concurrent_profile_change() {
        let users = Arc::new(InMemoryUserRepository::new());
        let user = stored_user();
        users.create(user.clone()).await.unwrap();

        let service = service_over(Interleaved {
            inner: users.clone(),
            redeem_before_changes: None,
            changes_before_token: Some((
                *user.id(),
                UserChanges {
                    password_hash: Some("hash-from-profile".to_string()),
                    ..Default::default()
                },
            )),
        });

        service.forgot_password("ada@example.com").await;

        let stored = users.get(user.id()).await.unwrap().unwrap();
        assert_eq!(stored.password_hash(), "hash-from-profile");
        assert!(stored.reset_password_token().is_some());
    }
}
