//! Invitation service: onboarding new members into the inviter's team

use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::invite::Invite;
use crate::domain::mail::{Mailer, TemplatedEmail};
use crate::domain::user::{normalize_email, validate_email, validate_name, User};
use crate::domain::{AccountDirectory, DomainError};

/// Request for inviting a new member
#[derive(Debug, Clone)]
pub struct InviteUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Values injected into invitation emails
#[derive(Debug, Clone)]
pub struct InvitationSettings {
    /// Base URL of the web app, used to build the signup link
    pub app_base_url: String,
    pub mail_from: String,
    pub invite_user_template_id: String,
}

impl InvitationSettings {
    fn signup_link(&self, invite: &Invite) -> String {
        format!(
            "{}/signup?inviteId={}",
            self.app_base_url.trim_end_matches('/'),
            invite.id()
        )
    }
}

/// Creates invites and notifies invitees
#[derive(Debug, Clone)]
pub struct InvitationService {
    directory: AccountDirectory,
    mailer: Arc<dyn Mailer>,
    settings: InvitationSettings,
}

impl InvitationService {
    pub fn new(
        directory: AccountDirectory,
        mailer: Arc<dyn Mailer>,
        settings: InvitationSettings,
    ) -> Self {
        Self {
            directory,
            mailer,
            settings,
        }
    }

    /// Invite someone into the inviter's team
    ///
    /// The invite is returned even when the email cannot be delivered.
    /// Repeated invites for the same address are allowed.
    pub async fn invite_user(
        &self,
        inviter: &User,
        request: InviteUserRequest,
    ) -> Result<Invite, DomainError> {
        let first_name = request.first_name.trim();
        let last_name = request.last_name.trim();
        let email = normalize_email(&request.email);

        validate_name("First name", first_name).map_err(|e| DomainError::validation(e.to_string()))?;
        validate_name("Last name", last_name).map_err(|e| DomainError::validation(e.to_string()))?;
        validate_email(&email).map_err(|e| DomainError::validation(e.to_string()))?;

        let team_id = self
            .directory
            .team_of_user(inviter)
            .await?
            .map(|team| *team.id());

        let invite = self
            .directory
            .invites()
            .create(Invite::new(
                email,
                first_name,
                last_name,
                *inviter.id(),
                team_id,
            ))
            .await?;

        info!(
            invite_id = %invite.id(),
            inviter_id = %inviter.id(),
            team_id = ?invite.team_id(),
            "Invite created"
        );

        let email = TemplatedEmail {
            template_id: self.settings.invite_user_template_id.clone(),
            to: invite.email().to_string(),
            from: self.settings.mail_from.clone(),
            data: json!({
                "invitee": invite.invitee_name(),
                "inviter": inviter.email(),
                "signUpLink": self.settings.signup_link(&invite),
            }),
        };

        if let Err(e) = self.mailer.send(email).await {
            warn!(invite_id = %invite.id(), error = %e, "Failed to send invitation email");
        }

        Ok(invite)
    }
}
