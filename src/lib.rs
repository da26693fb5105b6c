//! Team Identity
//!
//! Account and credential core for a team-based product:
//! - Signup (optionally through an invite) and login with session tokens
//! - Password recovery through single-use emailed tokens
//! - Self-service profile management and team invitations
//! - Billing passthrough to an external provider

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use api::state::AppState;
use config::{
    AuthConfig, BillingConfig, BillingProviderKind, MailConfig, MailProviderKind, StorageSettings,
};
use domain::billing::BillingProvider;
use domain::mail::Mailer;
use infrastructure::{
    auth::{Argon2Codec, JwtConfig, JwtService, OsResetTokenGenerator, SessionTokenIssuer},
    billing::{InMemoryBillingProvider, StripeBillingProvider, StripeConfig},
    invite::{InvitationService, InvitationSettings},
    mail::{InMemoryMailer, SendgridConfig, SendgridMailer},
    storage::{
        run_storage_migrations, PostgresConfig, StorageConfig, StorageFactory, StorageType, Store,
    },
    user::{IdentityService, IdentitySettings},
};

/// Create the application state from configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let store = create_store(&config.storage).await?;
    let tokens = create_token_issuer(&config.auth)?;
    let mailer = create_mailer(&config.mail)?;
    let billing = create_billing_provider(&config.billing)?;

    let identity = IdentityService::new(
        store.directory().clone(),
        Arc::new(Argon2Codec::new()),
        tokens.clone(),
        Arc::new(OsResetTokenGenerator::new()),
        mailer.clone(),
        billing,
        IdentitySettings {
            app_base_url: config.app.base_url.clone(),
            mail_from: config.mail.from_address.clone(),
            forgot_password_template_id: config.mail.forgot_password_template_id.clone(),
        },
    );

    let invitations = InvitationService::new(
        store.directory().clone(),
        mailer,
        InvitationSettings {
            app_base_url: config.app.base_url.clone(),
            mail_from: config.mail.from_address.clone(),
            invite_user_template_id: config.mail.invite_user_template_id.clone(),
        },
    );

    Ok(AppState::new(identity, invitations, tokens, store))
}

/// Resolve the storage settings into a concrete backend configuration
pub fn storage_config(settings: &StorageSettings) -> anyhow::Result<StorageConfig> {
    let backend = StorageType::parse(&settings.backend)
        .with_context(|| format!("Unknown storage backend '{}'", settings.backend))?;

    match backend {
        StorageType::InMemory => Ok(StorageConfig::in_memory()),
        StorageType::Postgres => {
            let url = settings
                .database_url
                .clone()
                .context("storage.database_url is required for the postgres backend")?;

            Ok(StorageConfig::Postgres(
                PostgresConfig::new(url).with_max_connections(settings.max_connections),
            ))
        }
    }
}

async fn create_store(settings: &StorageSettings) -> anyhow::Result<Store> {
    let storage = storage_config(settings)?;
    info!(backend = ?storage.storage_type(), "Creating account store");

    let store = StorageFactory::create(&storage).await?;

    if let Some(pool) = store.pool() {
        if settings.run_migrations {
            run_storage_migrations(pool).await?;
        }
    }

    Ok(store)
}

fn create_token_issuer(auth: &AuthConfig) -> anyhow::Result<Arc<dyn SessionTokenIssuer>> {
    let service = JwtService::new(JwtConfig::new(auth.jwt_secret.clone(), auth.token_ttl_hours))
        .context("auth.jwt_secret must be configured")?;

    Ok(Arc::new(service))
}

fn create_mailer(mail: &MailConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    match mail.provider {
        MailProviderKind::Memory => {
            info!("Using in-memory mailer; emails are not delivered");
            Ok(Arc::new(InMemoryMailer::new()))
        }
        MailProviderKind::Sendgrid => {
            let api_key = mail
                .api_key
                .clone()
                .context("mail.api_key is required for the sendgrid provider")?;

            let mut sendgrid = SendgridConfig::new(api_key);
            if let Some(base_url) = &mail.base_url {
                sendgrid = sendgrid.with_base_url(base_url.clone());
            }

            Ok(Arc::new(SendgridMailer::new(sendgrid)?))
        }
    }
}

fn create_billing_provider(billing: &BillingConfig) -> anyhow::Result<Arc<dyn BillingProvider>> {
    match billing.provider {
        BillingProviderKind::Memory => {
            info!("Using in-memory billing provider");
            Ok(Arc::new(InMemoryBillingProvider::new()))
        }
        BillingProviderKind::Stripe => {
            let api_key = billing
                .api_key
                .clone()
                .context("billing.api_key is required for the stripe provider")?;

            let mut stripe = StripeConfig::new(api_key);
            if let Some(base_url) = &billing.base_url {
                stripe = stripe.with_base_url(base_url.clone());
            }

            Ok(Arc::new(StripeBillingProvider::new(stripe)?))
        }
    }
}
