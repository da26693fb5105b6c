//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, AppLinksConfig, AuthConfig, BillingConfig, BillingProviderKind, LogFormat,
    LoggingConfig, MailConfig, MailProviderKind, ServerConfig, StorageSettings,
};
