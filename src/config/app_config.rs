use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;

/// Application configuration
///
/// Loaded from `config/default`, `config/local` and `APP__*` environment
/// variables, later sources overriding earlier ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageSettings,
    pub auth: AuthConfig,
    pub mail: MailConfig,
    pub billing: BillingConfig,
    pub app: AppLinksConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// `memory` or `postgres`
    pub backend: String,
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Apply pending migrations when the server starts
    pub run_migrations: bool,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret for session tokens
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MailProviderKind {
    #[default]
    Memory,
    Sendgrid,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub provider: MailProviderKind,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub from_address: String,
    pub forgot_password_template_id: String,
    pub invite_user_template_id: String,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BillingProviderKind {
    #[default]
    Memory,
    Stripe,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    pub provider: BillingProviderKind,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

/// Where emailed links point
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppLinksConfig {
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            database_url: None,
            max_connections: 10,
            run_migrations: true,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: 24,
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            provider: MailProviderKind::default(),
            api_key: None,
            base_url: None,
            from_address: "support@localhost".to_string(),
            forgot_password_template_id: "forgot-password".to_string(),
            invite_user_template_id: "invite-user".to_string(),
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            provider: BillingProviderKind::default(),
            api_key: None,
            base_url: None,
        }
    }
}

impl Default for AppLinksConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
        }
    }
}

fn hidden(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "[hidden]")
}

impl std::fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageSettings")
            .field("backend", &self.backend)
            .field("database_url", &hidden(&self.database_url))
            .field("max_connections", &self.max_connections)
            .field("run_migrations", &self.run_migrations)
            .finish()
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[hidden]")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .finish()
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("provider", &self.provider)
            .field("api_key", &hidden(&self.api_key))
            .field("base_url", &self.base_url)
            .field("from_address", &self.from_address)
            .field("forgot_password_template_id", &self.forgot_password_template_id)
            .field("invite_user_template_id", &self.invite_user_template_id)
            .finish()
    }
}

impl std::fmt::Debug for BillingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingConfig")
            .field("provider", &self.provider)
            .field("api_key", &hidden(&self.api_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::from_builder(
            config::Config::builder()
                .add_source(config::File::with_name("config/default").required(false))
                .add_source(config::File::with_name("config/local").required(false))
                .add_source(
                    config::Environment::with_prefix("APP")
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, config::ConfigError> {
        builder.build()?.try_deserialize()
    }
}
