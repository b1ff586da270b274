use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerCfg {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Issuer URL advertised in the RFC 8414 document and used to build the
    /// endpoint URLs.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MerchantCfg {
    #[serde(default = "default_merchant_name")]
    pub name: String,
    /// The user the consent screen acts for. There is no user login here;
    /// the merchant server in front of us authenticates the user and this
    /// server trusts the id it supplies.
    #[serde(default = "default_consent_user_id")]
    pub consent_user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerCfg,
    pub merchant: MerchantCfg,
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}
fn default_public_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_merchant_name() -> String {
    "UCP Merchant".to_string()
}
fn default_consent_user_id() -> String {
    "user_1".to_string()
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let settings = config::Config::builder()
            .add_source(config::Environment::default().separator("_"))
            .build()?;

        // Map flat env names to the nested structure for convenience:
        // UCP_BIND_ADDR, UCP_PUBLIC_URL, UCP_MERCHANT_NAME, UCP_CONSENT_USER_ID
        let server = settings.get::<ServerCfg>("server").unwrap_or(ServerCfg {
            bind_addr: std::env::var("UCP_BIND_ADDR").unwrap_or_else(|_| default_bind_addr()),
            public_url: std::env::var("UCP_PUBLIC_URL").unwrap_or_else(|_| default_public_url()),
        });

        let merchant = settings.get::<MerchantCfg>("merchant").unwrap_or(MerchantCfg {
            name: std::env::var("UCP_MERCHANT_NAME").unwrap_or_else(|_| default_merchant_name()),
            consent_user_id: std::env::var("UCP_CONSENT_USER_ID")
                .unwrap_or_else(|_| default_consent_user_id()),
        });

        Ok(AppConfig { server, merchant })
    }

    /// A config with defaults only, used by tests.
    pub fn for_tests() -> Self {
        AppConfig {
            server: ServerCfg {
                bind_addr: "127.0.0.1:0".to_string(),
                public_url: default_public_url(),
            },
            merchant: MerchantCfg {
                name: default_merchant_name(),
                consent_user_id: default_consent_user_id(),
            },
        }
    }
}
