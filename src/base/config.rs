//! Load configuration via `config` crate with env-override support.

use std::{net::SocketAddr, ops::Deref, sync::Arc};

use serde::Deserialize;

use crate::base::prompts;

use super::types::Res;

/// Default OpenAI model to use for intent extraction
fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

/// Default sampling temperature for intent extraction
fn default_openai_temperature() -> f32 {
    0.3
}

/// Default max output tokens for OpenAI model
fn default_openai_max_tokens() -> u32 {
    200
}

/// Default per-call timeout for OpenAI, in seconds
fn default_openai_timeout_secs() -> u64 {
    10
}

/// Default system directive for the assistant agent.
fn default_assistant_system_directive() -> String {
    prompts::ASSISTANT_SYSTEM_DIRECTIVE.to_string()
}

fn default_whatsapp_api_base_url() -> String {
    "https://graph.facebook.com/v18.0".to_string()
}

fn default_paystack_base_url() -> String {
    "https://api.paystack.co".to_string()
}

fn default_mpesa_environment() -> String {
    "sandbox".to_string()
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

/// Where product data comes from.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CatalogBackend {
    /// Supabase `products` table over PostgREST.
    #[default]
    Supabase,
    /// In-memory SurrealDB seeded with the shop inventory.
    Memory,
}

/// Configuration for the phil-elect application.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// OpenAI API key (`OPENAI_API_KEY`).
    #[serde(default)]
    pub openai_api_key: Option<String>,
    /// OpenAI model used for intent extraction (`OPENAI_MODEL`).
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    /// Sampling temperature for intent extraction (`OPENAI_TEMPERATURE`).
    /// Value between 0 and 2.
    #[serde(default = "default_openai_temperature")]
    pub openai_temperature: f32,
    /// Max output tokens for OpenAI model (`OPENAI_MAX_TOKENS`).
    #[serde(default = "default_openai_max_tokens")]
    pub openai_max_tokens: u32,
    /// Timeout for a single OpenAI call, in seconds (`OPENAI_TIMEOUT_SECS`).
    #[serde(default = "default_openai_timeout_secs")]
    pub openai_timeout_secs: u64,
    /// Extra attempts after a failed or timed out OpenAI call (`OPENAI_MAX_RETRIES`).
    #[serde(default)]
    pub openai_max_retries: u32,
    /// Optional custom system directive to override the default (`ASSISTANT_SYSTEM_DIRECTIVE`).
    #[serde(default = "default_assistant_system_directive")]
    pub assistant_system_directive: String,
    /// Token Meta echoes during webhook verification (`WHATSAPP_VERIFY_TOKEN`).
    #[serde(default)]
    pub whatsapp_verify_token: Option<String>,
    /// WhatsApp Cloud API bearer token (`WHATSAPP_API_TOKEN`).
    #[serde(default)]
    pub whatsapp_api_token: Option<String>,
    /// WhatsApp business phone number ID (`WHATSAPP_PHONE_NUMBER_ID`).
    #[serde(default)]
    pub whatsapp_phone_number_id: Option<String>,
    /// Graph API base URL, including the version (`WHATSAPP_API_BASE_URL`).
    #[serde(default = "default_whatsapp_api_base_url")]
    pub whatsapp_api_base_url: String,
    /// Supabase project URL (`SUPABASE_URL`).
    #[serde(default)]
    pub supabase_url: Option<String>,
    /// Supabase API key (`SUPABASE_KEY`).
    #[serde(default)]
    pub supabase_key: Option<String>,
    /// Catalog backend (`CATALOG_BACKEND`): `supabase` or `memory`.
    #[serde(default)]
    pub catalog_backend: CatalogBackend,
    /// Paystack secret key (`PAYSTACK_SECRET_KEY`).  Keys starting with `sk_test_` enable test mode.
    #[serde(default)]
    pub paystack_secret_key: Option<String>,
    /// Paystack API base URL (`PAYSTACK_BASE_URL`).
    #[serde(default = "default_paystack_base_url")]
    pub paystack_base_url: String,
    /// M-Pesa environment (`MPESA_ENVIRONMENT`): `sandbox` or `production`.
    #[serde(default = "default_mpesa_environment")]
    pub mpesa_environment: String,
    /// Daraja consumer key (`MPESA_CONSUMER_KEY`).
    #[serde(default)]
    pub mpesa_consumer_key: Option<String>,
    /// Daraja consumer secret (`MPESA_CONSUMER_SECRET`).
    #[serde(default)]
    pub mpesa_consumer_secret: Option<String>,
    /// Address the HTTP server binds to (`LISTEN_ADDR`).
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl ConfigInner {
    /// Whether M-Pesa is pointed at production.
    pub fn is_production(&self) -> bool {
        self.mpesa_environment == "production"
    }
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        Self::load_from(config::Environment::default(), explicit_path)
    }

    /// Load from the given environment source, then the config file.
    ///
    /// Environment values stay strings; typed fields are parsed on deserialize.
    fn load_from(environment: config::Environment, explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(environment);

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Res<()> {
        if self.openai_temperature < 0.0 || self.openai_temperature > 2.0 {
            return Err(anyhow::anyhow!("OpenAI temperature must be between 0 and 2."));
        }

        if self.openai_max_tokens < 1 || self.openai_max_tokens > 128000 {
            return Err(anyhow::anyhow!("OpenAI max tokens must be between 1 and 128000."));
        }

        if self.openai_timeout_secs < 1 {
            return Err(anyhow::anyhow!("OpenAI timeout must be at least 1 second."));
        }

        if self.mpesa_environment != "sandbox" && self.mpesa_environment != "production" {
            return Err(anyhow::anyhow!("M-Pesa environment must be `sandbox` or `production`."));
        }

        self.listen_addr.parse::<SocketAddr>().map_err(|e| anyhow::anyhow!("Invalid listen address `{}`: {e}", self.listen_addr))?;

        Ok(())
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn load_toml(contents: &str) -> Res<Config> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();

        Config::load(Some(file.path()))
    }

    #[test]
    fn test_defaults_from_minimal_file() {
        let config = load_toml("whatsapp_verify_token = \"secret\"\n").unwrap();

        assert_eq!(config.whatsapp_verify_token.as_deref(), Some("secret"));
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.openai_max_tokens, 200);
        assert_eq!(config.openai_timeout_secs, 10);
        assert_eq!(config.whatsapp_api_base_url, "https://graph.facebook.com/v18.0");
        assert_eq!(config.paystack_base_url, "https://api.paystack.co");
        assert_eq!(config.listen_addr, "0.0.0.0:3000");
        assert!(!config.is_production());
        assert!(config.assistant_system_directive.contains("Phil-Elect"));
    }

    #[test]
    fn test_environment_variables_are_read_verbatim() {
        let vars = [
            ("OPENAI_API_KEY", "sk-proj-0042abc"),
            ("WHATSAPP_VERIFY_TOKEN", "007"),
            ("WHATSAPP_API_TOKEN", "EAAG0123"),
            ("WHATSAPP_PHONE_NUMBER_ID", "0109876543"),
            ("SUPABASE_URL", "https://abcd.supabase.co"),
            ("SUPABASE_KEY", "1e5"),
            ("MPESA_CONSUMER_KEY", "true"),
            ("MPESA_CONSUMER_SECRET", "nan"),
            ("OPENAI_TEMPERATURE", "0.7"),
            ("OPENAI_MAX_TOKENS", "300"),
        ];
        let env = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<config::Map<_, _>>();

        let config = Config::load_from(config::Environment::default().source(Some(env)), None).unwrap();

        assert_eq!(config.openai_api_key.as_deref(), Some("sk-proj-0042abc"));
        assert_eq!(config.whatsapp_verify_token.as_deref(), Some("007"));
        assert_eq!(config.whatsapp_api_token.as_deref(), Some("EAAG0123"));
        assert_eq!(config.whatsapp_phone_number_id.as_deref(), Some("0109876543"));
        assert_eq!(config.supabase_url.as_deref(), Some("https://abcd.supabase.co"));
        assert_eq!(config.supabase_key.as_deref(), Some("1e5"));
        assert_eq!(config.mpesa_consumer_key.as_deref(), Some("true"));
        assert_eq!(config.mpesa_consumer_secret.as_deref(), Some("nan"));
        assert_eq!(config.openai_temperature, 0.7);
        assert_eq!(config.openai_max_tokens, 300);
    }

    #[test]
    fn test_catalog_backend_parses() {
        let config = load_toml("catalog_backend = \"memory\"\n").unwrap();

        assert_eq!(config.catalog_backend, CatalogBackend::Memory);
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let result = load_toml("openai_temperature = 3.5\n");

        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_bad_listen_addr() {
        let result = load_toml("listen_addr = \"not an address\"\n");

        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_mpesa_environment() {
        let result = load_toml("mpesa_environment = \"staging\"\n");

        assert!(result.is_err());
    }
}
