use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[validate]
    pub templates: TemplateConfig,
    #[validate]
    pub output: OutputConfig,
    pub forms: FormsConfig,
    #[validate]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TemplateConfig {
    #[validate(length(min = 1))]
    pub directory: String,
    /// File name pattern, `{code}` is replaced by the lower-cased form code
    #[validate(length(min = 1), custom = "crate::validation::validate_file_pattern")]
    pub file_pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OutputConfig {
    #[validate(length(min = 1))]
    pub directory: String,
    #[validate(length(min = 1, max = 32))]
    pub file_prefix: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormsConfig {
    /// YAML catalog replacing the built-in mapping tables
    pub catalog_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoggingConfig {
    #[validate(length(min = 1))]
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Start with default values
            .add_source(File::with_name("config/default").required(false))
            // Add environment-specific config
            .add_source(
                File::with_name(&format!(
                    "config/{}",
                    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // Add local config (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with COMPLYMATE prefix
            .add_source(Environment::with_prefix("COMPLYMATE").separator("__"));

        config.build()?.try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            templates: TemplateConfig {
                directory: "static/templates".to_string(),
                file_pattern: "osha_{code}_template.pdf".to_string(),
            },
            output: OutputConfig {
                directory: "generated_forms".to_string(),
                file_prefix: "osha".to_string(),
            },
            forms: FormsConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
                file_path: None,
            },
        }
    }
}
