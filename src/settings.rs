use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RostersyncSettings {
    pub application: ApplicationSettings,
    pub admin: AdminSettings,
    pub google: GoogleSettings,
    pub source: SourceSettings,
    pub sync: SyncSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AdminSettings {
    /// Shared bearer token required by the /admin endpoints.
    /// Empty disables the endpoints rather than leaving them open.
    pub api_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// Service account identity used as the `iss` claim
    pub service_account_email: String,
    /// PEM-encoded private key material; takes precedence over the path
    pub private_key: String,
    /// Path to a PEM file, read when `private_key` is empty
    pub private_key_path: String,
    /// Workspace admin impersonated through domain-wide delegation (`sub`)
    pub impersonated_admin: String,
    /// OAuth scope requested for the directory API
    pub scope: String,
    /// Group the roster is reconciled into
    pub group_email: String,
    pub token_endpoint: String,
    pub api_base_url: String,
    /// Wall-clock minutes after which a cached access token is replaced.
    /// Kept below the 60-minute assertion window so a long run never calls
    /// the directory API with a token near expiry.
    pub token_refresh_minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Base URL of the hosted backend exposing the user table over REST
    pub base_url: String,
    /// Service-role API key for the backend REST surface
    pub api_key: String,
    pub table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub batch_size: u64,
    /// Pacing delay after every member-add attempt
    pub record_delay_ms: u64,
    /// Pause between consecutive pages
    pub batch_delay_ms: u64,
    /// Cooldown before the single retry of a rate-limited call
    pub rate_limit_cooldown_ms: u64,
    /// Wall-clock budget for one run; 0 means unbounded
    pub deadline_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            service_account_email: String::new(),
            private_key: String::new(),
            private_key_path: String::new(),
            impersonated_admin: String::new(),
            scope: "https://www.googleapis.com/auth/admin.directory.group.member".to_string(),
            group_email: String::new(),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            api_base_url: "https://admin.googleapis.com".to_string(),
            token_refresh_minutes: 45,
        }
    }
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            table: "profiles".to_string(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            batch_size: 50,
            record_delay_ms: 200,
            batch_delay_ms: 2000,
            rate_limit_cooldown_ms: 10_000,
            deadline_secs: 0,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl RostersyncSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but cannot be read or
    /// parsed as TOML.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::initialize_environment();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        Ok(settings)
    }

    /// Load the .env file (if present) and initialize the logger
    fn initialize_environment() {
        Self::load_env_file();
        let _ = env_logger::try_init();
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `ROSTERSYNC_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        let default_config_path = std::path::PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            let toml_content = fs::read_to_string(&default_config_path)?;
            settings = basic_toml::from_str(&toml_content)?;
            log::info!("Loaded base settings from {}", default_config_path.display());
        }

        if let Ok(secrets_dir) = std::env::var("ROSTERSYNC_SECRETS_DIR") {
            let secrets_path = std::path::Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                let secrets_toml_content = fs::read_to_string(&secrets_path)?;
                settings = basic_toml::from_str(&secrets_toml_content)?;
                log::info!("Overriding settings from {}", secrets_path.display());
            } else {
                log::info!(
                    "ROSTERSYNC_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_admin_env_overrides(&mut settings.admin);
        Self::apply_google_env_overrides(&mut settings.google);
        Self::apply_source_env_overrides(&mut settings.source);
        Self::apply_sync_env_overrides(&mut settings.sync);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
    }

    fn apply_admin_env_overrides(admin_settings: &mut AdminSettings) {
        if let Ok(token) = std::env::var("ADMIN_API_TOKEN") {
            admin_settings.api_token = token;
        }
    }

    pub fn apply_google_env_overrides(google_settings: &mut GoogleSettings) {
        Self::apply_string_env_override(
            "GOOGLE_SERVICE_ACCOUNT_EMAIL",
            &mut google_settings.service_account_email,
        );
        Self::apply_string_env_override(
            "GOOGLE_SERVICE_ACCOUNT_KEY",
            &mut google_settings.private_key,
        );
        Self::apply_string_env_override(
            "GOOGLE_SERVICE_ACCOUNT_KEY_PATH",
            &mut google_settings.private_key_path,
        );
        Self::apply_string_env_override(
            "GOOGLE_IMPERSONATED_ADMIN",
            &mut google_settings.impersonated_admin,
        );
        Self::apply_string_env_override("GOOGLE_GROUP_EMAIL", &mut google_settings.group_email);
        Self::apply_string_env_override(
            "GOOGLE_TOKEN_ENDPOINT",
            &mut google_settings.token_endpoint,
        );
        Self::apply_string_env_override("GOOGLE_API_BASE_URL", &mut google_settings.api_base_url);
        Self::apply_numeric_env_override(
            "GOOGLE_TOKEN_REFRESH_MINUTES",
            &mut google_settings.token_refresh_minutes,
        );
    }

    fn apply_source_env_overrides(source_settings: &mut SourceSettings) {
        Self::apply_string_env_override("SOURCE_BASE_URL", &mut source_settings.base_url);
        Self::apply_string_env_override("SOURCE_API_KEY", &mut source_settings.api_key);
        Self::apply_string_env_override("SOURCE_TABLE", &mut source_settings.table);
    }

    pub fn apply_sync_env_overrides(sync_settings: &mut SyncSettings) {
        Self::apply_numeric_env_override("SYNC_BATCH_SIZE", &mut sync_settings.batch_size);
        Self::apply_numeric_env_override("SYNC_RECORD_DELAY_MS", &mut sync_settings.record_delay_ms);
        Self::apply_numeric_env_override("SYNC_BATCH_DELAY_MS", &mut sync_settings.batch_delay_ms);
        Self::apply_numeric_env_override(
            "SYNC_RATE_LIMIT_COOLDOWN_MS",
            &mut sync_settings.rate_limit_cooldown_ms,
        );
        Self::apply_numeric_env_override("SYNC_DEADLINE_SECS", &mut sync_settings.deadline_secs);
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    fn apply_string_env_override(env_var: &str, target: &mut String) {
        if let Ok(value) = std::env::var(env_var) {
            if !value.is_empty() {
                *target = value;
            }
        }
    }

    fn apply_numeric_env_override(env_var: &str, target: &mut u64) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<u64>() {
                *target = value;
            }
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // Helper function to clean all relevant environment variables for tests
    fn clean_env_vars() {
        std::env::remove_var("ADMIN_API_TOKEN");
        std::env::remove_var("GOOGLE_SERVICE_ACCOUNT_EMAIL");
        std::env::remove_var("GOOGLE_SERVICE_ACCOUNT_KEY");
        std::env::remove_var("GOOGLE_SERVICE_ACCOUNT_KEY_PATH");
        std::env::remove_var("GOOGLE_IMPERSONATED_ADMIN");
        std::env::remove_var("GOOGLE_GROUP_EMAIL");
        std::env::remove_var("GOOGLE_TOKEN_ENDPOINT");
        std::env::remove_var("GOOGLE_API_BASE_URL");
        std::env::remove_var("GOOGLE_TOKEN_REFRESH_MINUTES");
        std::env::remove_var("SOURCE_BASE_URL");
        std::env::remove_var("SOURCE_API_KEY");
        std::env::remove_var("SOURCE_TABLE");
        std::env::remove_var("SYNC_BATCH_SIZE");
        std::env::remove_var("SYNC_DEADLINE_SECS");
        std::env::remove_var("ROSTERSYNC_SECRETS_DIR");
    }

    #[test]
    fn test_default_settings() {
        let settings = RostersyncSettings::default();

        assert_eq!(settings.application.port, 8080);
        assert_eq!(settings.sync.batch_size, 50);
        assert_eq!(settings.sync.record_delay_ms, 200);
        assert_eq!(settings.sync.batch_delay_ms, 2000);
        assert_eq!(settings.sync.rate_limit_cooldown_ms, 10_000);
        assert_eq!(settings.sync.deadline_secs, 0);
        assert_eq!(settings.google.token_refresh_minutes, 45);
        assert_eq!(
            settings.google.token_endpoint,
            "https://oauth2.googleapis.com/token"
        );
        assert_eq!(settings.source.table, "profiles");
        // Endpoint is disabled until a token is configured
        assert!(settings.admin.api_token.is_empty());
    }

    #[test]
    #[serial]
    fn test_google_env_overrides() {
        clean_env_vars();

        let mut google = GoogleSettings::default();
        std::env::set_var("GOOGLE_SERVICE_ACCOUNT_EMAIL", "sync@project.iam.example");
        std::env::set_var("GOOGLE_IMPERSONATED_ADMIN", "admin@school.example");
        std::env::set_var("GOOGLE_TOKEN_REFRESH_MINUTES", "30");

        RostersyncSettings::apply_google_env_overrides(&mut google);

        assert_eq!(google.service_account_email, "sync@project.iam.example");
        assert_eq!(google.impersonated_admin, "admin@school.example");
        assert_eq!(google.token_refresh_minutes, 30);
        // Untouched settings keep their defaults
        assert_eq!(google.api_base_url, "https://admin.googleapis.com");

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_empty_env_value_does_not_clear_setting() {
        clean_env_vars();

        let mut google = GoogleSettings {
            group_email: "members@school.example".to_string(),
            ..Default::default()
        };
        std::env::set_var("GOOGLE_GROUP_EMAIL", "");

        RostersyncSettings::apply_google_env_overrides(&mut google);

        assert_eq!(google.group_email, "members@school.example");

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_sync_env_overrides() {
        clean_env_vars();

        let mut sync = SyncSettings::default();
        std::env::set_var("SYNC_BATCH_SIZE", "25");
        std::env::set_var("SYNC_DEADLINE_SECS", "600");

        RostersyncSettings::apply_sync_env_overrides(&mut sync);

        assert_eq!(sync.batch_size, 25);
        assert_eq!(sync.deadline_secs, 600);
        assert_eq!(sync.record_delay_ms, 200);

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_non_numeric_override_is_ignored() {
        clean_env_vars();

        let mut sync = SyncSettings::default();
        std::env::set_var("SYNC_BATCH_SIZE", "fifty");

        RostersyncSettings::apply_sync_env_overrides(&mut sync);

        assert_eq!(sync.batch_size, 50);

        clean_env_vars();
    }

    #[test]
    fn test_settings_parse_from_toml() {
        let toml = r#"
            [application]
            host = "127.0.0.1"
            port = 9090

            [admin]
            api_token = "sekrit"

            [google]
            service_account_email = "sync@project.iam.example"
            group_email = "members@school.example"

            [sync]
            batch_size = 10
        "#;

        let settings: RostersyncSettings = basic_toml::from_str(toml).unwrap();

        assert_eq!(settings.get_bind_address(), "127.0.0.1:9090");
        assert_eq!(settings.admin.api_token, "sekrit");
        assert_eq!(settings.sync.batch_size, 10);
        // Sections and fields absent from the file keep their defaults
        assert_eq!(settings.sync.record_delay_ms, 200);
        assert_eq!(
            settings.google.scope,
            "https://www.googleapis.com/auth/admin.directory.group.member"
        );
        assert_eq!(settings.source.table, "profiles");
    }
}
