use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub otp: OtpConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64,  // seconds
    pub refresh_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfig {
    /// Lifetime of a code in seconds
    #[serde(default = "default_otp_expires_in")]
    pub expires_in: i64,
    /// Minimum gap between two requests for the same phone, in seconds
    #[serde(default = "default_otp_resend_interval")]
    pub resend_interval: i64,
    /// Echo the code in the response body. Never enable in production.
    #[serde(default)]
    pub expose_code: bool,
}

fn default_otp_expires_in() -> i64 {
    300
}

fn default_otp_resend_interval() -> i64 {
    60
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            expires_in: default_otp_expires_in(),
            resend_interval: default_otp_resend_interval(),
            expose_code: false,
        }
    }
}

/// Admin apollonyar ensured at startup
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub admin_phone: Option<String>,
    #[serde(default)]
    pub admin_password: Option<String>,
    #[serde(default)]
    pub admin_first_name: Option<String>,
    #[serde(default)]
    pub admin_last_name: Option<String>,
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // a missing file means env-only configuration
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => toml::from_str(&config_str)
                .map_err(|e| format!("Failed to parse config file: {e}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and config.toml was not found")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                        refresh_token_expires_in: get_env_parse(
                            "JWT_REFRESH_EXPIRES_IN",
                            2_592_000i64,
                        ),
                    },
                    otp: OtpConfig::default(),
                    bootstrap: BootstrapConfig::default(),
                }
            }
            Err(e) => {
                return Err(format!("Cannot read config file {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment variables win over file values.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("JWT_REFRESH_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.refresh_token_expires_in = n;
        }
        if let Ok(v) = env::var("OTP_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.otp.expires_in = n;
        }
        if let Ok(v) = env::var("OTP_RESEND_INTERVAL")
            && let Ok(n) = v.parse()
        {
            self.otp.resend_interval = n;
        }
        if let Ok(v) = env::var("OTP_EXPOSE_CODE")
            && let Ok(b) = v.parse()
        {
            self.otp.expose_code = b;
        }
        if let Ok(v) = env::var("BOOTSTRAP_ADMIN_PHONE") {
            self.bootstrap.admin_phone = Some(v);
        }
        if let Ok(v) = env::var("BOOTSTRAP_ADMIN_PASSWORD") {
            self.bootstrap.admin_password = Some(v);
        }
        if let Ok(v) = env::var("BOOTSTRAP_ADMIN_FIRST_NAME") {
            self.bootstrap.admin_first_name = Some(v);
        }
        if let Ok(v) = env::var("BOOTSTRAP_ADMIN_LAST_NAME") {
            self.bootstrap.admin_last_name = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_toml() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            url = "sqlite::memory:"
            max_connections = 1

            [jwt]
            secret = "s"
            access_token_expires_in = 60
            refresh_token_expires_in = 120
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.otp.expires_in, 300);
        assert_eq!(config.otp.resend_interval, 60);
        assert!(!config.otp.expose_code);
        assert!(config.bootstrap.admin_phone.is_none());
    }

    #[test]
    fn test_parse_otp_section() {
        let raw = r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [database]
            url = "postgres://localhost/apollon"
            max_connections = 5

            [jwt]
            secret = "s"
            access_token_expires_in = 60
            refresh_token_expires_in = 120

            [otp]
            expires_in = 120
            expose_code = true
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.otp.expires_in, 120);
        assert_eq!(config.otp.resend_interval, 60);
        assert!(config.otp.expose_code);
    }
}
