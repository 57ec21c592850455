use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
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
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

/// 身份令牌由外部认证服务签发，这里只做校验
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_unauthorized_path")]
    pub unauthorized_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    pub channel_capacity: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    pub enabled: bool,
    pub expiry_scan_interval_secs: u64,
    pub overdue_scan_interval_secs: u64,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            expiry_scan_interval_secs: 24 * 3600,
            overdue_scan_interval_secs: 3600,
        }
    }
}

fn default_acquire_timeout() -> u64 {
    8
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_unauthorized_path() -> String {
    "/unauthorized".to_string()
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let mut config: Config = match std::fs::read_to_string(&config_path) {
            // 有配置文件：先解析再用环境变量覆盖
            Ok(config_str) => Self::parse(&config_str)?,
            // 无配置文件：使用环境变量与默认值构建
            Err(e) if e.kind() == ErrorKind::NotFound => Self::from_env()?,
            Err(e) => {
                return Err(format!("Cannot read config file {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn parse(config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        toml::from_str(config_str).map_err(|e| format!("Failed to parse config file: {e}").into())
    }

    fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let database_url = get_env("DATABASE_URL")
            .ok_or("DATABASE_URL is not set and no config.toml was found")?;
        let jwt_secret =
            get_env("JWT_SECRET").ok_or("JWT_SECRET is not set and no config.toml was found")?;

        Ok(Config {
            server: ServerConfig {
                host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get_env_parse("SERVER_PORT").unwrap_or(8080),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: get_env_parse("DB_MAX_CONNECTIONS").unwrap_or(10),
                acquire_timeout_secs: get_env_parse("DB_ACQUIRE_TIMEOUT_SECS")
                    .unwrap_or_else(default_acquire_timeout),
            },
            auth: AuthConfig {
                jwt_secret,
                audience: get_env("JWT_AUDIENCE"),
                login_path: default_login_path(),
                unauthorized_path: default_unauthorized_path(),
            },
            realtime: RealtimeConfig::default(),
            tasks: TasksConfig::default(),
        })
    }

    // 环境变量覆盖（即便文件存在时也覆盖）
    fn apply_env_overrides(&mut self) {
        if let Some(v) = get_env("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(p) = get_env_parse("SERVER_PORT") {
            self.server.port = p;
        }
        if let Some(v) = get_env("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(n) = get_env_parse("DB_MAX_CONNECTIONS") {
            self.database.max_connections = n;
        }
        if let Some(n) = get_env_parse("DB_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs = n;
        }
        if let Some(v) = get_env("JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Some(v) = get_env("JWT_AUDIENCE") {
            self.auth.audience = Some(v);
        }
        if let Some(v) = get_env("AUTH_LOGIN_PATH") {
            self.auth.login_path = v;
        }
        if let Some(v) = get_env("AUTH_UNAUTHORIZED_PATH") {
            self.auth.unauthorized_path = v;
        }
        if let Some(n) = get_env_parse("REALTIME_CHANNEL_CAPACITY") {
            self.realtime.channel_capacity = n;
        }
        if let Some(b) = get_env_parse("TASKS_ENABLED") {
            self.tasks.enabled = b;
        }
        if let Some(n) = get_env_parse("TASKS_EXPIRY_SCAN_INTERVAL_SECS") {
            self.tasks.expiry_scan_interval_secs = n;
        }
        if let Some(n) = get_env_parse("TASKS_OVERDUE_SCAN_INTERVAL_SECS") {
            self.tasks.overdue_scan_interval_secs = n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let cfg = Config::parse(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            url = "postgres://localhost/gym"
            max_connections = 5

            [auth]
            jwt_secret = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.database.acquire_timeout_secs, 8);
        assert_eq!(cfg.auth.login_path, "/login");
        assert_eq!(cfg.auth.unauthorized_path, "/unauthorized");
        assert_eq!(cfg.realtime.channel_capacity, 1024);
        assert!(cfg.tasks.enabled);
        assert_eq!(cfg.tasks.overdue_scan_interval_secs, 3600);
    }

    #[test]
    fn test_parse_rejects_missing_section() {
        let err = Config::parse("[server]\nhost = \"x\"\nport = 1\n").unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
