//! 配置模块职责：
//! 1. 读取 JSON 配置文件（默认 `./config.json`），缺失时使用默认值。
//! 2. 叠加 `BOOKSHELF_*` 环境变量覆盖项。
//! 3. 启动期一次性校验签名密钥、token 生命周期、bcrypt 工作因子与数据库参数，失败即退出。

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::auth::password::{DEFAULT_BCRYPT_COST, MAX_BCRYPT_COST, MIN_BCRYPT_COST};

/// 默认配置文件路径（相对当前工作目录）。
const DEFAULT_CONFIG_PATH: &str = "config.json";
/// 配置文件路径环境变量。
const CONFIG_PATH_ENV: &str = "BOOKSHELF_CONFIG";
/// 默认监听地址。
pub(crate) const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
/// 默认 token 生命周期（分钟）。
pub(crate) const DEFAULT_EXPIRES_MINUTES: u64 = 10;
/// MySQL 默认端口。
const DEFAULT_MYSQL_PORT: u16 = 3306;
/// MySQL 默认主机。
const DEFAULT_MYSQL_SERVER: &str = "127.0.0.1";

const ADDR_ENV: &str = "BOOKSHELF_ADDR";
const JWT_KEY_ENV: &str = "BOOKSHELF_JWT_KEY";
const EXPIRES_ENV: &str = "BOOKSHELF_EXPIRES";
const BCRYPT_COST_ENV: &str = "BOOKSHELF_BCRYPT_COST";
const DATABASE_URL_ENV: &str = "BOOKSHELF_DATABASE_URL";

/// 配置校验错误。
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("jwt_key is required (config file `jwt_key` or BOOKSHELF_JWT_KEY)")]
    MissingJwtKey,
    #[error("expires must be a positive number of minutes")]
    InvalidExpires,
    #[error("bcrypt_cost {0} out of range 4..=31")]
    InvalidBcryptCost(u32),
    #[error("{key} has invalid value `{value}`")]
    InvalidNumber { key: &'static str, value: String },
    #[error("database config incomplete: {0}")]
    IncompleteDatabase(&'static str),
    #[error("bootstrap_user requires non-empty username and password")]
    InvalidBootstrapUser,
}

/// 日志与调试输出中不暴露明文的字符串。
#[derive(Clone, Default, PartialEq, Eq)]
pub(crate) struct Secret(String);

impl Secret {
    pub(crate) fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// 端口既接受数字也接受字符串（旧配置写作 `"3306"`）。
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

impl PortValue {
    fn resolve(&self) -> Result<u16, ConfigError> {
        match self {
            Self::Number(port) => Ok(*port),
            Self::Text(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                key: "port",
                value: raw.clone(),
            }),
        }
    }
}

/// 嵌套的数据库配置段。
#[derive(Debug, Clone, Default, Deserialize)]
struct DatabaseSection {
    #[serde(default)]
    url: Option<String>,
    #[serde(default, alias = "database")]
    name: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default, alias = "host")]
    server: Option<String>,
    #[serde(default)]
    port: Option<PortValue>,
}

/// 启动时创建的初始用户。
#[derive(Clone, Deserialize)]
pub(crate) struct BootstrapUser {
    pub(crate) username: String,
    pub(crate) password: String,
}

impl fmt::Debug for BootstrapUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapUser")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// 配置文件结构：字段全部可选，同时兼容旧版平铺的 PascalCase 写法。
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ConfigFile {
    #[serde(default, alias = "ListenAddr")]
    listen_addr: Option<String>,
    #[serde(default, alias = "JwtKey")]
    jwt_key: Option<String>,
    #[serde(default, alias = "Expires")]
    expires: Option<u64>,
    #[serde(default, alias = "BcryptCost")]
    bcrypt_cost: Option<u32>,
    #[serde(default)]
    database: Option<DatabaseSection>,
    #[serde(default, rename = "Database")]
    legacy_database: Option<String>,
    #[serde(default, rename = "User")]
    legacy_user: Option<String>,
    #[serde(default, rename = "Password")]
    legacy_password: Option<String>,
    #[serde(default, rename = "Server")]
    legacy_server: Option<String>,
    #[serde(default, rename = "Port")]
    legacy_port: Option<PortValue>,
    #[serde(default)]
    bootstrap_user: Option<BootstrapUser>,
}

impl ConfigFile {
    /// 新版嵌套段优先，否则回退到旧版平铺字段。
    fn database_section(&self) -> Option<DatabaseSection> {
        if let Some(section) = &self.database {
            return Some(section.clone());
        }
        let name = non_empty(self.legacy_database.as_deref())?;
        Some(DatabaseSection {
            url: None,
            name: Some(name),
            user: self.legacy_user.clone(),
            password: self.legacy_password.clone(),
            server: self.legacy_server.clone(),
            port: self.legacy_port.clone(),
        })
    }
}

/// 鉴权相关配置。
#[derive(Debug, Clone)]
pub(crate) struct AuthConfig {
    /// HMAC 签名密钥。
    pub(crate) jwt_key: Secret,
    /// token 生命周期（分钟）。
    pub(crate) expires_minutes: u64,
    /// bcrypt 工作因子。
    pub(crate) bcrypt_cost: u32,
}

impl AuthConfig {
    pub(crate) fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.expires_minutes.saturating_mul(60))
    }
}

/// MySQL 连接参数；`url` 非空时优先使用。
#[derive(Debug, Clone, Default)]
pub(crate) struct DatabaseConfig {
    pub(crate) url: Option<String>,
    pub(crate) name: String,
    pub(crate) user: String,
    pub(crate) password: String,
    pub(crate) server: String,
    pub(crate) port: u16,
}

impl DatabaseConfig {
    /// 不含密码的连接目标描述。
    pub(crate) fn display_target(&self) -> String {
        if self.url.is_some() {
            return "database url".to_string();
        }
        format!("{}@{}:{}/{}", self.user, self.server, self.port, self.name)
    }
}

/// 运行时配置。
#[derive(Debug, Clone)]
pub(crate) struct Config {
    /// HTTP 监听地址。
    pub(crate) listen_addr: String,
    pub(crate) auth: AuthConfig,
    /// 未配置时使用内存存储。
    pub(crate) database: Option<DatabaseConfig>,
    pub(crate) bootstrap_user: Option<BootstrapUser>,
    /// 实际读取的配置文件（不存在则为 `None`）。
    pub(crate) source: Option<PathBuf>,
}

impl Config {
    /// 从配置文件与进程环境变量构建配置。
    pub(crate) fn load() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .and_then(|raw| non_empty(Some(raw.as_str())))
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        let path = PathBuf::from(path);
        let file = read_config_file(&path)?;
        let source = file.is_some().then_some(path);

        let mut config = Self::resolve(file.unwrap_or_default(), |key| std::env::var(key).ok())
            .context("invalid configuration")?;
        config.source = source;
        Ok(config)
    }

    /// 合并文件与环境变量并校验；`env` 便于测试注入。
    pub(crate) fn resolve<F>(file: ConfigFile, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| non_empty(env(key).as_deref());

        let listen_addr = env(ADDR_ENV)
            .or_else(|| non_empty(file.listen_addr.as_deref()))
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());

        let jwt_key = env(JWT_KEY_ENV)
            .or_else(|| non_empty(file.jwt_key.as_deref()))
            .ok_or(ConfigError::MissingJwtKey)?;

        let expires_minutes = match env(EXPIRES_ENV) {
            Some(raw) => parse_number(EXPIRES_ENV, &raw)?,
            None => file.expires.unwrap_or(DEFAULT_EXPIRES_MINUTES),
        };
        if expires_minutes == 0 {
            return Err(ConfigError::InvalidExpires);
        }

        let bcrypt_cost = match env(BCRYPT_COST_ENV) {
            Some(raw) => parse_number(BCRYPT_COST_ENV, &raw)?,
            None => file.bcrypt_cost.unwrap_or(DEFAULT_BCRYPT_COST),
        };
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
            return Err(ConfigError::InvalidBcryptCost(bcrypt_cost));
        }

        let database = match env(DATABASE_URL_ENV) {
            Some(url) => Some(DatabaseConfig {
                url: Some(url),
                ..DatabaseConfig::default()
            }),
            None => file
                .database_section()
                .map(resolve_database)
                .transpose()?,
        };

        let bootstrap_user = match file.bootstrap_user {
            Some(user) if user.username.trim().is_empty() || user.password.is_empty() => {
                return Err(ConfigError::InvalidBootstrapUser);
            }
            other => other,
        };

        Ok(Self {
            listen_addr,
            auth: AuthConfig {
                jwt_key: Secret::new(jwt_key),
                expires_minutes,
                bcrypt_cost,
            },
            database,
            bootstrap_user,
            source: None,
        })
    }

    /// 脱敏后的配置摘要（`check-config` 输出）。
    pub(crate) fn summary(&self) -> Value {
        let storage = if self.database.is_some() {
            "mysql"
        } else {
            "memory"
        };
        json!({
            "configFile": self.source.as_ref().map(|path| path.display().to_string()),
            "listenAddr": self.listen_addr,
            "jwtKey": "<redacted>",
            "expiresMinutes": self.auth.expires_minutes,
            "bcryptCost": self.auth.bcrypt_cost,
            "storage": storage,
            "database": self.database.as_ref().map(DatabaseConfig::display_target),
            "bootstrapUser": self.bootstrap_user.as_ref().map(|user| user.username.clone()),
        })
    }
}

/// 读取配置文件；文件不存在返回 `None`。
fn read_config_file(path: &Path) -> anyhow::Result<Option<ConfigFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read config failed: {}", path.display()))?;
    let parsed = serde_json::from_str(&raw)
        .with_context(|| format!("decode config failed: {}", path.display()))?;
    Ok(Some(parsed))
}

fn resolve_database(section: DatabaseSection) -> Result<DatabaseConfig, ConfigError> {
    if let Some(url) = non_empty(section.url.as_deref()) {
        return Ok(DatabaseConfig {
            url: Some(url),
            ..DatabaseConfig::default()
        });
    }
    let name = non_empty(section.name.as_deref())
        .ok_or(ConfigError::IncompleteDatabase("database name is required"))?;
    let user = non_empty(section.user.as_deref())
        .ok_or(ConfigError::IncompleteDatabase("database user is required"))?;
    let port = match &section.port {
        Some(port) => port.resolve()?,
        None => DEFAULT_MYSQL_PORT,
    };
    Ok(DatabaseConfig {
        url: None,
        name,
        user,
        password: section.password.unwrap_or_default(),
        server: non_empty(section.server.as_deref())
            .unwrap_or_else(|| DEFAULT_MYSQL_SERVER.to_string()),
        port,
    })
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse::<T>().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: raw.to_string(),
    })
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{Config, ConfigError, ConfigFile, DEFAULT_LISTEN_ADDR};

    fn file(raw: &str) -> ConfigFile {
        serde_json::from_str(raw).unwrap()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn legacy_pascal_case_file_is_accepted() {
        let config = Config::resolve(
            file(
                r#"{"JwtKey":"my_secret","Expires":15,"Database":"test","User":"root",
                    "Password":"pw","Server":"db.local","Port":"3307"}"#,
            ),
            no_env,
        )
        .unwrap();

        assert_eq!(config.auth.jwt_key.expose(), "my_secret");
        assert_eq!(config.auth.expires_minutes, 15);
        assert_eq!(config.auth.token_ttl().as_secs(), 900);
        let db = config.database.unwrap();
        assert_eq!(db.name, "test");
        assert_eq!(db.server, "db.local");
        assert_eq!(db.port, 3307);
        assert_eq!(db.display_target(), "root@db.local:3307/test");
    }

    #[test]
    fn defaults_apply_without_database() {
        let config = Config::resolve(file(r#"{"jwt_key":"k"}"#), no_env).unwrap();
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
        assert_eq!(config.auth.expires_minutes, 10);
        assert_eq!(config.auth.bcrypt_cost, 10);
        assert!(config.database.is_none());
        assert_eq!(config.summary()["storage"], "memory");
    }

    #[test]
    fn environment_overrides_file() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("BOOKSHELF_JWT_KEY", "from-env"),
            ("BOOKSHELF_EXPIRES", "30"),
            ("BOOKSHELF_ADDR", "127.0.0.1:9000"),
            ("BOOKSHELF_DATABASE_URL", "mysql://u:p@h/db"),
        ]);
        let config = Config::resolve(
            file(r#"{"jwt_key":"from-file","expires":5}"#),
            |key| env.get(key).map(|value| value.to_string()),
        )
        .unwrap();

        assert_eq!(config.auth.jwt_key.expose(), "from-env");
        assert_eq!(config.auth.expires_minutes, 30);
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(
            config.database.unwrap().url.as_deref(),
            Some("mysql://u:p@h/db")
        );
    }

    #[test]
    fn missing_or_blank_key_is_fatal() {
        assert!(matches!(
            Config::resolve(file("{}"), no_env),
            Err(ConfigError::MissingJwtKey)
        ));
        assert!(matches!(
            Config::resolve(file(r#"{"jwt_key":"   "}"#), no_env),
            Err(ConfigError::MissingJwtKey)
        ));
    }

    #[test]
    fn invalid_numbers_are_fatal() {
        assert!(matches!(
            Config::resolve(file(r#"{"jwt_key":"k","expires":0}"#), no_env),
            Err(ConfigError::InvalidExpires)
        ));
        assert!(matches!(
            Config::resolve(file(r#"{"jwt_key":"k","bcrypt_cost":40}"#), no_env),
            Err(ConfigError::InvalidBcryptCost(40))
        ));
        assert!(matches!(
            Config::resolve(file(r#"{"jwt_key":"k"}"#), |key| {
                (key == "BOOKSHELF_EXPIRES").then(|| "ten".to_string())
            }),
            Err(ConfigError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn nested_database_requires_name_and_user() {
        assert!(matches!(
            Config::resolve(
                file(r#"{"jwt_key":"k","database":{"user":"root"}}"#),
                no_env
            ),
            Err(ConfigError::IncompleteDatabase(_))
        ));
        let config = Config::resolve(
            file(r#"{"jwt_key":"k","database":{"name":"shelf","user":"app"}}"#),
            no_env,
        )
        .unwrap();
        let db = config.database.unwrap();
        assert_eq!((db.server.as_str(), db.port), ("127.0.0.1", 3306));
    }

    #[test]
    fn secrets_are_redacted() {
        let config = Config::resolve(
            file(
                r#"{"jwt_key":"top-secret","bootstrap_user":{"username":"admin","password":"hunter2"}}"#,
            ),
            no_env,
        )
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("top-secret"));
        assert!(!debug.contains("hunter2"));
        let summary = config.summary().to_string();
        assert!(!summary.contains("top-secret"));
        assert!(summary.contains("admin"));
    }

    #[test]
    fn bootstrap_user_needs_password() {
        assert!(matches!(
            Config::resolve(
                file(r#"{"jwt_key":"k","bootstrap_user":{"username":"admin","password":""}}"#),
                no_env
            ),
            Err(ConfigError::InvalidBootstrapUser)
        ));
    }
}
