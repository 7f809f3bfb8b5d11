use serde::Deserialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

const DEFAULT_ADMIN_USER: &str = "admin";
const DEFAULT_ADMIN_PASS: &str = "admin";
const DEFAULT_SESSION_SECRET: &str = "dev-secret-change-me";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("could not parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Process-wide settings, loaded once at startup and handed to whoever needs them.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: Server,
    pub postgres: Postgres,
    pub loki: Option<Loki>,
    pub admin: Admin,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Server {
    pub bind: String,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".into(),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct Postgres {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub db_name: String,
    /// Full connection url, wins over the individual fields when set.
    pub url: Option<String>,
}

impl Default for Postgres {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            user: "postgres".into(),
            password: "postgres".into(),
            db_name: "cars".into(),
            url: None,
        }
    }
}

impl Postgres {
    pub fn database_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{user}:{password}@{host}:{port}/{db_name}",
                user = self.user,
                password = self.password,
                host = self.host,
                port = self.port,
                db_name = self.db_name
            ),
        }
    }
}

impl fmt::Debug for Postgres {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Postgres")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("db_name", &self.db_name)
            .field("url", &self.url.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Loki {
    pub url: String,
}

/// Admin console credentials and the key that signs its session cookie.
#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct Admin {
    pub admin_user: String,
    pub admin_pass: String,
    pub session_secret: String,
}

impl Default for Admin {
    fn default() -> Self {
        Self {
            admin_user: DEFAULT_ADMIN_USER.into(),
            admin_pass: DEFAULT_ADMIN_PASS.into(),
            session_secret: DEFAULT_SESSION_SECRET.into(),
        }
    }
}

impl Admin {
    pub fn uses_insecure_defaults(&self) -> bool {
        self.admin_pass == DEFAULT_ADMIN_PASS || self.session_secret == DEFAULT_SESSION_SECRET
    }
}

impl fmt::Debug for Admin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Admin")
            .field("admin_user", &self.admin_user)
            .field("admin_pass", &"***")
            .field("session_secret", &"***")
            .finish()
    }
}

impl Config {
    /// Reads `.env`, then the yaml file at `CONFIG_PATH` (or `config.yaml`), then applies
    /// environment overrides. A missing default file yields the built-in defaults.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = match std::env::var("CONFIG_PATH") {
            Ok(path) => Self::from_file(path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)?
            }
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var("DATABASE_URL") {
            self.postgres.url = Some(url);
        }
        if let Some(bind) = var("BIND_ADDR") {
            self.server.bind = bind;
        }
        if let Some(url) = var("LOKI_URL") {
            self.loki = Some(Loki { url });
        }
        if let Some(user) = var("ADMIN_USER") {
            self.admin.admin_user = user;
        }
        if let Some(pass) = var("ADMIN_PASS") {
            self.admin.admin_pass = pass;
        }
        if let Some(secret) = var("ADMIN_SECRET") {
            self.admin.session_secret = secret;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_when_yaml_empty() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8000");
        assert_eq!(config.admin.admin_user, "admin");
        assert!(config.admin.uses_insecure_defaults());
        assert!(config.loki.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config = Config::from_yaml(
            "postgres:\n  host: db\n  db_name: listings\nadmin:\n  admin_pass: hunter2\n  session_secret: s3cret\n",
        )
        .unwrap();
        assert_eq!(
            config.postgres.database_url(),
            "postgres://postgres:postgres@db:5432/listings"
        );
        assert_eq!(config.admin.admin_user, "admin");
        assert!(!config.admin.uses_insecure_defaults());
    }

    #[test]
    fn test_env_overrides_win() {
        let env = HashMap::from([
            ("DATABASE_URL", "postgres://u:p@h/d"),
            ("ADMIN_USER", "root"),
            ("ADMIN_SECRET", "xyz"),
        ]);
        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.postgres.database_url(), "postgres://u:p@h/d");
        assert_eq!(config.admin.admin_user, "root");
        assert_eq!(config.admin.session_secret, "xyz");
        assert_eq!(config.admin.admin_pass, "admin");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  bind: 127.0.0.1:9000\nloki:\n  url: http://loki:3100").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.loki.unwrap().url, "http://loki:3100");
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = Config::from_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_debug_masks_secrets() {
        let rendered = format!("{:?}", Config::default());
        assert!(!rendered.contains("dev-secret-change-me"));
        assert!(rendered.contains("***"));
    }
}
