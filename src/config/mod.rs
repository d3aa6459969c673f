use crate::core::shared::utils::parse_database_url;
use crate::goals::hierarchy::DEFAULT_MAX_DEPTH;
use log::warn;

#[derive(Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub max_hierarchy_depth: usize,
}
#[derive(Clone)]
pub struct DatabaseConfig {
    pub username: String,
    pub password: String,
    pub server: String,
    pub port: u32,
    pub database: String,
}
#[derive(Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
}
impl AppConfig {
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.database.username,
            self.database.password,
            self.database.server,
            self.database.port,
            self.database.database
        )
    }
}
impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get_str = |key: &str, default: &str| -> String {
            lookup(key).unwrap_or_else(|| default.to_string())
        };
        let get_parsed = |key: &str, default: u64| -> u64 {
            match lookup(key) {
                Some(v) => v.trim().parse().unwrap_or_else(|_| {
                    warn!("Ignoring malformed {key}={v}, using {default}");
                    default
                }),
                None => default,
            }
        };

        let database = match lookup("DATABASE_URL") {
            Some(url) => {
                let (username, password, server, port, database) = parse_database_url(&url);
                DatabaseConfig {
                    username,
                    password,
                    server,
                    port,
                    database,
                }
            }
            None => DatabaseConfig {
                username: get_str("TABLES_USERNAME", "okruser"),
                password: get_str("TABLES_PASSWORD", ""),
                server: get_str("TABLES_SERVER", "localhost"),
                port: u32::try_from(get_parsed("TABLES_PORT", 5432)).unwrap_or(5432),
                database: get_str("TABLES_DATABASE", "okrserver"),
            },
        };

        let server = ServerConfig {
            host: get_str("SERVER_HOST", "0.0.0.0"),
            port: u16::try_from(get_parsed("SERVER_PORT", 8080)).unwrap_or(8080),
        };

        let auth = AuthConfig {
            jwt_secret: lookup("JWT_SECRET").filter(|s| !s.is_empty()),
        };

        let max_hierarchy_depth = usize::try_from(get_parsed(
            "OKR_MAX_HIERARCHY_DEPTH",
            DEFAULT_MAX_DEPTH as u64,
        ))
        .unwrap_or(DEFAULT_MAX_DEPTH)
        .max(1);

        AppConfig {
            server,
            database,
            auth,
            max_hierarchy_depth,
        }
    }
}
