use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub identity: IdentitySettings,
    pub server: ServerSettings,
    pub logging: LogSettings,
}

/// Connection and pool parameters for PostgreSQL.
#[derive(Clone, Deserialize)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
    /// How long an idle connection is kept before being closed.
    pub idle_timeout_ms: u64,
    /// How long to wait for a free connection before giving up.
    pub connection_timeout_ms: u64,
}

impl DatabaseSettings {
    /// Builds the `postgres://` URL understood by `sqlx`.
    pub fn connection_url(&self) -> String {
        if self.password.is_empty() {
            format!(
                "postgres://{}@{}:{}/{}",
                self.user, self.host, self.port, self.name
            )
        } else {
            format!(
                "postgres://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.name
            )
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }
}

// The password never reaches the logs.
impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("max_connections", &self.max_connections)
            .field("idle_timeout_ms", &self.idle_timeout_ms)
            .field("connection_timeout_ms", &self.connection_timeout_ms)
            .finish_non_exhaustive()
    }
}

/// The hosted user pool that performs sign-up and sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentitySettings {
    pub user_pool_id: String,
    pub client_id: String,
    pub region: Option<String>,
}

impl IdentitySettings {
    /// The AWS region of the pool. Falls back to the prefix of the pool id
    /// (`us-east-1_AbC123` lives in `us-east-1`).
    pub fn region(&self) -> Option<String> {
        self.region
            .clone()
            .filter(|r| !r.is_empty())
            .or_else(|| {
                self.user_pool_id
                    .split_once('_')
                    .map(|(region, _)| region.to_string())
                    .filter(|r| !r.is_empty())
            })
    }

    pub fn is_configured(&self) -> bool {
        !self.user_pool_id.is_empty() && !self.client_id.is_empty() && self.region().is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: IpAddr,
    pub port: u16,
    /// Directory holding the built browser client, served for unmatched routes.
    pub static_dir: Option<PathBuf>,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// Where the daily rolling log files are written.
    pub directory: PathBuf,
    /// Default filter directive, used when `RUST_LOG` is not set.
    pub filter: String,
}
