use std::time::Duration;

use envconfig::Envconfig;
use facematch_common::store::PgConfig;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "BIND_HOST", default = "0.0.0.0")]
    pub host: String,

    #[envconfig(from = "PORT", default = "5000")]
    pub port: u16,

    #[envconfig(from = "DB_HOST", default = "localhost")]
    pub db_host: String,

    #[envconfig(from = "DB_PORT", default = "5432")]
    pub db_port: u16,

    #[envconfig(from = "DB_USER", default = "postgres")]
    pub db_user: String,

    #[envconfig(from = "DB_PASS", default = "")]
    pub db_pass: String,

    #[envconfig(from = "DB_NAME", default = "facematch")]
    pub db_name: String,

    #[envconfig(default = "10")]
    pub max_pg_connections: u32,

    #[envconfig(default = "10")]
    pub pg_acquire_timeout_secs: u64,

    // Embeddings are a few hundred floats, but clients tend to send them pretty-printed.
    #[envconfig(default = "5000000")]
    pub max_body_size: usize,

    #[envconfig(default = "false")]
    pub run_migrations: bool,

    #[envconfig(default = "true")]
    pub enable_metrics: bool,
}

impl Config {
    pub fn bind(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn pg_config(&self) -> PgConfig {
        PgConfig {
            host: self.db_host.clone(),
            port: self.db_port,
            user: self.db_user.clone(),
            password: self.db_pass.clone(),
            database: self.db_name.clone(),
            max_connections: self.max_pg_connections,
            acquire_timeout: Duration::from_secs(self.pg_acquire_timeout_secs),
        }
    }
}
