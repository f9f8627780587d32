//! CLI argument definitions for MongoDB endpoints.

use clap::Args;
use std::time::Duration;

use crate::connect::{ConnectOptions, Credentials, DEFAULT_AUTH_DB};

/// Connection settings applied to every endpoint.
#[derive(Args, Clone, Debug)]
pub struct MongoConnectArgs {
    /// Username, used for every endpoint
    #[arg(long, short = 'u', env = "MONGODB_USERNAME")]
    pub username: Option<String>,

    /// Password, used for every endpoint
    #[arg(long, short = 'p', env = "MONGODB_PASSWORD", requires = "username")]
    pub password: Option<String>,

    /// Database the user is defined in
    #[arg(long, env = "MONGODB_AUTH_DB", default_value = DEFAULT_AUTH_DB)]
    pub auth_db: String,

    /// Connect timeout in seconds
    #[arg(long, default_value = "10")]
    pub connect_timeout_secs: u64,

    /// Server selection timeout in seconds
    #[arg(long, default_value = "10")]
    pub server_selection_timeout_secs: u64,

    /// Cursor batch size (server default when omitted)
    #[arg(long)]
    pub batch_size: Option<u32>,

    /// Discover the replica set of bare host:port endpoints instead of
    /// connecting to that member directly
    #[arg(long)]
    pub discover: bool,
}

impl MongoConnectArgs {
    pub fn to_connect_options(&self) -> ConnectOptions {
        let credentials = self.username.as_ref().map(|username| {
            Credentials::new(username.clone(), self.password.clone().unwrap_or_default())
                .with_auth_db(self.auth_db.clone())
        });
        ConnectOptions {
            credentials,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            server_selection_timeout: Duration::from_secs(self.server_selection_timeout_secs),
            direct_connection: !self.discover,
            batch_size: self.batch_size,
        }
    }
}
