//! Connecting to MongoDB endpoints.

use std::time::Duration;

use bson::doc;
use id_diff::SourceError;
use mongodb::options::{ClientOptions, Credential, ReadPreference, SelectionCriteria};
use mongodb::{Client, Database};
use tracing::{debug, info};

use crate::cursor::MongoIdSource;
use crate::error::classify;
use crate::namespace::Namespace;

pub const DEFAULT_AUTH_DB: &str = "admin";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Username and password applied to every endpoint of a run.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Database the user is defined in.
    pub auth_db: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            auth_db: DEFAULT_AUTH_DB.to_string(),
        }
    }

    pub fn with_auth_db(mut self, auth_db: impl Into<String>) -> Self {
        self.auth_db = auth_db.into();
        self
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("auth_db", &self.auth_db)
            .finish()
    }
}

/// Client settings shared by every endpoint of a run.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub credentials: Option<Credentials>,
    pub connect_timeout: Duration,
    pub server_selection_timeout: Duration,
    /// Talk to a bare `host:port` endpoint directly instead of discovering
    /// its replica set.
    pub direct_connection: bool,
    /// Cursor batch size; the server default when unset.
    pub batch_size: Option<u32>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            credentials: None,
            connect_timeout: DEFAULT_TIMEOUT,
            server_selection_timeout: DEFAULT_TIMEOUT,
            direct_connection: true,
            batch_size: None,
        }
    }
}

/// A connection string plus whether it was given as a bare `host:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub uri: String,
    pub bare: bool,
}

impl Endpoint {
    /// Accept either a full `mongodb://` / `mongodb+srv://` URI or a bare
    /// `host[:port]`.
    pub fn parse(endpoint: &str) -> Self {
        let endpoint = endpoint.trim();
        if endpoint.starts_with("mongodb://") || endpoint.starts_with("mongodb+srv://") {
            Self {
                uri: endpoint.to_string(),
                bare: false,
            }
        } else {
            Self {
                uri: format!("mongodb://{endpoint}"),
                bare: true,
            }
        }
    }

    /// The URI with any user info removed, for report lines and logs.
    pub fn redacted(&self) -> String {
        let Some((scheme, rest)) = self.uri.split_once("://") else {
            return self.uri.clone();
        };
        let authority_end = rest.find('/').unwrap_or(rest.len());
        match rest[..authority_end].rfind('@') {
            Some(at) => format!("{scheme}://{}", &rest[at + 1..]),
            None => self.uri.clone(),
        }
    }
}

/// A connected and verified MongoDB endpoint.
#[derive(Clone)]
pub struct MongoEndpoint {
    client: Client,
    description: String,
    batch_size: Option<u32>,
}

impl MongoEndpoint {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn database(&self, name: &str) -> Database {
        self.client.database(name)
    }

    /// Identifier source over the `_id` values of one collection.
    pub fn collection(&self, namespace: &Namespace) -> MongoIdSource {
        let collection = self
            .client
            .database(&namespace.database)
            .collection(&namespace.collection);
        MongoIdSource::new(
            collection,
            format!("{}/{}", self.description, namespace),
            self.batch_size,
        )
    }
}

/// Connect to `endpoint` and ping it.
///
/// Reads prefer the primary but fall back to a secondary, so a replica-set
/// member can be compared on its own. Unreachable hosts and rejected
/// credentials fail here, before any cursor is opened.
pub async fn connect(endpoint: &str, options: &ConnectOptions) -> Result<MongoEndpoint, SourceError> {
    let endpoint = Endpoint::parse(endpoint);
    let description = endpoint.redacted();
    debug!("Parsing MongoDB connection options for {}", description);

    let mut client_options = ClientOptions::parse(&endpoint.uri)
        .await
        .map_err(|e| classify(&description, e))?;
    client_options.app_name = Some("compare-ids".to_string());
    client_options.connect_timeout = Some(options.connect_timeout);
    client_options.server_selection_timeout = Some(options.server_selection_timeout);
    client_options.selection_criteria = Some(SelectionCriteria::ReadPreference(
        ReadPreference::PrimaryPreferred {
            options: Default::default(),
        },
    ));
    if endpoint.bare && options.direct_connection {
        client_options.direct_connection = Some(true);
    }

    let ping_db = match &options.credentials {
        Some(credentials) => {
            client_options.credential = Some(
                Credential::builder()
                    .username(credentials.username.clone())
                    .password(credentials.password.clone())
                    .source(credentials.auth_db.clone())
                    .build(),
            );
            credentials.auth_db.clone()
        }
        None => DEFAULT_AUTH_DB.to_string(),
    };

    let client = Client::with_options(client_options).map_err(|e| classify(&description, e))?;
    client
        .database(&ping_db)
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| classify(&description, e))?;
    info!("Connected to {}", description);

    Ok(MongoEndpoint {
        client,
        description,
        batch_size: options.batch_size,
    })
}
