use crate::{Context, Error, Result, programming_error, truncate_long};
use std::str::FromStr;
use url::Url;

/// Database name that keeps the default reported by the server.
pub const DEFAULT_DATABASE: &str = "__default__";
pub const DEFAULT_QUERY_LIMIT: u64 = 5000;

/// Connection scoped configuration of a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Database used for unqualified tables, [`DEFAULT_DATABASE`] (or empty) keeps the server one.
    pub database: String,
    /// Appended as `LIMIT` to eligible queries, 0 disables it.
    pub query_limit: u64,
    /// Locator of the server, kept verbatim.
    pub uri: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.into(),
            query_limit: DEFAULT_QUERY_LIMIT,
            uri: String::new(),
        }
    }
}

impl ClientConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_query_limit(mut self, query_limit: u64) -> Self {
        self.query_limit = query_limit;
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    /// Read the configuration from `scheme://[user[:password]@]host[:port][/database][?query_limit=N]`.
    ///
    /// Unknown query keys are left for the backend.
    pub fn from_url(url: &str) -> Result<Self> {
        let context = || format!("While decoding the connection url `{}`", truncate_long!(url));
        let parsed = Url::parse(url).with_context(context)?;
        let mut config = Self::new(url);
        let path = parsed.path().trim_matches('/');
        if !path.is_empty() {
            config.database = urlencoding::decode(path)
                .with_context(context)?
                .into_owned();
        }
        if let Some((_, limit)) = parsed.query_pairs().find(|(k, _)| k == "query_limit") {
            config.query_limit = limit.parse().map_err(|_| {
                programming_error(format!(
                    "Invalid query_limit `{}` in the connection url, expected a non negative integer",
                    limit
                ))
            })?;
        }
        Ok(config)
    }
}

impl FromStr for ClientConfig {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::from_url(s)
    }
}
