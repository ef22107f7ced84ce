use std::path::PathBuf;

/// Errors surfaced by the client and the dataset helpers.
///
/// Polling outcomes are deliberately distinct variants: callers need to tell
/// a missing order from an already-delivered one or an exhausted retry
/// budget without string-matching.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection-level failure (DNS, TLS, timeout, ...).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The token endpoint refused the application id.
    #[error("token request failed: HTTP {status} for url ({url})\n{}", excerpt(.body))]
    TokenExchange {
        url: String,
        status: u16,
        body: String,
    },

    /// The token endpoint answered 2xx but without an `access_token` field.
    #[error("token endpoint reply carried no access_token\n{}", excerpt(.body))]
    MalformedToken { body: String },

    /// 401 received and no application id is configured, so the credential
    /// cannot be refreshed. Fix the key in the configuration.
    #[error("authentication failed (HTTP 401) and no application id is configured to renew the token")]
    RenewalUnavailable { body: String },

    /// Still 401 after one token renewal.
    #[error("authentication failed (HTTP 401) even after renewing the token\n{}", excerpt(.body))]
    Authentication { body: String },

    /// A lookup or submission answered with an unexpected status. Not
    /// retried: these failures are not transient by assumption.
    #[error("API request rejected: HTTP {status} for url ({url})\n{}", excerpt(.body))]
    Rejected {
        url: String,
        status: u16,
        body: String,
    },

    /// 202 received but the acceptance envelope did not yield an order id.
    #[error("order accepted but the reply envelope carried no order id\n{}", excerpt(.body))]
    MalformedAcceptance { body: String },

    /// A 200 reply whose payload carried no records.
    #[error("no records in API reply (url={url})")]
    EmptyReply { url: String },

    /// A 200 reply that did not parse into the expected shape.
    #[error("failed to parse API JSON (url={url}): {source}")]
    MalformedReply {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// 404 while polling: the order id does not exist server-side.
    #[error("order {order} not found (HTTP 404)\n{}", excerpt(.body))]
    OrderNotFound { order: String, body: String },

    /// 410 while polling: the artifact was already produced and retrieved.
    #[error("order {order} was already delivered (HTTP 410)\n{}", excerpt(.body))]
    AlreadyDelivered { order: String, body: String },

    /// 507 while polling: the server refused to produce the artifact.
    #[error("order {order} rejected by the production pipeline (HTTP 507)\n{}", excerpt(.body))]
    ProductionRejected { order: String, body: String },

    /// Any poll status outside the documented set.
    #[error("unexpected status HTTP {status} while polling order {order}\n{}", excerpt(.body))]
    UnexpectedStatus {
        order: String,
        status: u16,
        body: String,
    },

    /// The bounded budget for transient (HTTP 500) poll failures ran out.
    #[error("order {order}: gave up after {attempts} transient production failures")]
    RetriesExhausted { order: String, attempts: u32 },

    /// The caller cancelled the poll loop between two attempts.
    #[error("polling cancelled")]
    Cancelled,

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("failed to write {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// First few hundred bytes of a response body, enough to diagnose without
/// dumping a whole payload into the error message.
fn excerpt(body: &str) -> String {
    const MAX: usize = 400;
    let trimmed = body.trim();
    if trimmed.len() <= MAX {
        return trimmed.to_string();
    }
    let mut cut = MAX;
    while !trimmed.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... ({} bytes total)", &trimmed[..cut], trimmed.len())
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
