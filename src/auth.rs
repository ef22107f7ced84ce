use std::sync::Mutex;

use reqwest::blocking::Client as HttpClient;

use crate::error::{Error, Result};

pub(crate) const DEFAULT_TOKEN_URL: &str = "https://portail-api.meteofrance.fr/token";

/// Header attached to an outgoing request. The two forms are exclusive:
/// either the static `apikey` header or a `Bearer` authorization, never both.
#[derive(Debug, Clone)]
pub(crate) enum AuthHeader {
    ApiKey(String),
    Bearer(String),
}

/// Holds the active credential: a static API key, or a short-lived bearer
/// token minted from an application id.
///
/// The token's expiry is not tracked; it is discovered by a 401, at which
/// point [`renew`](Self::renew) exchanges the application id for a fresh
/// token. The state sits behind a mutex with a generation counter so that
/// concurrent polling tasks hitting an expired token collapse into a single
/// renewal: the lock holder renews, the rest observe a newer generation and
/// reuse its token.
#[derive(Debug)]
pub(crate) struct CredentialManager {
    application_id: Option<String>,
    token_url: String,
    state: Mutex<AuthState>,
}

#[derive(Debug)]
struct AuthState {
    credential: Credential,
    generation: u64,
}

#[derive(Debug)]
enum Credential {
    ApiKey(String),
    Bearer(String),
    /// Application-id mode before the first mint.
    Unset,
}

#[derive(Debug, serde::Deserialize)]
struct TokenReply {
    #[serde(default)]
    access_token: Option<String>,
}

impl CredentialManager {
    pub(crate) fn new(
        api_key: Option<String>,
        application_id: Option<String>,
        token_url: String,
    ) -> Result<Self> {
        let credential = match &api_key {
            Some(key) => Credential::ApiKey(key.clone()),
            None if application_id.is_some() => Credential::Unset,
            None => {
                return Err(Error::Config(
                    "either an API key or an application id must be provided".to_string(),
                ));
            }
        };

        Ok(Self {
            application_id,
            token_url,
            state: Mutex::new(AuthState {
                credential,
                generation: 0,
            }),
        })
    }

    pub(crate) fn can_renew(&self) -> bool {
        self.application_id.is_some()
    }

    pub(crate) fn set_token_url(&mut self, url: String) {
        self.token_url = url;
    }

    /// Current header plus the generation it was observed at. `None` until
    /// the first token is minted in application-id mode.
    pub(crate) fn snapshot(&self) -> (Option<AuthHeader>, u64) {
        let state = self.state.lock().unwrap();
        let header = match &state.credential {
            Credential::ApiKey(key) => Some(AuthHeader::ApiKey(key.clone())),
            Credential::Bearer(token) => Some(AuthHeader::Bearer(token.clone())),
            Credential::Unset => None,
        };
        (header, state.generation)
    }

    /// Mint the first token if none is active yet.
    pub(crate) fn ensure_token(&self, http: &HttpClient) -> Result<()> {
        let (header, generation) = self.snapshot();
        if header.is_none() {
            self.renew(http, generation)?;
        }
        Ok(())
    }

    /// Exchange the application id for a fresh bearer token and make it the
    /// active credential, replacing the previous one.
    ///
    /// `seen_generation` is the generation the caller last observed. If the
    /// state has already moved past it, another task renewed first and the
    /// exchange is skipped. Holding the lock across the exchange collapses
    /// concurrent renewals into one token request.
    pub(crate) fn renew(&self, http: &HttpClient, seen_generation: u64) -> Result<()> {
        let Some(application_id) = &self.application_id else {
            return Err(Error::RenewalUnavailable {
                body: String::new(),
            });
        };

        let mut state = self.state.lock().unwrap();
        if state.generation != seen_generation {
            return Ok(());
        }

        let resp = http
            .post(&self.token_url)
            .header("Authorization", format!("Basic {application_id}"))
            .form(&[("grant_type", "client_credentials")])
            .send()?;

        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        if !status.is_success() {
            return Err(Error::TokenExchange {
                url: self.token_url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let reply: TokenReply =
            serde_json::from_str(&body).map_err(|_| Error::MalformedToken { body: body.clone() })?;
        let token = match reply.access_token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(Error::MalformedToken { body }),
        };

        state.credential = Credential::Bearer(token);
        state.generation += 1;
        Ok(())
    }
}
