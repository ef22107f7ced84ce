use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::{AuthHeader, CredentialManager, DEFAULT_TOKEN_URL};
use crate::config::load_config;
use crate::control::CancelToken;
use crate::error::{Error, Result};
use crate::order::{OrderAcceptance, OrderId};
use crate::poll::{PollPolicy, PollState, PollStep, TerminalKind, WaitReason};
use crate::station::{RawStation, Station, StationSummary};
use crate::util::{artifact_filename, encode_timestamp, period_end, period_start};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base DPClim API URL, typically
    /// `https://public-api.meteofrance.fr/public/DPClim/v1`.
    pub url: String,
    /// Static API key, sent as the `apikey` header.
    pub api_key: Option<String>,
    /// Application id exchanged for short-lived bearer tokens. At least one
    /// of `api_key` / `application_id` must be set.
    pub application_id: Option<String>,
    /// Whether to verify TLS certificates.
    pub verify: bool,
}

/// Client for the order-then-poll flow: look up stations, submit an order
/// for a station and year range, poll until the artifact is ready, download.
///
/// Methods take `&self`; wrap the client in an `Arc` to poll several orders
/// from separate threads. Each poll loop keeps its own retry state and the
/// shared credential renews at most once per expiry across all of them.
#[derive(Debug)]
pub struct Client {
    url: String,
    auth: CredentialManager,

    policy: PollPolicy,
    cancel: CancelToken,
    progress: bool,

    http: HttpClient,
}

impl Client {
    /// Creates a client using environment variables and/or `.meteofrancerc`.
    ///
    /// This is equivalent to `Client::new(None, None, None, None)`.
    pub fn from_env() -> Result<Self> {
        Self::new(None, None, None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit arguments
    /// - environment variables `METEOFRANCE_URL` / `METEOFRANCE_KEY` /
    ///   `METEOFRANCE_APPLICATION_ID`
    /// - config file from `METEOFRANCE_RC` or `.meteofrancerc`
    pub fn new(
        url: Option<String>,
        api_key: Option<String>,
        application_id: Option<String>,
        verify: Option<bool>,
    ) -> Result<Self> {
        let cfg = load_config(url, api_key, application_id, verify)?;
        Self::from_config(cfg)
    }

    /// Creates a client from an already-resolved configuration.
    pub fn from_config(cfg: ClientConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("dpclim-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("dpclim-rs")),
        );

        let mut builder = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(60));

        if !cfg.verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build()?;
        let auth =
            CredentialManager::new(cfg.api_key, cfg.application_id, DEFAULT_TOKEN_URL.to_string())?;

        Ok(Self {
            url: cfg.url,
            auth,
            policy: PollPolicy::default(),
            cancel: CancelToken::new(),
            progress: true,
            http,
        })
    }

    /// Bound on transient production failures (HTTP 500) per order.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.policy.max_attempts = max_attempts.max(1);
        self
    }

    /// Wait between polls while an order is still processing (HTTP 204).
    pub fn with_pending_wait(mut self, wait: Duration) -> Self {
        self.policy.pending_wait = wait;
        self
    }

    /// Wait before re-polling after a transient production failure.
    pub fn with_retry_wait(mut self, wait: Duration) -> Self {
        self.policy.retry_wait = wait;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Token to abort in-progress poll loops between two attempts.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Override the token-issuance endpoint.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.auth.set_token_url(url.into());
        self
    }

    /// Stations available in a department, as `(id, name)` summaries.
    pub fn list_stations(&self, department: &str) -> Result<Vec<StationSummary>> {
        let url = format!(
            "{}/liste-stations/horaire?id-departement={}",
            self.base(),
            department
        );
        let resp = self.request("GET", &url)?;
        let status = resp.status().as_u16();
        let body = resp.text().unwrap_or_default();
        if status != 200 {
            return Err(Error::Rejected { url, status, body });
        }
        serde_json::from_str(&body).map_err(|source| Error::MalformedReply { url, source })
    }

    /// Descriptive metadata for one station.
    pub fn station_info(&self, station_id: &str) -> Result<Station> {
        let url = format!(
            "{}/information-station?id-station={}",
            self.base(),
            station_id
        );
        let resp = self.request("GET", &url)?;
        let status = resp.status().as_u16();
        let body = resp.text().unwrap_or_default();
        if status != 200 {
            return Err(Error::Rejected { url, status, body });
        }
        let records: Vec<RawStation> =
            serde_json::from_str(&body).map_err(|source| Error::MalformedReply {
                url: url.clone(),
                source,
            })?;
        records
            .into_iter()
            .next()
            .map(Station::from)
            .ok_or(Error::EmptyReply { url })
    }

    /// Submits an asynchronous production order for hourly data covering
    /// Jan 1 of `start_year` through Dec 31 of `end_year`, UTC.
    ///
    /// A 202 acceptance yields the order id; any other status is a rejection
    /// and a fresh submission is the caller's move. Submissions are never
    /// retried here.
    pub fn submit_order(
        &self,
        station_id: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<OrderId> {
        let url = format!(
            "{}/commande-station/horaire?id-station={}&date-deb-periode={}&date-fin-periode={}",
            self.base(),
            station_id,
            encode_timestamp(&period_start(start_year)),
            encode_timestamp(&period_end(end_year)),
        );
        let resp = self.request("GET", &url)?;
        let status = resp.status().as_u16();
        let body = resp.text().unwrap_or_default();
        if status != 202 {
            return Err(Error::Rejected { url, status, body });
        }

        let acceptance: OrderAcceptance = serde_json::from_str(&body)
            .map_err(|_| Error::MalformedAcceptance { body: body.clone() })?;
        acceptance
            .into_order_id()
            .ok_or(Error::MalformedAcceptance { body })
    }

    /// Polls the order until a terminal outcome and, once ready, writes the
    /// artifact to `command_<order id>_RAW_DATA.csv` under `target_dir`
    /// (current directory when `None`). Returns the written path.
    ///
    /// "Still processing" (204) polls indefinitely, interruptible via the
    /// [`CancelToken`] installed with [`with_cancel`](Self::with_cancel);
    /// transient production failures (500) are bounded by
    /// [`with_max_attempts`](Self::with_max_attempts). 404, 410, 507 and any
    /// undocumented status end the loop immediately.
    pub fn download_order(&self, order: &OrderId, target_dir: Option<&Path>) -> Result<PathBuf> {
        let url = format!("{}/commande/fichier?id-cmde={}", self.base(), order);
        let target_dir = target_dir.unwrap_or(Path::new("."));

        let spinner = if self.progress {
            let pb = ProgressBar::new_spinner();
            pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}").unwrap());
            pb.enable_steady_tick(Duration::from_millis(120));
            pb.set_message(format!("order {order}: polling"));
            Some(pb)
        } else {
            None
        };

        let mut state = PollState::default();
        let mut last_report: Option<String> = None;

        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let resp = self.request("GET", &url)?;
            let status = resp.status().as_u16();

            match self.policy.on_status(&mut state, status) {
                PollStep::Deliver => {
                    let bytes = resp.bytes()?;
                    let target = target_dir.join(artifact_filename(order.as_str()));
                    std::fs::write(&target, &bytes).map_err(|e| Error::io(&target, e))?;
                    if let Some(pb) = &spinner {
                        pb.finish_and_clear();
                    }
                    return Ok(target);
                }
                PollStep::Wait { delay, reason } => {
                    let line = match reason {
                        WaitReason::Pending => format!("order {order}: still processing"),
                        WaitReason::TransientFailure { attempt } => format!(
                            "order {order}: production failure, retry {attempt}/{}",
                            self.policy.max_attempts
                        ),
                    };
                    if last_report.as_deref() != Some(line.as_str()) {
                        match &spinner {
                            Some(pb) => pb.set_message(line.clone()),
                            None => eprintln!("{line}"),
                        }
                        last_report = Some(line);
                    }
                    if self.cancel.wait(delay) {
                        return Err(Error::Cancelled);
                    }
                }
                PollStep::GiveUp { attempts } => {
                    if let Some(pb) = &spinner {
                        pb.finish_and_clear();
                    }
                    return Err(Error::RetriesExhausted {
                        order: order.to_string(),
                        attempts,
                    });
                }
                PollStep::Terminal(kind) => {
                    if let Some(pb) = &spinner {
                        pb.finish_and_clear();
                    }
                    let body = resp.text().unwrap_or_default();
                    let order = order.to_string();
                    return Err(match kind {
                        TerminalKind::NotFound => Error::OrderNotFound { order, body },
                        TerminalKind::AlreadyDelivered => Error::AlreadyDelivered { order, body },
                        TerminalKind::ProductionRejected => {
                            Error::ProductionRejected { order, body }
                        }
                        TerminalKind::Unexpected => Error::UnexpectedStatus {
                            order,
                            status,
                            body,
                        },
                    });
                }
            }
        }
    }

    /// Submits an order and polls it to completion.
    ///
    /// Equivalent to [`submit_order`](Self::submit_order) followed by
    /// [`download_order`](Self::download_order).
    pub fn retrieve_hourly(
        &self,
        station_id: &str,
        start_year: i32,
        end_year: i32,
        target_dir: Option<&Path>,
    ) -> Result<PathBuf> {
        let order = self.submit_order(station_id, start_year, end_year)?;
        self.download_order(&order, target_dir)
    }

    fn base(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Performs one authenticated call, renewing the bearer token at most
    /// once on a 401. A 401 with no application id configured, or a second
    /// 401 after renewal, is fatal to the call.
    fn request(&self, method: &str, url: &str) -> Result<Response> {
        self.auth.ensure_token(&self.http)?;
        let (header, generation) = self.auth.snapshot();

        let resp = self.send(method, url, header.as_ref())?;
        if resp.status().as_u16() != 401 {
            return Ok(resp);
        }

        if !self.auth.can_renew() {
            let body = resp.text().unwrap_or_default();
            return Err(Error::RenewalUnavailable { body });
        }

        self.auth.renew(&self.http, generation)?;
        let (header, _) = self.auth.snapshot();
        let resp = self.send(method, url, header.as_ref())?;
        if resp.status().as_u16() == 401 {
            let body = resp.text().unwrap_or_default();
            return Err(Error::Authentication { body });
        }
        Ok(resp)
    }

    fn send(&self, method: &str, url: &str, auth: Option<&AuthHeader>) -> Result<Response> {
        let req = match method {
            "POST" => self.http.post(url),
            _ => self.http.get(url),
        };
        let req = match auth {
            Some(AuthHeader::ApiKey(key)) => req.header("apikey", key),
            Some(AuthHeader::Bearer(token)) => {
                req.header("Authorization", format!("Bearer {token}"))
            }
            None => req,
        };
        Ok(req.send()?)
    }
}
