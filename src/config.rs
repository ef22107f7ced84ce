use std::path::{Path, PathBuf};

use crate::client::ClientConfig;
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct RcConfig {
    url: Option<String>,
    key: Option<String>,
    application_id: Option<String>,
    verify: Option<bool>,
}

pub(crate) fn load_config(
    url: Option<String>,
    api_key: Option<String>,
    application_id: Option<String>,
    verify: Option<bool>,
) -> Result<ClientConfig> {
    let mut url = url.or_else(|| std::env::var("METEOFRANCE_URL").ok());
    let mut api_key = api_key.or_else(|| std::env::var("METEOFRANCE_KEY").ok());
    let mut application_id =
        application_id.or_else(|| std::env::var("METEOFRANCE_APPLICATION_ID").ok());

    let rc_candidates = rc_candidates();
    let mut file_verify: Option<bool> = None;

    if url.is_none() || (api_key.is_none() && application_id.is_none()) || verify.is_none() {
        for rc_path in &rc_candidates {
            if rc_path.exists() {
                let cfg = read_rc(rc_path).map_err(|e| {
                    Error::Config(format!(
                        "failed to read configuration file {}: {}",
                        rc_path.display(),
                        e
                    ))
                })?;

                if url.is_none() {
                    url = cfg.url;
                }
                if api_key.is_none() && application_id.is_none() {
                    api_key = cfg.key;
                    application_id = cfg.application_id;
                }
                file_verify = cfg.verify;
                break;
            }
        }
    }

    let url = url.ok_or_else(|| {
        missing(
            "url",
            "set METEOFRANCE_URL or put `url:` in",
            &rc_candidates,
        )
    })?;

    if api_key.is_none() && application_id.is_none() {
        return Err(missing(
            "credentials",
            "set METEOFRANCE_KEY or METEOFRANCE_APPLICATION_ID, or put `key:` or `application_id:` in",
            &rc_candidates,
        ));
    }

    let verify = verify.or(file_verify).unwrap_or(true);

    Ok(ClientConfig {
        url,
        api_key,
        application_id,
        verify,
    })
}

fn missing(what: &str, hint: &str, candidates: &[PathBuf]) -> Error {
    if candidates.is_empty() {
        return Error::Config(format!("missing configuration: {what} ({hint} .meteofrancerc)"));
    }
    Error::Config(format!(
        "missing configuration: {what} ({hint} one of: {})",
        candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    ))
}

fn read_rc(path: &Path) -> std::io::Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    let mut cfg = RcConfig::default();

    // Support formatting where `key:` is on one line and the value is on the
    // next line.
    let mut pending_key: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key {
            // Continuation value line (no colon)
            if !line.contains(':') {
                let v = strip_quotes(line);
                match pk {
                    "url" => cfg.url = Some(v.to_string()),
                    "key" => cfg.key = Some(v.to_string()),
                    "application_id" => cfg.application_id = Some(v.to_string()),
                    _ => {}
                }
                pending_key = None;
                continue;
            }
            pending_key = None;
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            match k {
                "url" => {
                    if !v.is_empty() {
                        cfg.url = Some(v.to_string());
                    } else {
                        pending_key = Some("url");
                    }
                }
                "key" => {
                    if !v.is_empty() {
                        cfg.key = Some(v.to_string());
                    } else {
                        pending_key = Some("key");
                    }
                }
                "application_id" => {
                    if !v.is_empty() {
                        cfg.application_id = Some(v.to_string());
                    } else {
                        pending_key = Some("application_id");
                    }
                }
                "verify" => {
                    if !v.is_empty() {
                        cfg.verify = Some(v != "0");
                    }
                }
                _ => {}
            }
        }
    }

    Ok(cfg)
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // Search order:
    // 1) METEOFRANCE_RC (explicit)
    // 2) ./.meteofrancerc (current working directory)
    // 3) ~/.meteofrancerc
    if let Ok(p) = std::env::var("METEOFRANCE_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".meteofrancerc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".meteofrancerc"));
    }
    v
}
