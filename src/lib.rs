//! A small Rust client for the Météo-France public climatology (DPClim) API.
//!
//! This crate implements the portal's order-then-poll flow:
//! submit a production order for a station and year range, poll until the
//! artifact is ready, then download it. Station lookup and a lightweight
//! dataset combiner round out the flow.
//!
//! ## Quick start
//! - Configure authentication via environment variables (`METEOFRANCE_URL`
//!   plus `METEOFRANCE_KEY` or `METEOFRANCE_APPLICATION_ID`) or a
//!   `.meteofrancerc` file (supported in the current directory and in your
//!   home directory).
//! - Call [`Client::retrieve_hourly`] with a station id and a year range.
//!
//! ```no_run
//! use dpclim::{Client, Result};
//!
//! fn main() -> Result<()> {
//!     let client = Client::from_env()?;
//!     for station in client.list_stations("59")? {
//!         eprintln!("{} : {}", station.id, station.name);
//!     }
//!     let path = client.retrieve_hourly("59343001", 2020, 2021, None)?;
//!     eprintln!("saved {}", path.display());
//!     Ok(())
//! }
//! ```
//!
//! Polling an order can take a while; a [`CancelToken`] handed to
//! [`Client::with_cancel`] aborts a loop between two attempts, and a client
//! behind an `Arc` can poll several orders from separate threads.

#![forbid(unsafe_code)]

mod auth;
mod client;
mod config;
mod control;
mod dataset;
mod error;
mod order;
mod poll;
mod station;
mod util;

pub use client::{Client, ClientConfig};
pub use control::CancelToken;
pub use dataset::{DEFAULT_HOURLY_PARAMETERS, Dataset};
pub use error::{Error, Result};
pub use order::OrderId;
pub use station::{Station, StationSummary};
