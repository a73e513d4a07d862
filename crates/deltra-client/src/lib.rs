//! HTTP client library for the Deltra covered-call API.
//!
//! This crate provides a typed HTTP client for the Deltra backend: sign-in,
//! portfolios, stock holdings and covered calls.
//!
//! # Example
//!
//! ```no_run
//! use deltra_client::{ClientConfig, DeltraClient, SyncUserRequest};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), deltra_client::Error> {
//!     let client = DeltraClient::new(ClientConfig {
//!         base_url: "http://localhost:8080".into(),
//!         timeout: Duration::from_secs(30),
//!     })?;
//!
//!     let auth = client
//!         .sync_user(&SyncUserRequest {
//!             id: "user-1".into(),
//!             email: "ada@example.com".into(),
//!             name: "Ada".into(),
//!         })
//!         .await?;
//!     let client = client.with_session(auth.token, auth.user.id);
//!
//!     for stock in client.list_stocks().await? {
//!         println!("{}: adjusted basis {}", stock.stock.symbol, stock.metrics.adjusted_basis);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::{ClientConfig, DeltraClient};
pub use error::Error;
pub use types::*;
