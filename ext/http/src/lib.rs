//! flippy-http: REST transport for the switch backend
//!
//! Connects a [`flippy::SwitchDirectory`] to a running backend:
//!
//! ```text
//! AdminConfig (file / flags)
//!         ↓ base_url()
//! HttpTransport ── GET/POST/DELETE ──▶ {base}switch/…
//!         ↓ impl Transport
//! SwitchDirectory (fetch_page / create / update / delete)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use flippy_http::prelude::*;
//!
//! let transport = HttpTransport::new(&AdminConfig::from_url("http://localhost:5000/"))?;
//! let mut directory = SwitchDirectory::new(Registry::standard());
//! directory.fetch_all(&transport)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod transport;

pub use config::{AdminConfig, ConfigError};
pub use transport::HttpTransport;

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{AdminConfig, ConfigError, HttpTransport};
    pub use flippy::prelude::*;
}
