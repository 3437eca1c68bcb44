#![crate_name = "ftp_gateway"]
#![crate_type = "lib"]

//! ftp_gateway lets stateless web requests drive a stateful FTP server.
//!
//! Each gateway operation opens its own control connection, logs in with
//! the credentials that belong to the caller's identity, issues exactly one
//! FTP operation and closes the connection again. Directory listings come
//! back as one normalized entry model whether the server speaks `MLSD` or
//! only the legacy `LIST`.
//!
//! ### Usage
//!
//! ```rust,no_run
//! use ftp_gateway::{Config, Gateway, Identity};
//!
//! let gateway = Gateway::from_config(&Config::default());
//! let view = gateway.list(&Identity::Anonymous, ".").unwrap();
//! for entry in &view.entries {
//!     println!("{} {}", entry.name, entry.human_size);
//! }
//!
//! let admin = gateway.login("ezaz", "password123").unwrap();
//! let created = gateway.mkdir(&admin, ".", "reports").unwrap();
//! println!("{}", created);
//! ```
//!

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

mod bridge;
pub mod config;
pub mod control;
pub mod credentials;
mod gateway;
pub mod listing;
pub mod path;
pub mod staging;
pub mod status;
pub mod types;

pub use self::bridge::{Bridge, StructuredListing};
pub use self::config::{Config, ConfigError};
pub use self::credentials::{CredentialAdapter, Credentials, Identity};
pub use self::gateway::{Created, Deleted, DirectoryView, Gateway, Uploaded};
pub use self::path::{Breadcrumb, RemotePath};
pub use self::staging::StagedFile;
pub use self::types::{BackendError, Entry, EntryKind, GatewayError, ItemKind, Result};
