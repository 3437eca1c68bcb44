//! FTP bridge: one short-lived, authenticated control connection that
//! serves exactly one gateway operation and is always closed afterwards.

use std::io::{Read, Write};

use super::control::{ControlConnection, Connector};
use super::credentials::Credentials;
use super::listing::RawListing;
use super::path::RemotePath;
use super::status;
use super::types::{BackendError, ItemKind, Result};

/// Outcome of asking for a structured listing.
#[derive(Debug)]
pub enum StructuredListing {
    Listed(RawListing),
    /// The server does not implement `MLSD`; use the legacy listing.
    Unsupported,
}

/// An open, logged-in control connection. Dropping the bridge sends `QUIT`
/// and closes the socket, whichever way the operation ended.
pub struct Bridge<C: ControlConnection> {
    conn: C,
    user: String,
    released: bool,
}

impl<C: ControlConnection> Bridge<C> {
    /// Connect and log in. On failure the half-open connection is released
    /// before the error is returned.
    pub fn open<K>(connector: &K, credentials: &Credentials) -> Result<Bridge<C>>
    where
        K: Connector<Connection = C>,
    {
        debug!("connecting to FTP backend as {}", credentials.user);
        let conn = connector.connect().map_err(status::classify)?;
        let mut bridge = Bridge {
            conn,
            user: credentials.user.clone(),
            released: false,
        };
        debug!("USER {}", credentials.user);
        bridge
            .conn
            .login(&credentials.user, &credentials.password)
            .map_err(status::classify_login)?;
        Ok(bridge)
    }

    /// `MLSD`, reporting an unsupported command as such instead of failing.
    pub fn try_structured(&mut self, path: &RemotePath) -> ::std::result::Result<StructuredListing, BackendError> {
        debug!("MLSD {}", path);
        match self.conn.mlsd(list_arg(path)) {
            Ok(lines) => Ok(StructuredListing::Listed(RawListing::from_mlsd_lines(&lines))),
            Err(ref err) if status::is_unsupported(err) => Ok(StructuredListing::Unsupported),
            Err(err) => Err(err),
        }
    }

    /// Directory listing: structured facts when the server has them,
    /// legacy lines otherwise.
    pub fn list(&mut self, path: &RemotePath) -> Result<RawListing> {
        match self.try_structured(path).map_err(status::classify)? {
            StructuredListing::Listed(raw) => Ok(raw),
            StructuredListing::Unsupported => {
                debug!("MLSD unsupported, LIST {}", path);
                self.conn
                    .list(list_arg(path))
                    .map(RawListing::Lines)
                    .map_err(status::classify)
            }
        }
    }

    /// `DELE` for files, `RMD` for directories.
    pub fn delete(&mut self, path: &RemotePath, kind: ItemKind) -> Result<()> {
        let result = match kind {
            ItemKind::File => {
                debug!("DELE {}", path);
                self.conn.rm(path.as_str())
            }
            ItemKind::Dir => {
                debug!("RMD {}", path);
                self.conn.rmdir(path.as_str())
            }
        };
        result.map_err(status::classify)
    }

    /// `STOR name` inside `dir`.
    pub fn store(&mut self, dir: &RemotePath, name: &str, reader: &mut dyn Read) -> Result<u64> {
        self.enter(dir)?;
        debug!("STOR {}", name);
        self.conn.put(name, reader).map_err(status::classify)
    }

    /// `RETR path` into `writer`.
    pub fn retrieve(&mut self, path: &RemotePath, writer: &mut dyn Write) -> Result<u64> {
        debug!("RETR {}", path);
        self.conn.retr(path.as_str(), writer).map_err(status::classify)
    }

    /// `MKD name` inside `dir`.
    pub fn make_dir(&mut self, dir: &RemotePath, name: &str) -> Result<()> {
        self.enter(dir)?;
        debug!("MKD {}", name);
        self.conn.mkdir(name).map_err(status::classify)
    }

    fn enter(&mut self, dir: &RemotePath) -> Result<()> {
        if dir.is_root() {
            return Ok(());
        }
        debug!("CWD {}", dir);
        self.conn.cwd(dir.as_str()).map_err(status::classify)
    }

    /// Log out and close now rather than at the end of scope.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        debug!("QUIT");
        if let Err(err) = self.conn.quit() {
            warn!("FTP logout for {} did not complete cleanly: {}", self.user, err);
        }
    }
}

impl<C: ControlConnection> Drop for Bridge<C> {
    fn drop(&mut self) {
        self.release();
    }
}

fn list_arg(path: &RemotePath) -> Option<&str> {
    if path.is_root() {
        None
    } else {
        Some(path.as_str())
    }
}
