//! Gateway operations: the caller-facing actions. Each one authorizes,
//! opens one bridge, issues a single FTP operation and closes the bridge.

use std::fmt;
use std::io::Read;

use super::bridge::Bridge;
use super::config::Config;
use super::control::{Connector, FtpConnector};
use super::credentials::{CredentialAdapter, Identity};
use super::listing::normalize;
use super::path::{breadcrumbs, parent, Breadcrumb, RemotePath};
use super::staging::{StagedFile, Staging};
use super::types::{Entry, GatewayError, ItemKind, Result};

/// Everything needed to render one directory page. A failed listing still
/// produces a view, with no entries and the failure in `error`.
#[derive(Debug)]
pub struct DirectoryView {
    pub current_path: RemotePath,
    pub entries: Vec<Entry>,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub parent: Option<RemotePath>,
    pub error: Option<GatewayError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deleted {
    pub name: String,
    pub kind: ItemKind,
    /// Directory that held the item, where the caller returns to.
    pub parent: RemotePath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uploaded {
    pub name: String,
    pub dir: RemotePath,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub name: String,
    pub dir: RemotePath,
}

impl fmt::Display for Deleted {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} '{}' deleted successfully.", self.kind, self.name)
    }
}

impl fmt::Display for Uploaded {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "File '{}' uploaded successfully.", self.name)
    }
}

impl fmt::Display for Created {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Directory '{}' created successfully.", self.name)
    }
}

pub struct Gateway<K: Connector = FtpConnector> {
    connector: K,
    credentials: CredentialAdapter,
    staging: Staging,
}

impl Gateway<FtpConnector> {
    pub fn from_config(config: &Config) -> Gateway<FtpConnector> {
        Gateway::new(FtpConnector::new(&config.ftp), config)
    }
}

impl<K: Connector> Gateway<K> {
    pub fn new(connector: K, config: &Config) -> Gateway<K> {
        Gateway {
            connector,
            credentials: CredentialAdapter::new(&config.ftp),
            staging: Staging::new(config.staging.dir.clone()),
        }
    }

    /// Open a bridge for `identity`, run `op` on it and close it again,
    /// whether `op` succeeded or not.
    fn with_bridge<T, F>(&self, identity: &Identity, op: F) -> Result<T>
    where
        F: FnOnce(&mut Bridge<K::Connection>) -> Result<T>,
    {
        let mut bridge = Bridge::open(&self.connector, &self.credentials.resolve(identity))?;
        let result = op(&mut bridge);
        bridge.close();
        result
    }

    fn guard_traversal(&self, identity: &Identity, path: &RemotePath) -> Result<()> {
        if !self.credentials.is_admin(identity) && path.has_traversal() {
            warn!("guest attempted to leave the root via {}", path);
            return Err(GatewayError::PermissionDenied(
                "guests cannot navigate up".to_string(),
            ));
        }
        Ok(())
    }

    fn require_login(&self, identity: &Identity, action: &str) -> Result<()> {
        if !self.credentials.is_admin(identity) {
            return Err(GatewayError::PermissionDenied(format!("please log in to {}", action)));
        }
        Ok(())
    }

    /// List `path`. Only a guest's attempt to walk above the root is an
    /// error; backend failures end up in the view.
    pub fn list(&self, identity: &Identity, path: &str) -> Result<DirectoryView> {
        let path = RemotePath::new(path);
        self.guard_traversal(identity, &path)?;

        let (entries, error) = match self.with_bridge(identity, |bridge| bridge.list(&path)) {
            Ok(raw) => (normalize(raw), None),
            Err(err) => {
                warn!("error listing {}: {}", path, err);
                (Vec::new(), Some(err))
            }
        };

        Ok(DirectoryView {
            breadcrumbs: breadcrumbs(&path),
            parent: parent(&path),
            current_path: path,
            entries,
            error,
        })
    }

    /// Verify the administrator's password against the live server. The
    /// returned identity is the caller's new session state; on any error the
    /// caller's previous identity stays as it was.
    pub fn login(&self, username: &str, password: &str) -> Result<Identity> {
        let candidate = self.credentials.candidate(username, password)?;
        match self.with_bridge(&candidate, |_| Ok(())) {
            Ok(()) => {
                info!("{} logged in", username);
                Ok(candidate)
            }
            Err(err) => {
                warn!("login failed for user '{}': {}", username, err);
                Err(err)
            }
        }
    }

    /// Forget the caller's identity.
    pub fn logout(&self, identity: Identity) -> Identity {
        if let Some(user) = identity.username() {
            info!("{} logged out", user);
        }
        Identity::Anonymous
    }

    /// Delete a file (`item_kind == "file"`) or an empty directory (`"dir"`).
    pub fn delete(&self, identity: &Identity, item_path: &str, item_kind: &str) -> Result<Deleted> {
        if !self.credentials.is_admin(identity) {
            return Err(GatewayError::PermissionDenied(
                "you do not have permission to delete items".to_string(),
            ));
        }
        let path = RemotePath::new(item_path);
        let name = match path.file_name() {
            Some(name) if !item_kind.is_empty() => name.to_string(),
            _ => return Err(GatewayError::InvalidRequest("invalid delete request".to_string())),
        };
        let kind: ItemKind = item_kind.parse()?;

        self.with_bridge(identity, |bridge| bridge.delete(&path, kind))
            .map_err(|err| {
                warn!("could not delete {}: {}", path, err);
                err
            })?;
        info!("{} deleted {} {}", identity.username().unwrap_or_default(), kind, path);
        Ok(Deleted { name, kind, parent: path.dirname() })
    }

    /// Store `content` as `file_name` inside `dir`. The content is staged
    /// locally first; the staged copy is removed whatever the outcome.
    pub fn upload<R: Read + ?Sized>(
        &self,
        identity: &Identity,
        dir: &str,
        file_name: &str,
        content: &mut R,
    ) -> Result<Uploaded> {
        self.require_login(identity, "upload files")?;
        let name = file_name
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .unwrap_or_default()
            .trim();
        if name.is_empty() || name == "." || name == ".." {
            return Err(GatewayError::InvalidRequest("no file selected for upload".to_string()));
        }
        let dir = RemotePath::new(dir);

        let mut staged = self.staging.stage(name, content)?;
        let stored = self.with_bridge(identity, |bridge| bridge.store(&dir, name, staged.as_file_mut()));
        let size = staged.size();
        staged.remove();

        match stored {
            Ok(sent) => {
                info!("uploaded {} ({} bytes) to {}", name, sent, dir);
                Ok(Uploaded { name: name.to_string(), dir, size })
            }
            Err(err) => {
                warn!("upload of {} to {} failed: {}", name, dir, err);
                Err(err)
            }
        }
    }

    /// Create directory `name` inside `dir`.
    pub fn mkdir(&self, identity: &Identity, dir: &str, name: &str) -> Result<Created> {
        self.require_login(identity, "create directories")?;
        let name = name.trim();
        if name.is_empty() {
            return Err(GatewayError::InvalidRequest("directory name cannot be empty".to_string()));
        }
        let dir = RemotePath::new(dir);

        self.with_bridge(identity, |bridge| bridge.make_dir(&dir, name))
            .map_err(|err| {
                warn!("could not create directory {} in {}: {}", name, dir, err);
                err
            })?;
        info!("created directory {} in {}", name, dir);
        Ok(Created { name: name.to_string(), dir })
    }

    /// Fetch `file_path` into local staging. The returned file is removed
    /// when dropped; on failure nothing is left behind.
    pub fn download(&self, identity: &Identity, file_path: &str) -> Result<StagedFile> {
        let path = RemotePath::new(file_path);
        self.guard_traversal(identity, &path)?;
        let name = match path.file_name() {
            Some(name) => name.to_string(),
            None => return Err(GatewayError::InvalidRequest("no file to download".to_string())),
        };

        self.staging
            .receive(&name, |writer| {
                self.with_bridge(identity, |bridge| bridge.retrieve(&path, writer))
            })
            .map_err(|err| {
                warn!("could not download {}: {}", path, err);
                err
            })
    }
}
