//! Session credential adapter: maps the caller's identity onto the
//! credentials used to log in to the FTP backend.

use std::fmt;

use super::config::FtpConfig;
use super::types::{GatewayError, Result};

/// Who is making a request. Lives in caller-side session state and is
/// passed into every gateway operation.
#[derive(Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Authenticated { username: String, secret: String },
}

impl Identity {
    pub fn is_anonymous(&self) -> bool {
        *self == Identity::Anonymous
    }

    pub fn username(&self) -> Option<&str> {
        match *self {
            Identity::Anonymous => None,
            Identity::Authenticated { ref username, .. } => Some(username.as_str()),
        }
    }
}

impl Default for Identity {
    fn default() -> Identity {
        Identity::Anonymous
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Identity::Anonymous => write!(f, "Anonymous"),
            Identity::Authenticated { ref username, .. } => f
                .debug_struct("Authenticated")
                .field("username", username)
                .field("secret", &"***")
                .finish(),
        }
    }
}

/// `USER`/`PASS` pair sent on a control connection.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CredentialAdapter {
    admin_user: String,
    anonymous_user: String,
    anonymous_password: String,
}

impl CredentialAdapter {
    pub fn new(config: &FtpConfig) -> CredentialAdapter {
        CredentialAdapter {
            admin_user: config.admin_user.clone(),
            anonymous_user: config.anonymous_user.clone(),
            anonymous_password: config.anonymous_password.clone(),
        }
    }

    /// True only for an authenticated identity carrying the admin name.
    pub fn is_admin(&self, identity: &Identity) -> bool {
        identity.username() == Some(self.admin_user.as_str())
    }

    /// Credentials for `identity`. Anything other than the admin gets the
    /// anonymous guest login.
    pub fn resolve(&self, identity: &Identity) -> Credentials {
        match *identity {
            Identity::Authenticated { ref username, ref secret } if *username == self.admin_user => Credentials {
                user: username.clone(),
                password: secret.clone(),
            },
            _ => Credentials {
                user: self.anonymous_user.clone(),
                password: self.anonymous_password.clone(),
            },
        }
    }

    /// Candidate identity for a login attempt, before the backend has
    /// verified it. Only the admin name may become `Authenticated`.
    pub fn candidate(&self, username: &str, password: &str) -> Result<Identity> {
        if username.is_empty() || password.is_empty() {
            return Err(GatewayError::InvalidRequest("username and password are required".to_string()));
        }
        if username != self.admin_user {
            return Err(GatewayError::PermissionDenied("only the administrator can log in".to_string()));
        }
        Ok(Identity::Authenticated {
            username: username.to_string(),
            secret: password.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> CredentialAdapter {
        CredentialAdapter::new(&FtpConfig::default())
    }

    #[test]
    fn anonymous_uses_guest_login() {
        let creds = adapter().resolve(&Identity::Anonymous);
        assert_eq!(creds.user, "anonymous");
        assert_eq!(creds.password, "anonymous@");
    }

    #[test]
    fn admin_uses_stored_secret() {
        let identity = Identity::Authenticated {
            username: "ezaz".to_string(),
            secret: "password123".to_string(),
        };
        let creds = adapter().resolve(&identity);
        assert_eq!(creds.user, "ezaz");
        assert_eq!(creds.password, "password123");
        assert!(adapter().is_admin(&identity));
    }

    #[test]
    fn other_authenticated_names_fall_back_to_guest() {
        let identity = Identity::Authenticated {
            username: "mallory".to_string(),
            secret: "x".to_string(),
        };
        assert_eq!(adapter().resolve(&identity).user, "anonymous");
        assert!(!adapter().is_admin(&identity));
    }

    #[test]
    fn candidate_rejects_non_admin() {
        assert!(matches!(
            adapter().candidate("guest", "pw"),
            Err(GatewayError::PermissionDenied(_))
        ));
        assert!(matches!(
            adapter().candidate("ezaz", ""),
            Err(GatewayError::InvalidRequest(_))
        ));
        assert!(adapter().candidate("ezaz", "pw").is_ok());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let identity = Identity::Authenticated {
            username: "ezaz".to_string(),
            secret: "password123".to_string(),
        };
        assert!(!format!("{:?}", identity).contains("password123"));
        assert!(!format!("{:?}", adapter().resolve(&identity)).contains("password123"));
    }
}
