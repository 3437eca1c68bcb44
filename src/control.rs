//! The seam between the gateway and the FTP client it drives.
//!
//! The gateway never speaks the wire protocol itself: everything below
//! [`ControlConnection`] is the `suppaftp` client. Tests substitute their own
//! [`Connector`] to observe exactly which commands a gateway operation sends.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

#[cfg(feature = "secure")]
use native_tls::TlsConnector;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream};
#[cfg(feature = "secure")]
use suppaftp::{NativeTlsConnector, NativeTlsFtpStream};

use super::config::FtpConfig;
use super::types::BackendError;

/// One open control connection. Each method is a single FTP command (or a
/// command plus its data transfer).
pub trait ControlConnection {
    /// `USER`/`PASS`
    fn login(&mut self, user: &str, password: &str) -> Result<(), BackendError>;
    /// `MLSD`, raw fact lines
    fn mlsd(&mut self, path: Option<&str>) -> Result<Vec<String>, BackendError>;
    /// `LIST`, raw text lines
    fn list(&mut self, path: Option<&str>) -> Result<Vec<String>, BackendError>;
    fn cwd(&mut self, path: &str) -> Result<(), BackendError>;
    fn mkdir(&mut self, name: &str) -> Result<(), BackendError>;
    /// `DELE`
    fn rm(&mut self, path: &str) -> Result<(), BackendError>;
    /// `RMD`
    fn rmdir(&mut self, path: &str) -> Result<(), BackendError>;
    /// `STOR`, returning the number of bytes sent.
    fn put(&mut self, name: &str, reader: &mut dyn Read) -> Result<u64, BackendError>;
    /// `RETR`, returning the number of bytes received.
    fn retr(&mut self, path: &str, writer: &mut dyn Write) -> Result<u64, BackendError>;
    /// `QUIT`
    fn quit(&mut self) -> Result<(), BackendError>;
}

/// Opens fresh control connections to one backend.
pub trait Connector {
    type Connection: ControlConnection;

    /// Connect and read the greeting; no login yet.
    fn connect(&self) -> Result<Self::Connection, BackendError>;
}

/// Control stream of the `suppaftp` client, plain or TLS.
pub enum ControlStream {
    Plain(FtpStream),
    #[cfg(feature = "secure")]
    Tls(NativeTlsFtpStream),
}

macro_rules! delegate {
    ($self:expr, $method:ident $(, $arg:expr)* $(,)?) => {
        match $self {
            ControlStream::Plain(stream) => stream.$method($($arg),*),
            #[cfg(feature = "secure")]
            ControlStream::Tls(stream) => stream.$method($($arg),*),
        }
    };
}

impl ControlConnection for ControlStream {
    fn login(&mut self, user: &str, password: &str) -> Result<(), BackendError> {
        delegate!(self, login, user, password).map_err(BackendError::from)
    }

    fn mlsd(&mut self, path: Option<&str>) -> Result<Vec<String>, BackendError> {
        delegate!(self, mlsd, path).map_err(BackendError::from)
    }

    fn list(&mut self, path: Option<&str>) -> Result<Vec<String>, BackendError> {
        delegate!(self, list, path).map_err(BackendError::from)
    }

    fn cwd(&mut self, path: &str) -> Result<(), BackendError> {
        delegate!(self, cwd, path).map_err(BackendError::from)
    }

    fn mkdir(&mut self, name: &str) -> Result<(), BackendError> {
        delegate!(self, mkdir, name).map_err(BackendError::from)
    }

    fn rm(&mut self, path: &str) -> Result<(), BackendError> {
        delegate!(self, rm, path).map_err(BackendError::from)
    }

    fn rmdir(&mut self, path: &str) -> Result<(), BackendError> {
        delegate!(self, rmdir, path).map_err(BackendError::from)
    }

    fn put(&mut self, name: &str, mut reader: &mut dyn Read) -> Result<u64, BackendError> {
        delegate!(self, transfer_type, FileType::Binary)?;
        delegate!(self, put_file, name, &mut reader).map_err(BackendError::from)
    }

    fn retr(&mut self, path: &str, writer: &mut dyn Write) -> Result<u64, BackendError> {
        delegate!(self, transfer_type, FileType::Binary)?;
        delegate!(self, retr, path, |data: &mut dyn Read| {
            io::copy(data, &mut *writer).map_err(FtpError::ConnectionError)
        })
        .map_err(BackendError::from)
    }

    fn quit(&mut self) -> Result<(), BackendError> {
        delegate!(self, quit).map_err(BackendError::from)
    }
}

/// Connects to the configured backend with a bounded connect timeout. The
/// same bound applies to every subsequent read and write on the control
/// connection.
#[derive(Debug, Clone)]
pub struct FtpConnector {
    host: String,
    address: String,
    timeout: Duration,
    secure: bool,
}

impl FtpConnector {
    pub fn new(config: &FtpConfig) -> FtpConnector {
        FtpConnector {
            host: config.host.clone(),
            address: config.address(),
            timeout: config.connect_timeout(),
            secure: config.secure,
        }
    }

    fn resolve(&self) -> Result<Vec<SocketAddr>, BackendError> {
        let addrs: Vec<SocketAddr> = self
            .address
            .to_socket_addrs()
            .map_err(BackendError::Connection)?
            .collect();
        if addrs.is_empty() {
            return Err(BackendError::Connection(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no address found for {}", self.address),
            )));
        }
        Ok(addrs)
    }

    fn connect_plain(&self) -> Result<FtpStream, BackendError> {
        let mut last_err = None;
        for addr in self.resolve()? {
            match FtpStream::connect_timeout(addr, self.timeout) {
                Ok(stream) => {
                    let tcp = stream.get_ref();
                    tcp.set_read_timeout(Some(self.timeout)).map_err(BackendError::Connection)?;
                    tcp.set_write_timeout(Some(self.timeout)).map_err(BackendError::Connection)?;
                    return Ok(stream);
                }
                Err(err) => last_err = Some(BackendError::from(err)),
            }
        }
        Err(last_err.unwrap_or_else(|| BackendError::Protocol(format!("cannot connect to {}", self.address))))
    }

    #[cfg(feature = "secure")]
    fn connect_secure(&self) -> Result<ControlStream, BackendError> {
        let mut last_err = None;
        for addr in self.resolve()? {
            match NativeTlsFtpStream::connect_timeout(addr, self.timeout) {
                Ok(stream) => {
                    let tcp = stream.get_ref();
                    tcp.set_read_timeout(Some(self.timeout)).map_err(BackendError::Connection)?;
                    tcp.set_write_timeout(Some(self.timeout)).map_err(BackendError::Connection)?;
                    let connector = TlsConnector::new().map_err(|e| BackendError::Secure(e.to_string()))?;
                    let stream = stream.into_secure(NativeTlsConnector::from(connector), &self.host)?;
                    return Ok(ControlStream::Tls(stream));
                }
                Err(err) => last_err = Some(BackendError::from(err)),
            }
        }
        Err(last_err.unwrap_or_else(|| BackendError::Protocol(format!("cannot connect to {}", self.address))))
    }

    #[cfg(not(feature = "secure"))]
    fn connect_secure(&self) -> Result<ControlStream, BackendError> {
        Err(BackendError::Secure(format!(
            "FTPS requested for {} but the gateway was built without the `secure` feature",
            self.host
        )))
    }
}

impl Connector for FtpConnector {
    type Connection = ControlStream;

    fn connect(&self) -> Result<ControlStream, BackendError> {
        if self.secure {
            self.connect_secure()
        } else {
            self.connect_plain().map(ControlStream::Plain)
        }
    }
}
