use crate::domain::model::SyncJob;
use crate::domain::ports::{Connector, RemoteDir};
use crate::utils::error::{Result, SyncError};
use std::io::{self, Write};
use std::net::{Ipv6Addr, ToSocketAddrs};
use std::time::Duration;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream};

pub const DEFAULT_PORT: u16 = 21;
const ANONYMOUS_USER: &str = "anonymous";
const ANONYMOUS_PASSWD: &str = "anonymous@";

#[derive(Debug, Clone)]
pub struct FtpConnector {
    port: u16,
    timeout: Duration,
}

impl FtpConnector {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }

    /// `host` may carry its own `:port` (`[v6]:port` for IPv6); otherwise the
    /// connector's port is used.
    fn address(&self, host: &str) -> String {
        if host.parse::<Ipv6Addr>().is_ok() {
            return format!("[{}]:{}", host, self.port);
        }
        match host.rsplit_once(':') {
            Some((name, port))
                if port.parse::<u16>().is_ok()
                    && (!name.contains(':') || (name.starts_with('[') && name.ends_with(']'))) =>
            {
                host.to_string()
            }
            _ => format!("{}:{}", host, self.port),
        }
    }
}

impl Default for FtpConnector {
    fn default() -> Self {
        Self::new(DEFAULT_PORT, Duration::from_secs(30))
    }
}

impl Connector for FtpConnector {
    type Session = FtpSession;

    fn connect(&self, job: &SyncJob) -> Result<FtpSession> {
        let address = self.address(job.host.trim());
        let connection_error = |message: String| SyncError::ConnectionError {
            host: address.clone(),
            message,
        };

        let socket = address
            .to_socket_addrs()
            .map_err(|e| connection_error(e.to_string()))?
            .next()
            .ok_or_else(|| connection_error("host did not resolve to any address".to_string()))?;

        tracing::debug!("Connecting to {} ({})", address, socket);
        let mut stream = FtpStream::connect_timeout(socket, self.timeout)
            .map_err(|e| connection_error(e.to_string()))?;

        let (user, passwd) = if job.is_anonymous() {
            (ANONYMOUS_USER, ANONYMOUS_PASSWD)
        } else {
            (job.user.as_str(), job.passwd.as_str())
        };
        stream.login(user, passwd)?;
        stream.cwd(&job.cwd)?;
        stream.transfer_type(FileType::Binary)?;
        tracing::debug!("Logged in to {} as {}, cwd {}", address, user, job.cwd);

        Ok(FtpSession { stream })
    }
}

pub struct FtpSession {
    stream: FtpStream,
}

impl RemoteDir for FtpSession {
    fn list(&mut self) -> Result<Vec<String>> {
        Ok(self.stream.nlst(None)?)
    }

    fn size(&mut self, name: &str) -> Result<Option<u64>> {
        match self.stream.size(name) {
            Ok(size) => Ok(Some(size as u64)),
            // 550 and friends: the server will not report a size for this entry.
            Err(FtpError::UnexpectedResponse(response)) => {
                tracing::debug!("SIZE {} not available: {:?}", name, response.status);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn retrieve(&mut self, name: &str, dest: &mut dyn Write) -> Result<u64> {
        let bytes = self.stream.retr(name, |reader| {
            io::copy(reader, &mut *dest).map_err(FtpError::ConnectionError)
        })?;
        Ok(bytes)
    }

    fn close(&mut self) {
        if let Err(e) = self.stream.quit() {
            tracing::debug!("QUIT failed: {}", e);
        }
    }
}
