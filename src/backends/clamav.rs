//! ClamAV scanning backend.
//!
//! This module provides an engine that talks to a ClamAV daemon (clamd)
//! over its socket protocol.
//!
//! # Requirements
//!
//! - ClamAV daemon (clamd) must be running
//! - Access to the clamd socket (Unix socket or TCP)
//!
//! # Protocol
//!
//! Each session opens one connection and issues `zINSTREAM`. Chunks are sent
//! as a big-endian `u32` length followed by the bytes; a zero length ends the
//! stream and clamd answers with a single NUL-terminated line.

use crate::core::{EndOfInput, ScanEngine, ScanError, ScanSession, SessionStatus, Verdict};

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

const ENGINE_NAME: &str = "clamav";

/// ClamAV engine configuration.
#[derive(Debug, Clone)]
pub struct ClamAvConfig {
    /// Path to the Unix socket.
    pub socket_path: Option<PathBuf>,

    /// TCP host and port (alternative to socket).
    pub tcp_address: Option<String>,

    /// Connection timeout.
    pub connection_timeout: Duration,

    /// Read and write timeout on an established connection.
    pub io_timeout: Duration,
}

impl Default for ClamAvConfig {
    fn default() -> Self {
        Self {
            socket_path: Some(PathBuf::from("/var/run/clamav/clamd.sock")),
            tcp_address: None,
            connection_timeout: Duration::from_secs(10),
            io_timeout: Duration::from_secs(300),
        }
    }
}

impl ClamAvConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Unix socket path.
    pub fn with_socket(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = Some(path.into());
        self.tcp_address = None;
        self
    }

    /// Sets the TCP address, e.g. `127.0.0.1:3310`.
    pub fn with_tcp(mut self, address: impl Into<String>) -> Self {
        self.tcp_address = Some(address.into());
        self.socket_path = None;
        self
    }

    /// Sets the connection timeout.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sets the I/O timeout.
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }
}

/// ClamAV engine using the clamd INSTREAM command.
///
/// # Example
///
/// ```rust,ignore
/// use scanwarden::backends::clamav::{ClamAvConfig, ClamAvEngine};
///
/// let config = ClamAvConfig::new().with_tcp("127.0.0.1:3310");
/// let engine = ClamAvEngine::new(config)?;
/// ```
#[derive(Debug)]
pub struct ClamAvEngine {
    config: ClamAvConfig,
}

impl ClamAvEngine {
    /// Creates a new ClamAV engine with the given configuration.
    pub fn new(config: ClamAvConfig) -> Result<Self, ScanError> {
        if config.socket_path.is_none() && config.tcp_address.is_none() {
            return Err(ScanError::configuration(
                "Either socket_path or tcp_address must be specified",
            ));
        }
        Ok(Self { config })
    }

    /// Creates a ClamAV engine with default configuration.
    pub fn with_defaults() -> Result<Self, ScanError> {
        Self::new(ClamAvConfig::default())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClamAvConfig {
        &self.config
    }

    fn connect(&self) -> Result<Box<dyn Transport>, ScanError> {
        if let Some(address) = &self.config.tcp_address {
            let addr = address
                .to_socket_addrs()
                .map_err(|e| ScanError::engine(ENGINE_NAME, format!("bad address {}: {}", address, e)))?
                .next()
                .ok_or_else(|| {
                    ScanError::engine(ENGINE_NAME, format!("no address for {}", address))
                })?;
            let stream = TcpStream::connect_timeout(&addr, self.config.connection_timeout)
                .map_err(|e| ScanError::engine(ENGINE_NAME, e.to_string()))?;
            stream
                .set_read_timeout(Some(self.config.io_timeout))
                .and_then(|_| stream.set_write_timeout(Some(self.config.io_timeout)))
                .map_err(|e| ScanError::engine(ENGINE_NAME, e.to_string()))?;
            return Ok(Box::new(stream));
        }

        match &self.config.socket_path {
            #[cfg(unix)]
            Some(path) => {
                let stream = std::os::unix::net::UnixStream::connect(path)
                    .map_err(|e| ScanError::engine(ENGINE_NAME, e.to_string()))?;
                stream
                    .set_read_timeout(Some(self.config.io_timeout))
                    .and_then(|_| stream.set_write_timeout(Some(self.config.io_timeout)))
                    .map_err(|e| ScanError::engine(ENGINE_NAME, e.to_string()))?;
                Ok(Box::new(stream))
            }
            #[cfg(not(unix))]
            Some(_) => Err(ScanError::configuration(
                "Unix sockets not supported on this platform",
            )),
            None => Err(ScanError::configuration("No connection method configured")),
        }
    }
}

impl ScanEngine for ClamAvEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    fn start_session(&self) -> Result<Box<dyn ScanSession>, ScanError> {
        let mut stream = self.connect()?;
        stream
            .write_all(b"zINSTREAM\0")
            .map_err(|e| ScanError::engine(ENGINE_NAME, e.to_string()))?;

        tracing::debug!(engine = ENGINE_NAME, "INSTREAM session opened");
        Ok(Box::new(ClamAvSession { stream }))
    }
}

trait Transport: Read + Write + Send {}

impl<T: Read + Write + Send> Transport for T {}

struct ClamAvSession {
    stream: Box<dyn Transport>,
}

impl ClamAvSession {
    fn read_reply(&mut self) -> Result<String, ScanError> {
        let mut reply = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match self.stream.read(&mut byte) {
                Ok(0) => break,
                Ok(_) if byte[0] == 0 => break,
                Ok(_) => reply.push(byte[0]),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ScanError::engine(ENGINE_NAME, e.to_string())),
            }
        }
        Ok(String::from_utf8_lossy(&reply).into_owned())
    }
}

impl ScanSession for ClamAvSession {
    fn feed(&mut self, chunk: &[u8]) -> Result<SessionStatus, ScanError> {
        let len = u32::try_from(chunk.len())
            .map_err(|_| ScanError::engine(ENGINE_NAME, "chunk larger than 4 GiB"))?;

        let written = self
            .stream
            .write_all(&len.to_be_bytes())
            .and_then(|_| self.stream.write_all(chunk));

        match written {
            Ok(()) => Ok(SessionStatus::NeedMoreData),
            Err(e) => {
                // clamd answers and hangs up early, e.g. when StreamMaxLength is hit.
                let reply = self.read_reply()?;
                if reply.trim().is_empty() {
                    return Err(ScanError::engine(ENGINE_NAME, e.to_string()));
                }
                Ok(SessionStatus::Verdict(parse_response(&reply)))
            }
        }
    }

    fn finish(&mut self) -> Result<EndOfInput, ScanError> {
        self.stream
            .write_all(&0u32.to_be_bytes())
            .and_then(|_| self.stream.flush())
            .map_err(|e| ScanError::engine(ENGINE_NAME, e.to_string()))?;

        let reply = self.read_reply()?;
        if reply.trim().is_empty() {
            return Ok(EndOfInput::Incomplete {
                reason: "clamd closed the connection without a reply".to_string(),
            });
        }
        Ok(EndOfInput::Verdict(parse_response(&reply)))
    }
}

/// Parses a clamd reply line such as `stream: Eicar-Test-Signature FOUND`.
fn parse_response(response: &str) -> Verdict {
    let response = response.trim();

    if response.ends_with("OK") {
        Verdict::Clean
    } else if response.ends_with("FOUND") {
        let name = response
            .split_once(':')
            .map(|(_, rest)| rest)
            .unwrap_or(response)
            .trim_end_matches("FOUND")
            .trim();
        Verdict::infected(if name.is_empty() { "Unknown" } else { name })
    } else if response.ends_with("ERROR") {
        Verdict::unchecked(response)
    } else {
        Verdict::unchecked(format!("Unexpected response: {}", response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_clean() {
        assert_eq!(parse_response("stream: OK"), Verdict::Clean);
        assert_eq!(parse_response("stream: OK\n"), Verdict::Clean);
    }

    #[test]
    fn test_parse_response_infected() {
        assert_eq!(
            parse_response("stream: Eicar-Test-Signature FOUND"),
            Verdict::infected("Eicar-Test-Signature")
        );
    }

    #[test]
    fn test_parse_response_error() {
        let verdict = parse_response("INSTREAM size limit exceeded. ERROR");
        assert!(verdict.is_unchecked());
        assert!(verdict.details().contains("size limit"));

        assert!(parse_response("PONG").is_unchecked());
    }

    #[test]
    fn test_config_builder() {
        let config = ClamAvConfig::new()
            .with_tcp("127.0.0.1:3310")
            .with_io_timeout(Duration::from_secs(5));
        assert!(config.socket_path.is_none());
        assert_eq!(config.tcp_address.as_deref(), Some("127.0.0.1:3310"));
        assert!(ClamAvEngine::new(config).is_ok());

        let empty = ClamAvConfig {
            socket_path: None,
            tcp_address: None,
            ..ClamAvConfig::default()
        };
        assert!(matches!(
            ClamAvEngine::new(empty),
            Err(ScanError::Configuration { .. })
        ));
    }

    #[test]
    fn test_instream_against_fake_daemon() {
        use std::net::TcpListener;
        use std::thread;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let daemon = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut command = [0u8; 10];
            conn.read_exact(&mut command).unwrap();
            assert_eq!(&command, b"zINSTREAM\0");

            let mut payload = Vec::new();
            loop {
                let mut len = [0u8; 4];
                conn.read_exact(&mut len).unwrap();
                let len = u32::from_be_bytes(len) as usize;
                if len == 0 {
                    break;
                }
                let mut chunk = vec![0u8; len];
                conn.read_exact(&mut chunk).unwrap();
                payload.extend_from_slice(&chunk);
            }
            conn.write_all(b"stream: Win.Test.EICAR_HDB-1 FOUND\0").unwrap();
            payload
        });

        let engine = ClamAvEngine::new(ClamAvConfig::new().with_tcp(address)).unwrap();
        let mut session = engine.start_session().unwrap();
        session.feed(b"hello ").unwrap();
        session.feed(b"world").unwrap();
        let end = session.finish().unwrap();

        assert_eq!(
            end,
            EndOfInput::Verdict(Verdict::infected("Win.Test.EICAR_HDB-1"))
        );
        assert_eq!(daemon.join().unwrap(), b"hello world");
    }
}
