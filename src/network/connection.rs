//! Connection
//!
//! One stream connection to an application server, TCP or Unix domain socket.

use std::io::{self, BufReader, ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::time::Duration;

use crate::config::{ClientConfig, Transport};
use crate::error::{FcgiError, Result};
use crate::protocol::{read_record, Record};

/// Underlying transport stream
#[derive(Debug)]
enum Stream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Stream {
    fn try_clone(&self) -> io::Result<Self> {
        match self {
            Stream::Tcp(s) => s.try_clone().map(Stream::Tcp),
            #[cfg(unix)]
            Stream::Unix(s) => s.try_clone().map(Stream::Unix),
        }
    }

    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            Stream::Tcp(s) => s.set_read_timeout(timeout),
            #[cfg(unix)]
            Stream::Unix(s) => s.set_read_timeout(timeout),
        }
    }

    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            Stream::Tcp(s) => s.set_write_timeout(timeout),
            #[cfg(unix)]
            Stream::Unix(s) => s.set_write_timeout(timeout),
        }
    }

    fn shutdown(&self) -> io::Result<()> {
        let result = match self {
            Stream::Tcp(s) => s.shutdown(Shutdown::Both),
            #[cfg(unix)]
            Stream::Unix(s) => s.shutdown(Shutdown::Both),
        };

        // Peer already gone: nothing left to close
        match result {
            Err(e) if e.kind() == ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(s) => s.read(buf),
            #[cfg(unix)]
            Stream::Unix(s) => s.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(s) => s.write(buf),
            #[cfg(unix)]
            Stream::Unix(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Tcp(s) => s.flush(),
            #[cfg(unix)]
            Stream::Unix(s) => s.flush(),
        }
    }
}

/// A connection to one application server
pub struct Connection {
    /// Stream reader (buffered for efficiency)
    reader: BufReader<Stream>,

    /// Stream writer, unbuffered: every send is already one whole buffer
    writer: Stream,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Dial the configured address
    ///
    /// Applies nodelay and timeouts from the config. Any failure is returned
    /// as is; there is no retry.
    pub fn open(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let stream = match config.transport {
            Transport::Tcp => {
                let stream = connect_tcp(&config.address, config.connect_timeout_ms)?;
                if config.nodelay {
                    stream.set_nodelay(true)?;
                }
                Stream::Tcp(stream)
            }
            Transport::Unix => connect_unix(&config.address)?,
        };

        let mut connection = Self::from_stream(stream, config.address.clone())?;
        connection.set_timeouts(config.read_timeout_ms, config.write_timeout_ms)?;

        tracing::debug!(
            "Connected to {} over {}",
            connection.peer_addr,
            config.transport
        );
        Ok(connection)
    }

    /// Wrap an already connected TCP stream
    pub fn from_tcp(stream: TcpStream) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        Self::from_stream(Stream::Tcp(stream), peer_addr)
    }

    /// Wrap an already connected Unix stream
    #[cfg(unix)]
    pub fn from_unix(stream: UnixStream) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .ok()
            .and_then(|a| a.as_pathname().map(|p| p.display().to_string()))
            .unwrap_or_else(|| "unix socket".to_string());
        Self::from_stream(Stream::Unix(stream), peer_addr)
    }

    fn from_stream(stream: Stream, peer_addr: String) -> Result<Self> {
        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: write_stream,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 leaves the direction blocking)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let read_stream = self.reader.get_ref();
        let write_stream = &self.writer;

        if read_ms > 0 {
            read_stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            write_stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Write a whole buffer straight to the socket.
    ///
    /// Nothing is buffered: a failed send leaves no bytes behind for shutdown.
    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Block until one complete record has been read.
    pub fn read_record(&mut self) -> Result<Record> {
        read_record(&mut self.reader)
    }

    /// Shut down both directions.
    pub fn shutdown(&mut self) -> io::Result<()> {
        self.writer.shutdown()
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

fn connect_tcp(address: &str, timeout_ms: u64) -> Result<TcpStream> {
    if timeout_ms == 0 {
        return Ok(TcpStream::connect(address)?);
    }

    let timeout = Duration::from_millis(timeout_ms);
    let mut last_error = None;
    for addr in address.to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }

    Err(FcgiError::ConnectionFailure(last_error.unwrap_or_else(|| {
        io::Error::new(
            ErrorKind::InvalidInput,
            format!("{} did not resolve to any address", address),
        )
    })))
}

#[cfg(unix)]
fn connect_unix(path: &str) -> Result<Stream> {
    Ok(Stream::Unix(UnixStream::connect(path)?))
}

#[cfg(not(unix))]
fn connect_unix(_path: &str) -> Result<Stream> {
    Err(FcgiError::Config(
        "unix transport is not available on this platform".to_string(),
    ))
}
