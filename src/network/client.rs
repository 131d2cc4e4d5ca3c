//! Client
//!
//! Drives request/response exchanges with an application server over a
//! single connection.
//!
//! ## Exchange Lifecycle
//! ```text
//! Idle ──connect──▶ Connected ──send──▶ RequestSent ──read──▶ CollectingResponse
//!                                                                  │
//!                                                   ┌──────────────┴─────────┐
//!                                                   ▼                        ▼
//!                                                 Done                    Failed
//! ```
//!
//! One [`Client`] carries at most one outstanding exchange. Requests are not
//! multiplexed: the whole send / read-until-end sequence and the request id
//! allocation happen under one lock. Callers that need parallel exchanges
//! open one client per connection.

use std::io::{self, ErrorKind};

use bytes::Bytes;
use parking_lot::{Mutex, MutexGuard};

use super::connection::Connection;
use crate::config::ClientConfig;
use crate::error::{FcgiError, Result};
use crate::protocol::params::query_pairs;
use crate::protocol::stream::{filter_by_request_id, split_byte_stream, stderr_of, stdout_of};
use crate::protocol::{
    encode_records, values_record, EndRequestBody, Message, NameValuePair, ProtocolStatus, Record,
    RecordType, KEEP_CONN, NULL_REQUEST_ID,
};

/// Where a session is in its exchange lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// No connection yet; the next exchange dials
    Idle,
    Connected,
    RequestSent,
    CollectingResponse,
    Done,
    /// A transport or protocol error occurred; the session is unusable
    Failed,
}

// =============================================================================
// Request Ids
// =============================================================================

/// Hands out request ids 1, 2, ..., 65535, 1, ...
#[derive(Debug, Clone)]
pub struct RequestIdCounter {
    next: u16,
}

impl RequestIdCounter {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Start from `id` (0 is bumped to 1)
    pub fn starting_at(id: u16) -> Self {
        Self { next: id.max(1) }
    }

    /// The id the next call to `allocate` returns
    pub fn peek(&self) -> u16 {
        self.next
    }

    pub fn allocate(&mut self) -> u16 {
        let id = self.next;
        self.next = match self.next.wrapping_add(1) {
            NULL_REQUEST_ID => 1,
            next => next,
        };
        id
    }
}

impl Default for RequestIdCounter {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Exchange Result
// =============================================================================

/// Outcome of one completed exchange
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Request id used for the exchange
    pub request_id: u16,

    /// Every record received, up to and including the EndRequest
    pub records: Vec<Record>,

    /// Concatenated StdOut content for this request
    pub stdout: Bytes,

    /// Concatenated StdErr content for this request
    pub stderr: Bytes,

    /// EndRequest body for this request, if the terminating record was ours
    pub end: Option<EndRequestBody>,
}

impl Exchange {
    /// Filter the received records down to `request_id` and join its streams.
    pub fn from_records(request_id: u16, records: Vec<Record>) -> Result<Self> {
        let own = filter_by_request_id(&records, request_id);

        let end = match own
            .iter()
            .find(|record| record.record_type() == RecordType::EndRequest)
        {
            Some(record) => Some(EndRequestBody::decode(record.content())?),
            None => None,
        };

        Ok(Self {
            request_id,
            stdout: stdout_of(&own),
            stderr: stderr_of(&own),
            end,
            records,
        })
    }

    pub fn app_status(&self) -> Option<u32> {
        self.end.map(|end| end.app_status)
    }

    pub fn protocol_status(&self) -> Option<ProtocolStatus> {
        self.end.map(|end| end.protocol_status)
    }

    pub fn has_stderr(&self) -> bool {
        !self.stderr.is_empty()
    }

    /// The script output, or the reason it should not be used
    ///
    /// Nonempty stderr wins over stdout and yields
    /// [`FcgiError::ApplicationError`]; a non-complete protocol status yields
    /// [`FcgiError::Rejected`].
    pub fn into_stdout(self) -> Result<Bytes> {
        if !self.stderr.is_empty() {
            return Err(FcgiError::ApplicationError(self.stderr));
        }

        match self.end {
            Some(end) if end.protocol_status == ProtocolStatus::RequestComplete => Ok(self.stdout),
            Some(end) => Err(FcgiError::Rejected(end.protocol_status)),
            None => Err(FcgiError::protocol(format!(
                "response ended without an EndRequest for request {}",
                self.request_id
            ))),
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// Exclusive view of a client's connection
///
/// Obtained through [`Client::session`]; holding it keeps every other caller
/// of the same client waiting, so the low-level steps below can be sequenced
/// by hand without interleaving.
pub struct Session {
    config: ClientConfig,
    connection: Option<Connection>,
    request_ids: RequestIdCounter,
    state: ExchangeState,
}

impl Session {
    fn new(config: ClientConfig, connection: Option<Connection>) -> Self {
        let state = if connection.is_some() {
            ExchangeState::Connected
        } else {
            ExchangeState::Idle
        };

        Self {
            config,
            connection,
            request_ids: RequestIdCounter::new(),
            state,
        }
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// Allocate the id for the next exchange.
    pub fn next_request_id(&mut self) -> u16 {
        self.request_ids.allocate()
    }

    /// Replace the request id counter (e.g. to resume a numbering).
    pub fn set_request_ids(&mut self, counter: RequestIdCounter) {
        self.request_ids = counter;
    }

    /// Dial if there is no open connection.
    pub fn connect(&mut self) -> Result<()> {
        self.ensure_usable()?;
        if self.connection.is_some() {
            return Ok(());
        }

        match Connection::open(&self.config) {
            Ok(connection) => {
                self.connection = Some(connection);
                self.state = ExchangeState::Connected;
                Ok(())
            }
            Err(e) => {
                self.state = ExchangeState::Failed;
                Err(e)
            }
        }
    }

    /// Write BeginRequest, the parameters, and stdin as one buffer.
    ///
    /// Order on the wire: BeginRequest, Params carrying `params` (skipped when
    /// empty), empty Params, StdIn records carrying `stdin`, empty StdIn.
    /// Oversized parameter sets fail before anything is written.
    pub fn send_request(
        &mut self,
        request_id: u16,
        params: &[NameValuePair],
        stdin: impl Into<Bytes>,
    ) -> Result<()> {
        if request_id == NULL_REQUEST_ID {
            return Err(FcgiError::protocol(
                "request id 0 is reserved for management records",
            ));
        }

        let flags = if self.config.keep_conn { KEEP_CONN } else { 0 };
        let stdin = stdin.into();

        let mut records = Vec::with_capacity(5);
        records.push(Message::begin_request(request_id, self.config.role, flags).to_record()?);
        if !params.is_empty() {
            records.push(values_record(RecordType::Params, request_id, params)?);
        }
        records.push(Record::empty(RecordType::Params, request_id));
        records.extend(split_byte_stream(RecordType::StdIn, request_id, &stdin)?);

        let buf = encode_records(&records);
        tracing::debug!(
            "Sending request {} ({} records, {} bytes)",
            request_id,
            records.len(),
            buf.len()
        );

        let sent = self.connection_mut().and_then(|c| c.send(&buf));
        self.track(sent)?;
        self.state = ExchangeState::RequestSent;
        Ok(())
    }

    /// Read records until the first EndRequest, of any request id.
    ///
    /// Returns every record read, in arrival order, the EndRequest last, and
    /// leaves the session `Done`.
    pub fn read_response_until_end(&mut self) -> Result<Vec<Record>> {
        self.state = ExchangeState::CollectingResponse;

        let mut records = Vec::new();
        loop {
            let record = self.read_record()?;
            let is_end = record.record_type() == RecordType::EndRequest;
            records.push(record);
            if is_end {
                break;
            }
        }

        self.state = ExchangeState::Done;
        Ok(records)
    }

    /// Block until one record arrives.
    pub fn read_record(&mut self) -> Result<Record> {
        let read = self.connection_mut().and_then(Connection::read_record);
        let record = self.track(read)?;
        tracing::trace!(
            "Received {:?} for request {} ({} bytes)",
            record.record_type(),
            record.request_id(),
            record.content_length()
        );
        Ok(record)
    }

    /// Ask the application server to abandon `request_id`.
    pub fn send_abort(&mut self, request_id: u16) -> Result<()> {
        let record = Message::abort_request(request_id).to_record()?;
        self.send_records(&[record])
    }

    /// Write records as one buffer.
    pub fn send_records(&mut self, records: &[Record]) -> Result<()> {
        let buf = encode_records(records);
        let sent = self.connection_mut().and_then(|c| c.send(&buf));
        self.track(sent)
    }

    /// Run one exchange with a freshly allocated request id.
    pub fn exchange(&mut self, params: &[NameValuePair], stdin: impl Into<Bytes>) -> Result<Exchange> {
        let request_id = self.next_request_id();
        self.exchange_with_id(request_id, params, stdin)
    }

    /// Run one exchange under a caller-chosen request id.
    pub fn exchange_with_id(
        &mut self,
        request_id: u16,
        params: &[NameValuePair],
        stdin: impl Into<Bytes>,
    ) -> Result<Exchange> {
        self.connect()?;
        self.send_request(request_id, params, stdin)?;
        let records = self.read_response_until_end()?;

        let exchange = Exchange::from_records(request_id, records);
        let exchange = self.track(exchange)?;

        tracing::debug!(
            "Request {} done: {} records, stdout {} bytes, stderr {} bytes",
            request_id,
            exchange.records.len(),
            exchange.stdout.len(),
            exchange.stderr.len()
        );

        // Without keep-conn the server hangs up after EndRequest
        if !self.config.keep_conn {
            if let Some(mut connection) = self.connection.take() {
                // Exchange is complete; a close failure is only logged
                if let Err(e) = connection.shutdown() {
                    tracing::warn!(
                        "Closing connection to {} failed: {}",
                        connection.peer_addr(),
                        e
                    );
                }
            }
        }

        Ok(exchange)
    }

    /// Query management variables with a GetValues record.
    ///
    /// Records other than GetValuesResult are skipped; an UnknownType reply
    /// means the server does not support the query.
    pub fn get_values<I, S>(&mut self, names: I) -> Result<Vec<NameValuePair>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let query = values_record(RecordType::GetValues, NULL_REQUEST_ID, &query_pairs(names)?)?;

        self.connect()?;
        self.send_records(&[query])?;

        loop {
            let record = self.read_record()?;
            match record.record_type() {
                RecordType::GetValuesResult => {
                    let pairs = record.parse_content_as_pairs();
                    return self.track(pairs);
                }
                RecordType::UnknownType => {
                    self.state = ExchangeState::Failed;
                    return Err(FcgiError::protocol(
                        "application server rejected GetValues as an unknown record type",
                    ));
                }
                other => {
                    tracing::debug!("Skipping {:?} while waiting for GetValuesResult", other);
                }
            }
        }
    }

    /// Shut the connection down, if one is open.
    pub fn close(&mut self) -> io::Result<()> {
        match self.connection.take() {
            Some(mut connection) => connection.shutdown(),
            None => Ok(()),
        }
    }

    pub fn peer_addr(&self) -> &str {
        match &self.connection {
            Some(connection) => connection.peer_addr(),
            None => &self.config.address,
        }
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.state == ExchangeState::Failed {
            return Err(FcgiError::ConnectionFailure(io::Error::new(
                ErrorKind::NotConnected,
                "session failed during an earlier exchange",
            )));
        }
        Ok(())
    }

    fn connection_mut(&mut self) -> Result<&mut Connection> {
        self.ensure_usable()?;
        self.connection.as_mut().ok_or_else(|| {
            FcgiError::ConnectionFailure(io::Error::new(
                ErrorKind::NotConnected,
                "no open connection",
            ))
        })
    }

    /// Mark the session failed when `result` is an error.
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(ref e) = result {
            tracing::debug!("Exchange with {} failed: {}", self.peer_addr(), e);
            self.state = ExchangeState::Failed;
        }
        result
    }
}

// =============================================================================
// Client
// =============================================================================

/// A FastCGI client bound to one application server connection
pub struct Client {
    session: Mutex<Session>,
}

impl Client {
    /// Create a client that dials on its first exchange.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            session: Mutex::new(Session::new(config, None)),
        })
    }

    /// Dial the application server now.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let connection = Connection::open(&config)?;
        Ok(Self::from_connection(connection, config))
    }

    /// Use an already open connection.
    pub fn from_connection(connection: Connection, config: ClientConfig) -> Self {
        Self {
            session: Mutex::new(Session::new(config, Some(connection))),
        }
    }

    /// Run one exchange: allocate an id, send the request, read until
    /// EndRequest, and split out this request's output.
    pub fn execute(&self, params: &[NameValuePair], stdin: impl Into<Bytes>) -> Result<Exchange> {
        self.session.lock().exchange(params, stdin)
    }

    /// Like [`Client::execute`] with a caller-chosen request id.
    pub fn execute_with_id(
        &self,
        request_id: u16,
        params: &[NameValuePair],
        stdin: impl Into<Bytes>,
    ) -> Result<Exchange> {
        self.session.lock().exchange_with_id(request_id, params, stdin)
    }

    /// Query management variables such as `FCGI_MAX_CONNS`.
    pub fn get_values<I, S>(&self, names: I) -> Result<Vec<NameValuePair>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.session.lock().get_values(names)
    }

    /// Take exclusive hold of the connection.
    pub fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock()
    }

    pub fn state(&self) -> ExchangeState {
        self.session.lock().state()
    }

    /// Shut the connection down.
    pub fn close(self) -> io::Result<()> {
        self.session.into_inner().close()
    }
}

/// Connect, run one exchange, and close the connection.
///
/// If both the exchange and the close fail, both causes are reported in one
/// [`FcgiError::Combined`].
pub fn run_once(
    config: ClientConfig,
    params: &[NameValuePair],
    stdin: impl Into<Bytes>,
) -> Result<Exchange> {
    let client = Client::connect(config)?;
    let mut session = client.session.into_inner();

    let result = session.exchange(params, stdin);
    let closed = session.close();

    FcgiError::combine(result, closed)
}
