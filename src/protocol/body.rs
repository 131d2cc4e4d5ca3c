//! Fixed-size record bodies
//!
//! BeginRequest, EndRequest and UnknownType records all carry an 8-byte body.

use crate::error::{FcgiError, Result};

/// Size of every fixed body
pub const BODY_LEN: usize = 8;

/// BeginRequest flag: keep the connection open after the request ends
pub const KEEP_CONN: u8 = 1;

/// Role the application server plays for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u16)]
pub enum Role {
    #[default]
    Responder = 1,
    Authorizer = 2,
    Filter = 3,
}

impl Role {
    pub fn from_code(code: u16) -> Result<Self> {
        match code {
            1 => Ok(Role::Responder),
            2 => Ok(Role::Authorizer),
            3 => Ok(Role::Filter),
            _ => Err(FcgiError::protocol(format!("unknown role: {}", code))),
        }
    }
}

/// Protocol-level outcome reported in an EndRequest body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProtocolStatus {
    RequestComplete = 0,
    CantMultiplexConnection = 1,
    Overloaded = 2,
    UnknownRole = 3,
}

impl ProtocolStatus {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(ProtocolStatus::RequestComplete),
            1 => Ok(ProtocolStatus::CantMultiplexConnection),
            2 => Ok(ProtocolStatus::Overloaded),
            3 => Ok(ProtocolStatus::UnknownRole),
            _ => Err(FcgiError::protocol(format!(
                "unknown protocol status: {}",
                code
            ))),
        }
    }
}

/// Body of a BeginRequest record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeginRequestBody {
    pub role: Role,
    pub flags: u8,
}

impl BeginRequestBody {
    pub fn new(role: Role, flags: u8) -> Self {
        Self { role, flags }
    }

    pub fn keep_conn(&self) -> bool {
        self.flags & KEEP_CONN != 0
    }

    /// role (2, BE) + flags (1) + reserved (5)
    pub fn to_bytes(&self) -> [u8; BODY_LEN] {
        let role = (self.role as u16).to_be_bytes();
        [role[0], role[1], self.flags, 0, 0, 0, 0, 0]
    }

    pub fn decode(content: &[u8]) -> Result<Self> {
        let body = fixed_body(content, "BeginRequest")?;
        Ok(Self {
            role: Role::from_code(u16::from_be_bytes([body[0], body[1]]))?,
            flags: body[2],
        })
    }
}

/// Body of an EndRequest record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndRequestBody {
    pub app_status: u32,
    pub protocol_status: ProtocolStatus,
}

impl EndRequestBody {
    pub fn new(app_status: u32, protocol_status: ProtocolStatus) -> Self {
        Self {
            app_status,
            protocol_status,
        }
    }

    /// app status (4, BE) + protocol status (1) + reserved (3)
    pub fn to_bytes(&self) -> [u8; BODY_LEN] {
        let app = self.app_status.to_be_bytes();
        [app[0], app[1], app[2], app[3], self.protocol_status as u8, 0, 0, 0]
    }

    pub fn decode(content: &[u8]) -> Result<Self> {
        let body = fixed_body(content, "EndRequest")?;
        Ok(Self {
            app_status: u32::from_be_bytes([body[0], body[1], body[2], body[3]]),
            protocol_status: ProtocolStatus::from_code(body[4])?,
        })
    }
}

/// Body of an UnknownType record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownTypeBody {
    /// The type code the peer did not understand
    pub record_type: u8,
}

impl UnknownTypeBody {
    pub fn new(record_type: u8) -> Self {
        Self { record_type }
    }

    /// type (1) + reserved (7)
    pub fn to_bytes(&self) -> [u8; BODY_LEN] {
        [self.record_type, 0, 0, 0, 0, 0, 0, 0]
    }

    pub fn decode(content: &[u8]) -> Result<Self> {
        let body = fixed_body(content, "UnknownType")?;
        Ok(Self {
            record_type: body[0],
        })
    }
}

fn fixed_body<'a>(content: &'a [u8], kind: &str) -> Result<&'a [u8; BODY_LEN]> {
    content.try_into().map_err(|_| {
        FcgiError::protocol(format!(
            "{} body must be {} bytes, got {}",
            kind,
            BODY_LEN,
            content.len()
        ))
    })
}
