//! Well-known names
//!
//! CGI parameter names commonly sent in Params records, and the management
//! variables understood in GetValues queries.

use bytes::Bytes;

use super::nvpair::NameValuePair;
use crate::error::Result;

pub const AUTH_TYPE: &str = "AUTH_TYPE";
pub const CONTENT_LENGTH: &str = "CONTENT_LENGTH";
pub const CONTENT_TYPE: &str = "CONTENT_TYPE";
pub const DOCUMENT_ROOT: &str = "DOCUMENT_ROOT";
pub const DOCUMENT_URI: &str = "DOCUMENT_URI";
pub const GATEWAY_INTERFACE: &str = "GATEWAY_INTERFACE";
pub const PATH_INFO: &str = "PATH_INFO";
pub const QUERY_STRING: &str = "QUERY_STRING";
pub const REMOTE_ADDR: &str = "REMOTE_ADDR";
pub const REMOTE_PORT: &str = "REMOTE_PORT";
pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
pub const REQUEST_URI: &str = "REQUEST_URI";
pub const SCRIPT_FILENAME: &str = "SCRIPT_FILENAME";
pub const SCRIPT_NAME: &str = "SCRIPT_NAME";
pub const SERVER_NAME: &str = "SERVER_NAME";
pub const SERVER_PORT: &str = "SERVER_PORT";
pub const SERVER_PROTOCOL: &str = "SERVER_PROTOCOL";
pub const SERVER_SOFTWARE: &str = "SERVER_SOFTWARE";

// -----------------------------------------------------------------------------
// Management variables
// -----------------------------------------------------------------------------

/// Maximum concurrent transport connections the server accepts
pub const FCGI_MAX_CONNS: &str = "FCGI_MAX_CONNS";

/// Maximum concurrent requests the server accepts
pub const FCGI_MAX_REQS: &str = "FCGI_MAX_REQS";

/// "1" if the server multiplexes connections, "0" otherwise
pub const FCGI_MPXS_CONNS: &str = "FCGI_MPXS_CONNS";

/// All management variables, in query order
pub const MANAGEMENT_VARIABLES: [&str; 3] = [FCGI_MAX_CONNS, FCGI_MAX_REQS, FCGI_MPXS_CONNS];

/// Pairs with empty values, as a GetValues query expects
pub fn query_pairs<I, S>(names: I) -> Result<Vec<NameValuePair>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| NameValuePair::new(Bytes::copy_from_slice(name.as_ref().as_bytes()), Bytes::new()))
        .collect()
}
