//! Wire protocol: JSON text frames exchanged over the `/data` socket.
//!
//! Every exchange is exactly one request frame followed by exactly one
//! reply frame.

pub mod request;
pub mod response;

pub use request::{Action, FilterTerm, QueryRequest};
pub use response::{Doc, Found, ImageItem, QueryResponse, STATUS_OK};
