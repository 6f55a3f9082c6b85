//! # imgserve-client
//!
//! WebSocket query client for the imgserve colorgram search service.
//!
//! Each user action (colorgram lookup, grid search, experiment listing)
//! opens one socket to the backend's `/data` endpoint, sends one JSON
//! request, waits for exactly one JSON reply, renders it into a page
//! [`dom::Document`], and closes the socket.
//!
//! ## Architecture
//!
//! ```text
//! FormBinding (client/)  ── reads inputs ──▶  Document (dom/)
//!     │                                          ▲
//!     ├── QueryRequest (protocol/)               │
//!     │                                          │
//!     ├── QueryConnection ── ws:// / wss:// ──▶ backend /data
//!     │        │
//!     │        └── QueryResponse (protocol/)
//!     │
//!     └── Renderer (render/) ── colorgram / gallery / experiments ──┘
//! ```

pub mod client;
pub mod config;
pub mod dom;
pub mod endpoint;
pub mod error;
pub mod page;
pub mod protocol;
pub mod render;
