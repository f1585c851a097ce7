// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP boundary for the MyAI assistant.
//!
//! Each route decodes its request into an envelope, hands it to the shared
//! [`myai_agent::AgentSession`] or [`myai_agent::CaptionSession`], and maps
//! the outcome to JSON. Client errors become 400, generation timeouts 504,
//! and collaborator failures 500, all with an `{"error": ...}` body.

pub mod handlers;
pub mod server;

pub use handlers::{ApiError, ErrorResponse, HealthResponse};
pub use server::{router, start_server, GatewayState, RouteTable, ServerConfig};
