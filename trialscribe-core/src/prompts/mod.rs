//! Prompt construction for protocol generation and follow-up queries

pub mod protocol;
pub mod query;

pub use protocol::build_protocol_prompt;
pub use query::{build_query_context, format_query_response};
