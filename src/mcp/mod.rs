//! Line-delimited JSON-RPC server exposing the conversion as a tool

pub mod protocol;
mod server;
mod tools;

pub use protocol::{Request, Response, RpcError};
pub use server::Server;
pub use tools::{CREATE_RTF_DOCUMENT, CreateOutcome, ToolError, Tools};
