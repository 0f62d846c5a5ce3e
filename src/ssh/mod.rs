// ABOUTME: SSH client module for remote host connections.
// ABOUTME: Key-based authentication with known_hosts verification; command exec and file upload.

mod client;
mod error;

pub use client::{CommandOutput, Session, SessionConfig};
pub use error::{Error, Result};
