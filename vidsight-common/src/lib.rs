//! # VidSight Common Library
//!
//! Shared code for the VidSight services including:
//! - Error types
//! - Progress event types and the session-keyed progress registry
//! - SSE stream construction for progress subscribers
//! - Configuration file resolution

pub mod config;
pub mod error;
pub mod events;
pub mod session;
pub mod sse;

pub use error::{Error, Result};
pub use events::{ChannelMessage, ProgressEvent};
pub use session::{ProgressSubscription, SessionRegistry};
