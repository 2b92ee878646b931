//! Comment Gateway Library
//! Re-exports modules for testing and integration

pub mod config;
pub mod error;
pub mod logging;
pub mod pubsub;
pub mod schema;
pub mod server;
pub mod store;

pub use config::Config;
pub use error::{GatewayError, GatewayResult};
pub use pubsub::{PubSub, COMMENT_ADDED};
pub use schema::{build_schema, AppSchema};
pub use server::{ConnectionObserver, RunningServer};
pub use store::{Comment, CommentStore};
