pub mod action;
pub mod args;
pub mod cli;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod feed;
pub mod normalize;
pub mod query;
pub mod refresh;

pub use action::{on_failure, on_success, ActionResult};
pub use client::{ApiClient, Method, Request};
pub use config::{resolve_config, ClientConfig};
pub use credentials::{
    CredentialStore, Credentials, FileCredentialStore, MemoryCredentialStore,
};
pub use error::ApiError;
pub use feed::{parse_feed, FeedItem, Offer, Post, User};
pub use normalize::{normalize, parse_error, parse_error_value, Failure, NormalizedResult};
pub use query::object_to_get_params;
pub use refresh::{RefreshCoordinator, RefreshOutcome};
