pub mod cache;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod fetch;
pub mod github;
pub mod model;
pub mod project;
pub mod resolver;
pub mod source;

mod api;

pub use api::{LockMode, Sourcefetch, SourcefetchBuilder};
