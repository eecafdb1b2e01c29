pub mod app;
pub mod config;
pub mod conn;
pub mod error;
pub mod headers;
pub mod html_error;
pub mod logging;
pub mod matcher;
pub mod metrics;
pub mod proxy;
pub mod readers;
pub mod registry;
pub mod rewrite;
pub mod rewriters;
pub mod rule;
pub mod server;
pub mod upstream;

// Re-export commonly used types for convenience
pub use config::{AppConfig, ReverseConfig, RuleConfig};
pub use conn::{Connection, REVERSE_COOKIE};
pub use registry::Registry;
pub use rewrite::{RewriteOutcome, SharedRewriter, UrlRewriter};
pub use rewriters::ReverseRewriter;
pub use rule::{Discriminator, Rule};
