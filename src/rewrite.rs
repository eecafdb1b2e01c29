use crate::config::ReverseConfig;
use crate::conn::Connection;
use crate::headers::HeaderLookup;
use crate::rewriters::ReverseRewriter;
use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::info;

/// Result of rewriting a request target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// No rule applied, the request proceeds as a forward proxy request
    Unchanged,
    /// Backend url the request has to be sent to
    Rewritten(String),
    /// The request was refused; the error is recorded on the connection
    HardFailure,
}

impl RewriteOutcome {
    pub fn rewritten_url(&self) -> Option<&str> {
        match self {
            RewriteOutcome::Rewritten(url) => Some(url),
            _ => None,
        }
    }
}

pub trait UrlRewriter: Send + Sync {
    fn rewrite(
        &self,
        conn: &mut Connection,
        headers: &dyn HeaderLookup,
        url: &str,
    ) -> RewriteOutcome;
}

/// Currently published rewriter, replaced wholesale on reload.
///
/// Requests take a snapshot with [`RewriterHandle::current`] and keep it
/// until they are done, so a registry is only dropped once the last request
/// that started under it has released its snapshot.
#[derive(Debug)]
pub struct RewriterHandle {
    current: ArcSwap<ReverseRewriter>,
}

impl RewriterHandle {
    pub fn new(rewriter: ReverseRewriter) -> Self {
        Self {
            current: ArcSwap::from_pointee(rewriter),
        }
    }

    pub fn current(&self) -> Arc<ReverseRewriter> {
        self.current.load_full()
    }

    /// Atomically replace the rewriter, returning the previous one
    pub fn publish(&self, rewriter: ReverseRewriter) -> Arc<ReverseRewriter> {
        self.current.swap(Arc::new(rewriter))
    }

    /// Build a fresh registry from configuration and publish it
    pub fn reload(&self, config: &ReverseConfig) -> Arc<ReverseRewriter> {
        let rewriter = ReverseRewriter::from_config(config);
        info!(
            "Publishing {} reverse proxy rules (reverse_only: {}, reverse_magic: {})",
            rewriter.registry().len(),
            config.reverse_only,
            config.reverse_magic
        );
        self.publish(rewriter)
    }
}

impl UrlRewriter for RewriterHandle {
    fn rewrite(
        &self,
        conn: &mut Connection,
        headers: &dyn HeaderLookup,
        url: &str,
    ) -> RewriteOutcome {
        self.current().rewrite(conn, headers, url)
    }
}

/// Type alias for the rewriter shared across connections
pub type SharedRewriter = Arc<RewriterHandle>;

/// Create a new shared rewriter from the reverse proxy configuration
pub fn create_rewriter(config: &ReverseConfig) -> SharedRewriter {
    Arc::new(RewriterHandle::new(ReverseRewriter::from_config(config)))
}
