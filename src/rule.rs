use std::fmt;

/// Scheme separator every backend url has to contain
pub const SCHEME_SEPARATOR: &str = "://";

/// What part of the request selects a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discriminator {
    /// Request path prefix, always starts with `/`
    Path(String),
    /// `Host` header prefix, never empty
    Host(String),
}

impl Discriminator {
    pub fn as_str(&self) -> &str {
        match self {
            Discriminator::Path(path) => path,
            Discriminator::Host(host) => host,
        }
    }
}

/// One reverse proxy mapping, immutable once created.
///
/// Rules are only constructed by the registry, after the path/host and
/// the backend url have been validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    discriminator: Discriminator,
    target: String,
}

impl Rule {
    pub(crate) fn new(discriminator: Discriminator, target: String) -> Self {
        Self {
            discriminator,
            target,
        }
    }

    pub fn discriminator(&self) -> &Discriminator {
        &self.discriminator
    }

    /// Backend base url, e.g. `http://backend/`
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn path(&self) -> Option<&str> {
        match &self.discriminator {
            Discriminator::Path(path) => Some(path),
            Discriminator::Host(_) => None,
        }
    }

    pub fn host(&self) -> Option<&str> {
        match &self.discriminator {
            Discriminator::Host(host) => Some(host),
            Discriminator::Path(_) => None,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.discriminator.as_str(), self.target)
    }
}
