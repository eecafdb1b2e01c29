use crate::config::RuleConfig;
use crate::error::RuleError;
use crate::rule::{Discriminator, Rule, SCHEME_SEPARATOR};
use tracing::{info, warn};

/// Ordered set of reverse proxy rules.
///
/// Rules are appended in configuration order and scanned newest first, so
/// when two discriminators overlap the rule declared later wins. A
/// registry is never modified once it has been handed to a rewriter; a
/// reload builds a new one instead.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    rules: Vec<Rule>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from configured rules, dropping the invalid ones
    pub fn from_config(rules: &[RuleConfig]) -> Self {
        let mut registry = Self::new();
        for rule in rules {
            match (rule.path.as_deref(), rule.host.as_deref()) {
                (Some(path), Some(host)) => {
                    let err = RuleError::AmbiguousDiscriminator {
                        path: path.to_string(),
                        host: host.to_string(),
                    };
                    warn!("{}", err);
                }
                (path, None) => registry.add_path_rule(path, rule.url.as_deref()),
                (None, host) => registry.add_host_rule(host, rule.url.as_deref()),
            }
        }
        registry
    }

    /// Add a path rule; invalid rules are logged and discarded
    pub fn add_path_rule(&mut self, path: Option<&str>, url: Option<&str>) {
        if let Err(e) = self.try_add_path_rule(path, url) {
            warn!("{}", e);
        }
    }

    /// Add a host rule; invalid rules are logged and discarded
    pub fn add_host_rule(&mut self, host: Option<&str>, url: Option<&str>) {
        if let Err(e) = self.try_add_host_rule(host, url) {
            warn!("{}", e);
        }
    }

    /// Add a path rule, reporting why it was rejected
    ///
    /// A missing path defaults to `/`, which matches every request.
    pub fn try_add_path_rule(
        &mut self,
        path: Option<&str>,
        url: Option<&str>,
    ) -> Result<(), RuleError> {
        let url = validate_url(url)?;
        let path = match path {
            Some(path) if !path.starts_with('/') => {
                return Err(RuleError::PathWithoutSlash {
                    path: path.to_string(),
                });
            }
            Some(path) => path,
            None => "/",
        };

        self.push(Rule::new(
            Discriminator::Path(path.to_string()),
            url.to_string(),
        ));
        Ok(())
    }

    /// Add a host rule, reporting why it was rejected
    pub fn try_add_host_rule(
        &mut self,
        host: Option<&str>,
        url: Option<&str>,
    ) -> Result<(), RuleError> {
        let url = validate_url(url)?;
        let host = match host {
            Some(host) if !host.is_empty() => host,
            _ => return Err(RuleError::MissingHost),
        };

        self.push(Rule::new(
            Discriminator::Host(host.to_string()),
            url.to_string(),
        ));
        Ok(())
    }

    fn push(&mut self, rule: Rule) {
        info!("Added reverse proxy rule: {}", rule);
        self.rules.push(rule);
    }

    /// First rule in match order satisfying the predicate
    pub fn find<P>(&self, mut predicate: P) -> Option<&Rule>
    where
        P: FnMut(&Rule) -> bool,
    {
        self.iter().find(|rule| predicate(rule))
    }

    /// Rules in match order, most recently added first
    pub fn iter(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Drop every rule, returning how many were released
    pub fn release(self) -> usize {
        let count = self.rules.len();
        drop(self.rules);
        count
    }
}

fn validate_url(url: Option<&str>) -> Result<&str, RuleError> {
    match url {
        None => Err(RuleError::MissingUrl),
        Some(url) if url.is_empty() => Err(RuleError::MissingUrl),
        Some(url) if !url.contains(SCHEME_SEPARATOR) => Err(RuleError::InvalidUrl {
            url: url.to_string(),
        }),
        Some(url) => Ok(url),
    }
}

