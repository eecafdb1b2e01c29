//! Prefix lookups over a [`Registry`].
//!
//! Both lookups are byte-exact prefix tests starting at offset 0 and are not
//! aware of host labels or path segments: a rule for `example` matches the
//! host `example.com`, a rule for `/api` matches `/apiary`.

use crate::registry::Registry;
use crate::rule::Rule;

/// First rule whose host is a prefix of `host`
pub fn match_by_host<'a>(host: &str, registry: &'a Registry) -> Option<&'a Rule> {
    registry.find(|rule| rule.host().is_some_and(|prefix| host.starts_with(prefix)))
}

/// First rule whose path is a prefix of `url`
pub fn match_by_path<'a>(url: &str, registry: &'a Registry) -> Option<&'a Rule> {
    registry.find(|rule| rule.path().is_some_and(|prefix| url.starts_with(prefix)))
}
