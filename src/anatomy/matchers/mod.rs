//! Pattern matchers: resolve a declarative pattern to a set of slot ids.
//!
//! Matchers only read the skeleton and hand back ids, never slot objects.
//! An empty result is not an error here; whether it deserves a warning is up
//! to the caller, which knows if the binding was optional.

mod group;
mod property;
mod wildcard;

pub use group::resolve_group;
pub use property::{resolve_filters, resolve_properties};
pub use wildcard::{resolve_wildcard, Glob};

use std::collections::BTreeSet;

use super::graph::SlotSkeleton;
use crate::blueprints::Pattern;
use crate::core::{Result, SlotId};

/// Resolve any pattern against a skeleton
pub fn resolve(pattern: &Pattern, skeleton: &SlotSkeleton) -> Result<BTreeSet<SlotId>> {
    match pattern {
        Pattern::Group(name) => resolve_group(name, skeleton),
        Pattern::Wildcard(glob) => resolve_wildcard(glob, skeleton),
        Pattern::PropertyFilter(filters) => resolve_properties(filters, skeleton),
    }
}
