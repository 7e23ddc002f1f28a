//! Group matcher: slots tagged with a template group

use std::collections::BTreeSet;

use crate::anatomy::graph::SlotSkeleton;
use crate::core::{AnatomyError, Result, SlotId};

/// All slots carrying the group tag.
///
/// The name must be declared by the skeleton (a limb set, a template group or
/// an authored slot group); a declared group may legitimately be empty.
pub fn resolve_group(name: &str, skeleton: &SlotSkeleton) -> Result<BTreeSet<SlotId>> {
    if !skeleton.has_group(name) {
        return Err(AnatomyError::UnknownGroup(name.to_string()));
    }
    Ok(skeleton
        .slots()
        .iter()
        .filter(|slot| slot.groups.contains(name))
        .map(|slot| slot.id.clone())
        .collect())
}
