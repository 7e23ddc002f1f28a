//! Property matcher: slots satisfying every key/value filter

use std::collections::{BTreeMap, BTreeSet};

use crate::anatomy::graph::{Slot, SlotSkeleton};
use crate::core::{AnatomyError, Result, SlotId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A filter key resolved against the skeleton
enum FilterKey<'a> {
    SlotType,
    Orientation,
    Socket,
    Parent,
    Group,
    Cardinality,
    Declared(&'a str),
}

impl<'a> FilterKey<'a> {
    fn recognize(key: &'a str, skeleton: &SlotSkeleton) -> Result<Self> {
        let key = match key {
            "slot_type" | "slotType" | "part_type" | "partType" => FilterKey::SlotType,
            "orientation" => FilterKey::Orientation,
            "socket_id" | "socketId" => FilterKey::Socket,
            "parent" => FilterKey::Parent,
            "group" => FilterKey::Group,
            "cardinality" => FilterKey::Cardinality,
            other => {
                let declared = skeleton
                    .slots()
                    .iter()
                    .any(|slot| slot.properties.contains_key(other));
                if !declared {
                    return Err(AnatomyError::UnknownFilterKey(other.to_string()));
                }
                FilterKey::Declared(other)
            }
        };
        Ok(key)
    }

    fn accepts(self, slot: &Slot, value: &str) -> bool {
        match self {
            FilterKey::SlotType => slot.part_type == value,
            FilterKey::Orientation => slot.orientation.as_deref() == Some(value),
            FilterKey::Socket => slot.socket == value,
            FilterKey::Parent => match &slot.parent {
                Some(parent) => parent == value,
                None => value == "root",
            },
            FilterKey::Group => slot.groups.contains(value),
            FilterKey::Cardinality => {
                let name = if slot.is_required() { "required" } else { "optional" };
                name == value
            }
            FilterKey::Declared(key) => slot.properties.get(key).map(String::as_str) == Some(value),
        }
    }
}

/// Resolve a filter map (the document form)
pub fn resolve_properties(
    filters: &BTreeMap<String, String>,
    skeleton: &SlotSkeleton,
) -> Result<BTreeSet<SlotId>> {
    let pairs: Vec<(&str, &str)> = filters
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    resolve_filters(&pairs, skeleton)
}

/// Resolve filters given in any order; the result is the intersection of the
/// per-key matches, so the order never matters.
pub fn resolve_filters(filters: &[(&str, &str)], skeleton: &SlotSkeleton) -> Result<BTreeSet<SlotId>> {
    if filters.is_empty() {
        return Err(AnatomyError::EmptyPropertyFilter);
    }

    let keys = filters
        .iter()
        .map(|(key, value)| Ok((FilterKey::recognize(key, skeleton)?, *value)))
        .collect::<Result<Vec<_>>>()?;

    let mut result: Option<BTreeSet<SlotId>> = None;
    for (key, value) in keys {
        let matching: BTreeSet<SlotId> = skeleton
            .slots()
            .iter()
            .filter(|slot| key.accepts(slot, value))
            .map(|slot| slot.id.clone())
            .collect();
        result = Some(match result {
            Some(acc) => acc.intersection(&matching).cloned().collect(),
            None => matching,
        });
    }
    Ok(result.unwrap_or_default())
}
