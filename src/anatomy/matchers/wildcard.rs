//! Wildcard matcher: `*` globs over slot ids

use std::collections::BTreeSet;

use crate::anatomy::graph::SlotSkeleton;
use crate::core::{AnatomyError, Result, SlotId};

/// A compiled glob; `*` matches any run of characters, including none
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glob {
    /// Literal pieces between the stars, always at least two
    pieces: Vec<String>,
}

impl Glob {
    /// Compile a glob, rejecting globs without a `*`
    pub fn new(glob: &str) -> Result<Self> {
        if !glob.contains('*') {
            return Err(AnatomyError::DegenerateWildcard(glob.to_string()));
        }
        Ok(Self {
            pieces: glob.split('*').map(str::to_string).collect(),
        })
    }

    pub fn matches(&self, text: &str) -> bool {
        let (first, rest) = match self.pieces.split_first() {
            Some(split) => split,
            None => return false,
        };
        let (last, middle) = match rest.split_last() {
            Some(split) => split,
            None => return text == first,
        };

        if !text.starts_with(first.as_str()) {
            return false;
        }
        let mut pos = first.len();
        for piece in middle {
            match text[pos..].find(piece.as_str()) {
                Some(found) => pos += found + piece.len(),
                None => return false,
            }
        }
        text.len() - pos >= last.len() && text.ends_with(last.as_str())
    }
}

/// All slot ids the glob matches
pub fn resolve_wildcard(glob: &str, skeleton: &SlotSkeleton) -> Result<BTreeSet<SlotId>> {
    let glob = Glob::new(glob)?;
    Ok(skeleton
        .slot_ids()
        .filter(|id| glob.matches(id))
        .map(str::to_string)
        .collect())
}
