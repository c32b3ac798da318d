//! Hit Detector.
//!
//! Linear scan of a set's ways for a valid way holding the resolved tag.

use super::tag_store::TagStore;
use crate::common::InvariantViolation;

/// Finds the way of `set` holding `tag`.
///
/// # Errors
///
/// Returns [`InvariantViolation::DuplicateTag`] if more than one valid way
/// holds `tag`; the commit logic must never allow that.
pub fn find(tags: &TagStore, set: usize, tag: u64) -> Result<Option<usize>, InvariantViolation> {
    let mut found = None;
    for (way, meta) in tags.set(set).iter().enumerate() {
        if !(meta.valid && meta.tag == tag) {
            continue;
        }
        if let Some(first) = found {
            return Err(InvariantViolation::DuplicateTag {
                set,
                tag,
                first,
                second: way,
            });
        }
        found = Some(way);
    }
    Ok(found)
}
