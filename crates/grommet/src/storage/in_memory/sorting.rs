//! Ordering for issue listings.

use crate::domain::Issue;

/// Sort issues most recently updated first.
///
/// Issue ID is the tiebreaker so that records with identical `updated_at`
/// (imported data, coarse clocks) still list in a stable, reproducible order.
pub(super) fn sort_by_recent_update(issues: &mut [Issue]) {
    issues.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
}
