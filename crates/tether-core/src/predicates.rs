//! Predicate symbols named in type errors.
//!
//! When a handle has the wrong kind, the host is told which predicate the
//! value failed, so users see e.g. `(wrong-type-argument git-commit-p ...)`.

use tether_types::HandleKind;

pub const REPOSITORY_P: &str = "git-repository-p";
pub const REFERENCE_P: &str = "git-reference-p";
pub const COMMIT_P: &str = "git-commit-p";
pub const TREE_P: &str = "git-tree-p";
pub const BLOB_P: &str = "git-blob-p";
pub const TAG_P: &str = "git-tag-p";
pub const OBJECT_P: &str = "git-object-p";

/// The predicate a value of `kind` satisfies, if it has one.
pub fn predicate_for(kind: HandleKind) -> Option<&'static str> {
    match kind {
        HandleKind::Repository => Some(REPOSITORY_P),
        HandleKind::Reference => Some(REFERENCE_P),
        HandleKind::Commit => Some(COMMIT_P),
        HandleKind::Tree => Some(TREE_P),
        HandleKind::Blob => Some(BLOB_P),
        HandleKind::Tag => Some(TAG_P),
        HandleKind::Object => Some(OBJECT_P),
        HandleKind::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_kind_has_a_distinct_predicate() {
        let mut seen: Vec<&str> = HandleKind::ALL
            .into_iter()
            .filter_map(predicate_for)
            .collect();
        assert_eq!(seen.len(), 7);
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 7);
        assert_eq!(predicate_for(HandleKind::Unknown), None);
    }
}
