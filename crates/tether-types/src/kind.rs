use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The kind of VCL object a wrapper stands for.
///
/// The kind drives every branch of the release path, so it is a closed set.
/// [`HandleKind::Object`] is the generic object kind: callers may pass it when
/// they only know they hold *some* object, and the wrap path refines it to
/// one of the four concrete object kinds when the VCL can classify the
/// pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleKind {
    /// A repository. The root of the ownership graph.
    Repository,
    /// A reference, owned by its repository.
    Reference,
    /// A commit object, owned by its repository.
    Commit,
    /// A tree object, owned by its repository.
    Tree,
    /// A blob object, owned by its repository.
    Blob,
    /// An annotated tag object, owned by its repository.
    Tag,
    /// An object whose concrete type was not recognised.
    Object,
    /// Not one of ours. Never freed on the VCL side.
    Unknown,
}

/// How a child wrapper reaches the wrapper of its owning repository.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OwnerEdge {
    /// The owner is found through the VCL's object-owner accessor.
    ObjectOwner,
    /// The owner is found through the VCL's reference-owner accessor.
    ReferenceOwner,
}

impl HandleKind {
    /// Every kind, in declaration order.
    pub const ALL: [HandleKind; 8] = [
        Self::Repository,
        Self::Reference,
        Self::Commit,
        Self::Tree,
        Self::Blob,
        Self::Tag,
        Self::Object,
        Self::Unknown,
    ];

    /// Returns `true` for the object kinds: commit, tree, blob, tag and the
    /// generic object kind.
    pub fn is_object(&self) -> bool {
        matches!(
            self,
            Self::Commit | Self::Tree | Self::Blob | Self::Tag | Self::Object
        )
    }

    /// The ownership edge from a wrapper of this kind to its repository.
    ///
    /// Repositories are roots, and unknown wrappers are never linked to
    /// anything.
    pub fn owner_edge(&self) -> Option<OwnerEdge> {
        match self {
            Self::Commit | Self::Tree | Self::Blob | Self::Tag | Self::Object => {
                Some(OwnerEdge::ObjectOwner)
            }
            Self::Reference => Some(OwnerEdge::ReferenceOwner),
            Self::Repository | Self::Unknown => None,
        }
    }

    /// Stable lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Repository => "repository",
            Self::Reference => "reference",
            Self::Commit => "commit",
            Self::Tree => "tree",
            Self::Blob => "blob",
            Self::Tag => "tag",
            Self::Object => "object",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HandleKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| TypeError::UnknownKind(s.to_string()))
    }
}
