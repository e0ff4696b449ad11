use std::fmt;

use crate::kind::HandleKind;

/// The VCL's dynamic classification of an object pointer.
///
/// Codes follow libgit2's `git_object_t`. Codes the VCL may grow in the
/// future are preserved in [`ObjectType::Other`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectType {
    /// Wildcard used by lookups; never the type of a live object.
    Any,
    /// The pointer is not a valid object.
    Invalid,
    Commit,
    Tree,
    Blob,
    Tag,
    /// Pack-internal delta against an offset.
    OffsetDelta,
    /// Pack-internal delta against an object id.
    RefDelta,
    Other(i32),
}

impl ObjectType {
    /// Decode a raw VCL type code.
    pub fn from_raw(code: i32) -> Self {
        match code {
            -2 => Self::Any,
            -1 => Self::Invalid,
            1 => Self::Commit,
            2 => Self::Tree,
            3 => Self::Blob,
            4 => Self::Tag,
            6 => Self::OffsetDelta,
            7 => Self::RefDelta,
            other => Self::Other(other),
        }
    }

    /// The raw VCL type code.
    pub fn to_raw(self) -> i32 {
        match self {
            Self::Any => -2,
            Self::Invalid => -1,
            Self::Commit => 1,
            Self::Tree => 2,
            Self::Blob => 3,
            Self::Tag => 4,
            Self::OffsetDelta => 6,
            Self::RefDelta => 7,
            Self::Other(code) => code,
        }
    }

    /// The concrete handle kind for this object type, if there is one.
    ///
    /// Only commits, trees, blobs and tags have a concrete kind; everything
    /// else stays [`HandleKind::Object`] when wrapped.
    pub fn handle_kind(self) -> Option<HandleKind> {
        match self {
            Self::Commit => Some(HandleKind::Commit),
            Self::Tree => Some(HandleKind::Tree),
            Self::Blob => Some(HandleKind::Blob),
            Self::Tag => Some(HandleKind::Tag),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Invalid => write!(f, "invalid"),
            Self::Commit => write!(f, "commit"),
            Self::Tree => write!(f, "tree"),
            Self::Blob => write!(f, "blob"),
            Self::Tag => write!(f, "tag"),
            Self::OffsetDelta => write!(f, "ofs-delta"),
            Self::RefDelta => write!(f, "ref-delta"),
            Self::Other(code) => write!(f, "other({code})"),
        }
    }
}
