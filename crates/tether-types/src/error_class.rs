use std::fmt;

use serde::{Deserialize, Serialize};

/// Class names indexed by the VCL's error class code (libgit2 `git_error_t`).
const CLASS_NAMES: [&str; 36] = [
    "none",
    "nomemory",
    "os",
    "invalid",
    "reference",
    "zlib",
    "repository",
    "config",
    "regex",
    "odb",
    "index",
    "object",
    "net",
    "tag",
    "tree",
    "indexer",
    "ssl",
    "submodule",
    "thread",
    "stash",
    "checkout",
    "fetchhead",
    "merge",
    "ssh",
    "filter",
    "revert",
    "callback",
    "cherrypick",
    "describe",
    "rebase",
    "filesystem",
    "patch",
    "worktree",
    "sha",
    "http",
    "internal",
];

/// Root of the error symbols signalled to the host.
const SIGNAL_ROOT: &str = "giterr";

/// The class of a VCL error, as reported in its last-error record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorClass(i32);

impl ErrorClass {
    pub const NONE: Self = Self(0);
    pub const NOMEMORY: Self = Self(1);
    pub const OS: Self = Self(2);
    pub const INVALID: Self = Self(3);
    pub const REFERENCE: Self = Self(4);
    pub const REPOSITORY: Self = Self(6);
    pub const OBJECT: Self = Self(11);
    pub const NET: Self = Self(12);

    pub fn from_raw(code: i32) -> Self {
        Self(code)
    }

    pub fn to_raw(self) -> i32 {
        self.0
    }

    /// The class name, or `None` for codes this build does not know.
    pub fn name(self) -> Option<&'static str> {
        usize::try_from(self.0)
            .ok()
            .and_then(|idx| CLASS_NAMES.get(idx).copied())
    }

    /// The error symbol the host is signalled with for this class.
    ///
    /// Known classes get `giterr-<name>`; the `none` class and unknown codes
    /// fall back to the root symbol `giterr`.
    pub fn signal_symbol(self) -> String {
        match self.name() {
            Some(name) if self != Self::NONE => format!("{SIGNAL_ROOT}-{name}"),
            _ => SIGNAL_ROOT.to_string(),
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "class({})", self.0),
        }
    }
}

/// The VCL's last-error record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VclError {
    pub class: ErrorClass,
    pub message: String,
}

impl VclError {
    pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
        }
    }
}

impl fmt::Display for VclError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class, self.message)
    }
}
