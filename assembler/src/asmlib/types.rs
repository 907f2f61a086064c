use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::io::Error as IoError;
use std::path::PathBuf;

use super::diagnostics::ErrorList;

/// Source line numbers count from 1.
pub type LineNumber = u32;

/// Longest permitted source line, not counting the line terminator.
pub(crate) const MAX_LINE_LENGTH: usize = 80;

/// Longest permitted label or macro name.
pub(crate) const MAX_SYMBOL_LENGTH: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoAction {
    Read,
    Write,
    Rename,
    Remove,
}

impl Display for IoAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IoAction::Read => "read",
            IoAction::Write => "write",
            IoAction::Rename => "rename",
            IoAction::Remove => "remove",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoTarget {
    File(PathBuf),
    Directory(PathBuf),
    Stdout,
}

impl Display for IoTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            IoTarget::File(path) => write!(f, "file {}", path.display()),
            IoTarget::Directory(path) => write!(f, "directory {}", path.display()),
            IoTarget::Stdout => f.write_str("standard output"),
        }
    }
}

#[derive(Debug)]
pub struct IoFailed {
    pub action: IoAction,
    pub target: IoTarget,
    pub error: IoError,
}

impl Display for IoFailed {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let IoFailed {
            action,
            target,
            error,
        } = self;
        write!(f, "failed to {action} {target}: {error}")
    }
}

#[derive(Debug)]
pub enum AssemblerFailure {
    /// We could not read the input or write an output file.
    Io(IoFailed),
    /// The source program contains errors; none of the output
    /// artifacts were written.
    Rejected { file: String, errors: ErrorList },
}

impl Display for AssemblerFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            AssemblerFailure::Io(e) => write!(f, "I/O error: {e}"),
            AssemblerFailure::Rejected { file, errors } => {
                let count = errors.count();
                if errors.has_fatal() {
                    write!(f, "{file}: translation aborted")?;
                } else {
                    write!(f, "{file}: translation failed")?;
                }
                write!(
                    f,
                    " with {count} error{}",
                    if count == 1 { "" } else { "s" }
                )
            }
        }
    }
}

impl Error for AssemblerFailure {}
