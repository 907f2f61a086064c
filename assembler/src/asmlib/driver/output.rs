//! Rendering and writing the output files.
//!
//! Every output is first written to a temporary file in the directory
//! where it belongs.  Only once all outputs have been written
//! successfully are they renamed into place.
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{event, span, Level};

use base::prelude::{address_to_base4, encode_base4, word_to_base4, ADDRESS_DIGITS};

use super::super::symtab::SymbolTable;
use super::super::types::{AssemblerFailure, IoAction, IoFailed, IoTarget};
use super::Binary;

pub(crate) const SOURCE_EXTENSION: &str = "as";
pub(crate) const EXPANDED_EXTENSION: &str = "am";
pub(crate) const OBJECT_EXTENSION: &str = "ob";
pub(crate) const ENTRIES_EXTENSION: &str = "ent";
pub(crate) const EXTERNS_EXTENSION: &str = "ext";

fn size_field(n: usize) -> String {
    u32::try_from(n)
        .ok()
        .and_then(|n| encode_base4(n, ADDRESS_DIGITS).ok())
        .expect("program size was checked against the memory size")
}

/// The object file: a header giving the code and data sizes, then one
/// line per memory cell.
pub fn render_object(binary: &Binary) -> String {
    let header = format!(
        "{} {}\n",
        size_field(binary.code.len()),
        size_field(binary.data.len())
    );
    std::iter::once(header)
        .chain(binary.cells().map(|(address, word)| {
            format!(
                "{} {}\n",
                address_to_base4(address),
                word_to_base4(word.bits())
            )
        }))
        .collect()
}

/// The entries file, or `None` if there are no entry symbols.
pub fn render_entries(symtab: &SymbolTable) -> Option<String> {
    let entries = symtab.entries();
    if entries.is_empty() {
        return None;
    }
    Some(
        entries
            .iter()
            .map(|sym| format!("{} {}\n", sym.name, address_to_base4(sym.address)))
            .collect(),
    )
}

/// The externals file, or `None` if no external symbol is used.
pub fn render_externs(binary: &Binary) -> Option<String> {
    if binary.externs.is_empty() {
        return None;
    }
    Some(
        binary
            .externs
            .iter()
            .map(|r| format!("{} {}\n", r.name, address_to_base4(r.address)))
            .collect(),
    )
}

/// The names of the files produced for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OutputPaths {
    pub(crate) expanded: PathBuf,
    pub(crate) object: PathBuf,
    pub(crate) entries: PathBuf,
    pub(crate) externs: PathBuf,
}

impl OutputPaths {
    pub(crate) fn for_source(source: &Path) -> OutputPaths {
        OutputPaths {
            expanded: source.with_extension(EXPANDED_EXTENSION),
            object: source.with_extension(OBJECT_EXTENSION),
            entries: source.with_extension(ENTRIES_EXTENSION),
            externs: source.with_extension(EXTERNS_EXTENSION),
        }
    }
}

fn directory_of(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Write `contents` into a new temporary file next to `path`.
fn stage(path: &Path, contents: &str) -> Result<NamedTempFile, AssemblerFailure> {
    let dir = directory_of(path);
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| {
        AssemblerFailure::Io(IoFailed {
            action: IoAction::Write,
            target: IoTarget::Directory(dir.to_path_buf()),
            error: e,
        })
    })?;
    let mut inner = || -> Result<(), std::io::Error> {
        temp.write_all(contents.as_bytes())?;
        temp.flush()
    };
    inner().map_err(|e| {
        AssemblerFailure::Io(IoFailed {
            action: IoAction::Write,
            target: IoTarget::File(temp.path().to_path_buf()),
            error: e,
        })
    })?;
    Ok(temp)
}

fn persist(temp: NamedTempFile, path: &Path) -> Result<(), AssemblerFailure> {
    temp.persist(path).map_err(|e| {
        AssemblerFailure::Io(IoFailed {
            action: IoAction::Rename,
            target: IoTarget::File(path.to_path_buf()),
            error: e.error,
        })
    })?;
    event!(Level::DEBUG, "wrote {}", path.display());
    Ok(())
}

/// Write a single file.
pub(crate) fn write_file(path: &Path, contents: &str) -> Result<(), AssemblerFailure> {
    persist(stage(path, contents)?, path)
}

/// Remove `path` if it exists.
pub(crate) fn remove_stale(path: &Path) -> Result<(), AssemblerFailure> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            event!(Level::DEBUG, "removed stale output {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
        Err(e) => Err(AssemblerFailure::Io(IoFailed {
            action: IoAction::Remove,
            target: IoTarget::File(path.to_path_buf()),
            error: e,
        })),
    }
}

/// Remove every output a translation of this source could have
/// produced, apart from the expanded source.
pub(crate) fn remove_outputs(paths: &OutputPaths) -> Result<(), AssemblerFailure> {
    for path in [&paths.object, &paths.entries, &paths.externs] {
        remove_stale(path)?;
    }
    Ok(())
}

/// Write the object, entries and externals files.  Nothing is renamed
/// into place until every file has been written.  An entries or
/// externals file left over from an earlier run is removed when this
/// program has no entries or externals.
pub(crate) fn write_outputs(
    paths: &OutputPaths,
    binary: &Binary,
    symtab: &SymbolTable,
) -> Result<(), AssemblerFailure> {
    let span = span!(Level::ERROR, "write outputs", object=?paths.object);
    let _enter = span.enter();

    let object = stage(&paths.object, &render_object(binary))?;
    let entries = render_entries(symtab)
        .map(|text| stage(&paths.entries, &text))
        .transpose()?;
    let externs = render_externs(binary)
        .map(|text| stage(&paths.externs, &text))
        .transpose()?;

    persist(object, &paths.object)?;
    for (staged, path) in [(entries, &paths.entries), (externs, &paths.externs)] {
        match staged {
            Some(temp) => persist(temp, path)?,
            None => remove_stale(path)?,
        }
    }
    Ok(())
}
