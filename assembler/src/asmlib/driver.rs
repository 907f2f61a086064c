//! Drives the translation of a source file through preprocessing,
//! the two passes and output.
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::{event, span, Level};

use super::diagnostics::{ErrorList, Stage};
use super::listing::{Listing, ListingWithSymbols};
use super::macros::MacroTable;
use super::preprocess::{preprocess, ExpandedSource};
use super::symtab::SymbolTable;
use super::types::{AssemblerFailure, IoAction, IoFailed, IoTarget};

mod output;
mod pass1;
mod pass2;

#[cfg(test)]
mod tests;

pub use output::{render_entries, render_externs, render_object};
pub use pass2::{Binary, ExternReference};

use output::{remove_outputs, write_file, write_outputs, OutputPaths, SOURCE_EXTENSION};
use pass1::first_pass;
use pass2::second_pass;

/// Controls which outputs [`assemble_file`] produces besides the
/// object, entries and externals files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputOptions {
    /// Print a listing on standard output.
    pub list: bool,
    /// Write the macro-expanded source (the `.am` file).
    pub write_expanded: bool,
}

impl Default for OutputOptions {
    fn default() -> OutputOptions {
        OutputOptions {
            list: false,
            write_expanded: true,
        }
    }
}

/// The result of a successful translation.
#[derive(Debug)]
pub struct Translation {
    expanded: ExpandedSource,
    symtab: SymbolTable,
    binary: Binary,
    listing: Listing,
    /// Any notes recorded along the way; there are no errors.
    diagnostics: ErrorList,
}

impl Translation {
    pub fn expanded(&self) -> &ExpandedSource {
        &self.expanded
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symtab
    }

    pub fn binary(&self) -> &Binary {
        &self.binary
    }

    pub fn diagnostics(&self) -> &ErrorList {
        &self.diagnostics
    }

    /// The assembly listing followed by the symbol table.
    pub fn listing(&self) -> String {
        ListingWithSymbols {
            listing: &self.listing,
            symtab: &self.symtab,
        }
        .to_string()
    }
}

fn reject(errors: ErrorList) -> AssemblerFailure {
    AssemblerFailure::Rejected {
        file: errors.file_name().to_string(),
        errors,
    }
}

/// The source text after macro expansion, with the macro table
/// which was built along the way.
#[derive(Debug)]
pub struct Preprocessed {
    pub expanded: ExpandedSource,
    pub macros: MacroTable,
    errors: ErrorList,
}

/// Expand the macros in the source text read from `reader`.
///
/// # Errors
///
/// Fails if the source contains any error in its macro definitions
/// or calls; then there is no point continuing to the first pass.
pub fn preprocess_source<R: BufRead>(
    reader: R,
    file_name: &str,
) -> Result<Preprocessed, AssemblerFailure> {
    let span = span!(Level::ERROR, "preprocess");
    let _enter = span.enter();
    let mut errors = ErrorList::new(file_name);
    errors.set_stage(Stage::Preprocessor);
    let mut macros = MacroTable::new();
    let expanded = preprocess(reader, &mut macros, &mut errors);
    if errors.count() > 0 {
        return Err(reject(errors));
    }
    event!(
        Level::DEBUG,
        "{} macros, {} expanded lines",
        macros.len(),
        expanded.len()
    );
    Ok(Preprocessed {
        expanded,
        macros,
        errors,
    })
}

/// Run both passes over an expanded source.
///
/// # Errors
///
/// Fails if either pass recorded an error.  Both passes run (unless
/// there was a fatal problem) so that all errors are reported
/// together.
pub fn assemble_expanded(preprocessed: Preprocessed) -> Result<Translation, AssemblerFailure> {
    let Preprocessed {
        expanded,
        macros,
        mut errors,
    } = preprocessed;
    let mut symtab = SymbolTable::new();
    let counters = first_pass(&expanded, &macros, &mut symtab, &mut errors);
    if errors.has_fatal() {
        return Err(reject(errors));
    }
    let (binary, listing) = second_pass(&expanded, &macros, &mut symtab, counters, &mut errors);
    if errors.count() > 0 {
        return Err(reject(errors));
    }
    Ok(Translation {
        expanded,
        symtab,
        binary,
        listing,
        diagnostics: errors,
    })
}

/// Translate source text without touching the file system.
///
/// # Errors
///
/// Fails if the source contains any error.
pub fn translate<R: BufRead>(reader: R, file_name: &str) -> Result<Translation, AssemblerFailure> {
    assemble_expanded(preprocess_source(reader, file_name)?)
}

/// The source file named on the command line.  A name without an
/// extension gets `.as`.
pub fn source_path(arg: &Path) -> PathBuf {
    if arg.extension().is_some() {
        arg.to_path_buf()
    } else {
        arg.with_extension(SOURCE_EXTENSION)
    }
}

fn print_listing(translation: &Translation) -> Result<(), AssemblerFailure> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(translation.listing().as_bytes())
        .and_then(|()| handle.flush())
        .map_err(|e| {
            AssemblerFailure::Io(IoFailed {
                action: IoAction::Write,
                target: IoTarget::Stdout,
                error: e,
            })
        })
}

/// Remove the outputs of a failed translation.  The failure which
/// caused this is the one worth reporting, so a problem here is only
/// logged.
fn discard_outputs(paths: &OutputPaths) {
    if let Err(e) = remove_outputs(paths) {
        event!(Level::ERROR, "failed to clean up after failed translation: {e}");
    }
}

/// Translate one source file, writing the outputs next to it.
///
/// # Errors
///
/// Fails if the source file cannot be read, contains errors, or an
/// output cannot be written.  After a failure, no object, entries or
/// externals file for this source remains.
pub fn assemble_file(
    input: &Path,
    options: &OutputOptions,
) -> Result<Translation, AssemblerFailure> {
    let span = span!(Level::ERROR, "assemble", input=?input);
    let _enter = span.enter();

    let paths = OutputPaths::for_source(input);
    let file = OpenOptions::new().read(true).open(input).map_err(|e| {
        AssemblerFailure::Io(IoFailed {
            action: IoAction::Read,
            target: IoTarget::File(input.to_path_buf()),
            error: e,
        })
    })?;
    let file_name = input.display().to_string();

    let result = preprocess_source(BufReader::new(file), &file_name).and_then(|preprocessed| {
        if options.write_expanded {
            let mut text: Vec<u8> = Vec::new();
            preprocessed
                .expanded
                .write_to(&mut text)
                .map_err(|e| {
                    AssemblerFailure::Io(IoFailed {
                        action: IoAction::Write,
                        target: IoTarget::File(paths.expanded.clone()),
                        error: e,
                    })
                })?;
            write_file(&paths.expanded, &String::from_utf8_lossy(&text))?;
        }
        assemble_expanded(preprocessed)
    });

    match result {
        Ok(translation) => {
            if let Err(e) = write_outputs(&paths, &translation.binary, &translation.symtab) {
                discard_outputs(&paths);
                return Err(e);
            }
            translation.diagnostics.report();
            if options.list {
                print_listing(&translation)?;
            }
            event!(
                Level::INFO,
                "{file_name}: {} code words, {} data words",
                translation.binary.code.len(),
                translation.binary.data.len()
            );
            Ok(translation)
        }
        Err(e) => {
            if let AssemblerFailure::Rejected { errors, .. } = &e {
                errors.report();
            }
            discard_outputs(&paths);
            Err(e)
        }
    }
}
