//! Error taxonomy for the translator.
//!
//! Three families, all fail-fast: input-shape problems discovered before
//! any translation starts, unsupported commands discovered while
//! classifying a line, and I/O failures on either end of the pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Any failure the translator can report. Translation never recovers
/// locally; the first error aborts the whole run.
#[derive(Debug, Error)]
pub enum TranslateError {
    // ---- input shape ------------------------------------------------------
    #[error("input does not exist: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("expected a .vm file, got: {}", .0.display())]
    WrongExtension(PathBuf),

    #[error("directory contains no .vm files: {}", .0.display())]
    EmptyDirectory(PathBuf),

    // ---- unsupported commands --------------------------------------------
    #[error("{unit}:{line}: unknown command: {word}")]
    UnknownCommand {
        unit: String,
        line: usize,
        word: String,
    },

    #[error("{unit}:{line}: unknown segment: {word}")]
    UnknownSegment {
        unit: String,
        line: usize,
        word: String,
    },

    #[error("{unit}:{line}: cannot pop to the constant segment")]
    ConstantPop { unit: String, line: usize },

    #[error("{unit}:{line}: pointer index {index} out of range (0..=1)")]
    PointerIndex {
        unit: String,
        line: usize,
        index: u16,
    },

    #[error("{unit}:{line}: temp index {index} out of range (0..=7)")]
    TempIndex {
        unit: String,
        line: usize,
        index: u16,
    },

    #[error("{unit}:{line}: {command} is missing an operand")]
    MissingOperand {
        unit: String,
        line: usize,
        command: &'static str,
    },

    #[error("{unit}:{line}: expected a number, got: {word}")]
    BadNumber {
        unit: String,
        line: usize,
        word: String,
    },

    // ---- I/O ---------------------------------------------------------------
    #[error("cannot read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, TranslateError>;
