//! Stack VM to Hack assembly backend.
//!
//! Lowers the nand2tetris stack-oriented VM language to Hack assembly:
//! full calling convention (recursive calls, frame save/restore), all
//! eight memory segments, globally-unique label synthesis, and
//! two's-complement boolean/arithmetic semantics matching the Hack ALU.
//!
//! The pipeline is streaming and single-pass: each source line is
//! classified into a [`Command`], handed to the [`Generator`], and its
//! instructions appended to the output; no intermediate representation
//! is retained.
//!
//! # Usage
//!
//! - One unit, no bootstrap: [`translate`]
//! - A whole program (file or directory), bootstrap included:
//!   [`translate_program`] / [`write_program`]

pub mod asm;
pub mod codegen;
pub mod command;
pub mod driver;
pub mod error;

pub use crate::asm::AsmWriter;
pub use crate::codegen::Generator;
pub use crate::command::{Command, CommandKind, Op, Segment, classify};
pub use crate::driver::{
    CompilationUnit, output_path, resolve_units, translate_program, translate_source,
    write_program,
};
pub use crate::error::{Result, TranslateError};

/// Translate a single VM source string with a fresh generator.
///
/// Bootstrap-free single-unit mode; `unit` names the static namespace.
pub fn translate(source: &str, unit: &str) -> Result<String> {
    let mut generator = Generator::new();
    translate_source(source, unit, &mut generator)
}
