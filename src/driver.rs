//! The translation driver: input resolution, per-unit streaming, the
//! once-per-program bootstrap, and the output artifact.
//!
//! A program is either one `.vm` file or a directory of them. All units
//! flow through a single [`Generator`] so label counters are shared and
//! synthesized labels stay unique across the whole program. Output is
//! written to a temporary file beside the target and persisted into
//! place only on success, so a failed run never leaves a partial
//! artifact behind.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::asm::AsmWriter;
use crate::command::classify;
use crate::error::{Result, TranslateError};
use crate::codegen::Generator;

/// Extension a source unit must carry.
pub const SOURCE_EXT: &str = "vm";
/// Extension of the emitted artifact.
pub const TARGET_EXT: &str = "asm";

/// One input source file. Its file stem names the unit and namespaces
/// its `static` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    path: PathBuf,
    name: String,
}

impl CompilationUnit {
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown")
            .to_string();
        Self {
            path: path.to_path_buf(),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Translate one unit's source text. No bootstrap; the caller owns the
/// generator so state can span units.
pub fn translate_source(source: &str, unit: &str, generator: &mut Generator) -> Result<String> {
    generator.set_unit(unit);
    let mut asm = AsmWriter::with_capacity(source.lines().count() * 48 + 256);
    for (i, line) in source.lines().enumerate() {
        if let Some(cmd) = classify(line, i + 1, unit)? {
            generator.emit(&cmd, &mut asm);
        }
    }
    Ok(asm.into_output())
}

fn translate_unit(unit: &CompilationUnit, generator: &mut Generator) -> Result<String> {
    let source = fs::read_to_string(unit.path()).map_err(|e| TranslateError::Read {
        path: unit.path().to_path_buf(),
        source: e,
    })?;
    translate_source(&source, unit.name(), generator)
}

/// Resolve the input path into the program's units, sorted by name for
/// deterministic output.
pub fn resolve_units(input: &Path) -> Result<Vec<CompilationUnit>> {
    if !input.exists() {
        return Err(TranslateError::MissingInput(input.to_path_buf()));
    }
    if input.is_dir() {
        let mut paths: Vec<PathBuf> = fs::read_dir(input)
            .map_err(|e| TranslateError::Read {
                path: input.to_path_buf(),
                source: e,
            })?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == SOURCE_EXT))
            .collect();
        if paths.is_empty() {
            return Err(TranslateError::EmptyDirectory(input.to_path_buf()));
        }
        paths.sort();
        Ok(paths.iter().map(|p| CompilationUnit::from_path(p)).collect())
    } else if input.extension().is_some_and(|ext| ext == SOURCE_EXT) {
        Ok(vec![CompilationUnit::from_path(input)])
    } else {
        Err(TranslateError::WrongExtension(input.to_path_buf()))
    }
}

/// Translate a whole program: bootstrap prologue exactly once, then
/// every unit in order through one shared generator.
pub fn translate_program(input: &Path) -> Result<String> {
    let units = resolve_units(input)?;

    let mut generator = Generator::new();
    let mut prologue = AsmWriter::new();
    generator.emit_bootstrap(&mut prologue);

    let mut output = prologue.into_output();
    for unit in &units {
        output.push_str(&translate_unit(unit, &mut generator)?);
    }
    Ok(output)
}

/// Derived artifact path: `Foo.vm` → `Foo.asm`; `prog/` → `prog/prog.asm`.
pub fn output_path(input: &Path) -> PathBuf {
    if input.is_dir() {
        let dir_name = input
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("program");
        input.join(format!("{dir_name}.{TARGET_EXT}"))
    } else {
        input.with_extension(TARGET_EXT)
    }
}

/// Translate `input` and persist the artifact next to it, atomically:
/// the text goes to a temporary file in the output directory which is
/// renamed into place only after a fully successful run.
pub fn write_program(input: &Path) -> Result<PathBuf> {
    let text = translate_program(input)?;
    let out = output_path(input);
    let dir = match out.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let write_err = |e: std::io::Error| TranslateError::Write {
        path: out.clone(),
        source: e,
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(text.as_bytes()).map_err(write_err)?;
    tmp.persist(&out).map_err(|e| write_err(e.error))?;
    Ok(out)
}
