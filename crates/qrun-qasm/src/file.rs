//! Reading and writing `.qasm` files.

use std::path::{Path, PathBuf};

use qrun_ir::Circuit;

use crate::emitter::emit;
use crate::error::{ParseError, ParseResult};
use crate::parser::parse_named;

/// Write `circuit` to `<dir>/<name>.qasm` and return the path written.
pub fn write_qasm_file(circuit: &Circuit, dir: &Path, name: &str) -> ParseResult<PathBuf> {
    let path = dir.join(format!("{name}.qasm"));
    let source = emit(circuit)?;
    std::fs::write(&path, source).map_err(|e| ParseError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(path)
}

/// Read a `.qasm` file; the circuit is named after the file stem.
pub fn read_qasm_file(path: &Path) -> ParseResult<Circuit> {
    let source = std::fs::read_to_string(path).map_err(|e| ParseError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("circuit");
    parse_named(&source, name)
}
