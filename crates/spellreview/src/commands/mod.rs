//! Command implementations.

use anyhow::Context;
use camino::Utf8Path;

pub mod info;
pub mod replace;
pub mod review;
pub mod scan;
#[cfg(feature = "mcp")]
pub mod serve;

/// Read a file and validate its size against the configured limit.
pub fn read_input_file(path: &Utf8Path, max_bytes: Option<usize>) -> anyhow::Result<String> {
    // Preflight: check file size via metadata before reading into memory.
    let metadata =
        std::fs::metadata(path.as_std_path()).with_context(|| format!("failed to read {path}"))?;
    if let Some(max) = max_bytes {
        let size = metadata.len() as usize;
        if size > max {
            anyhow::bail!("input too large: {path} is {size} bytes (limit: {max} bytes)");
        }
    }

    let content = std::fs::read_to_string(path.as_std_path())
        .with_context(|| format!("failed to read {path}"))?;
    Ok(content)
}

/// Write command output to `path`, or to stdout when `path` is `None`.
pub fn write_output(path: Option<&Utf8Path>, text: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => std::fs::write(path.as_std_path(), text)
            .with_context(|| format!("failed to write {path}")),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}
