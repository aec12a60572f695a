//! Rendering mappings for the consumer.

use std::io::{self, Write};

use crate::results::Mapping;

/// How mappings are written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// All mappings on one line, comma-separated, with no trailing newline,
    /// ready to be spliced into `--path-mappings=...`.
    #[default]
    Compact,

    /// One `TARGET=SOURCE` line per mapping.
    Pretty,
}

/// Write `mappings` to `out` in the given format.
pub fn write_mappings<W: Write>(
    out: &mut W,
    mappings: &[Mapping],
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Pretty => {
            for m in mappings {
                writeln!(out, "{m}")?;
            }
        }
        Format::Compact => {
            let mut comma = "";
            for m in mappings {
                write!(out, "{comma}{m}")?;
                comma = ",";
            }
        }
    }
    out.flush()
}

/// Render `mappings` into a string.
pub fn render(mappings: &[Mapping], format: Format) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write_mappings(&mut buf, mappings, format);
    String::from_utf8_lossy(&buf).into_owned()
}
