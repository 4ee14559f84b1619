use crate::lang::Error;
use std::io::{self, Write};

/// An encoded vector shape table, ready to splice into the output or
/// write to a file. The encoding and geometry work happen in the
/// external shape subsystem; here it is opaque bytes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShapeTable {
    bytes: Vec<u8>,
}

impl ShapeTable {
    pub fn from_bytes(bytes: Vec<u8>) -> ShapeTable {
        ShapeTable { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn write<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(&self.bytes)
    }
}

/// The seam to the external shape subsystem: shape source text in,
/// encoded table out. Wired into the pipeline through
/// `Settings::shapes`; the `$shape` directive fails cleanly when no
/// generator is present.
pub trait ShapeGenerator {
    fn generate(&self, source: &str) -> Result<ShapeTable, Error>;
}
