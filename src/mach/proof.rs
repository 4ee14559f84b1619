use crate::lang::Program;
use std::io::{self, Write};

/// What a proofreader may be pointed at: the finalized tree, the
/// emitted binary, or raw text. Output is diagnostics only and never
/// feeds back into the pipeline.
pub enum ProofInput<'a> {
    Program(&'a Program),
    Image(&'a [u8]),
    Text(&'a str),
}

/// An emulation of a period program-entry validator: something a
/// bulletin board or magazine printed next to each listing line so a
/// typist could check their work.
pub trait Proofreader {
    fn name(&self) -> &'static str;
    fn report(&self, input: &ProofInput, out: &mut dyn Write) -> io::Result<()>;
}

pub fn lookup(name: &str) -> Option<Box<dyn Proofreader>> {
    match name.to_ascii_lowercase().as_str() {
        "line-codes" => Some(Box::new(LineCodes)),
        _ => None,
    }
}

/// Per-line CRC-16 check codes over the canonical listing, plus a
/// whole-image code when handed a binary.
struct LineCodes;

impl Proofreader for LineCodes {
    fn name(&self) -> &'static str {
        "line-codes"
    }

    fn report(&self, input: &ProofInput, out: &mut dyn Write) -> io::Result<()> {
        match input {
            ProofInput::Program(program) => {
                for line in program.lines() {
                    let code = crc::crc16::checksum_x25(line.to_string().as_bytes());
                    writeln!(out, "{:>5} {:04X}", line.number, code)?;
                }
            }
            ProofInput::Image(bytes) => {
                let code = crc::crc16::checksum_x25(bytes);
                writeln!(out, "IMAGE {:04X} ({} BYTES)", code, bytes.len())?;
            }
            ProofInput::Text(text) => {
                for (i, line) in text.lines().enumerate() {
                    let code = crc::crc16::checksum_x25(line.as_bytes());
                    writeln!(out, "{:>5} {:04X}", i + 1, code)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{lex, parse};

    #[test]
    fn test_lookup() {
        assert!(lookup("line-codes").is_some());
        assert!(lookup("perfect").is_none());
    }

    #[test]
    fn test_program_report_shape() {
        let program = parse(&lex("10 HOME\n20 END").unwrap()).unwrap();
        let mut out = vec![];
        LineCodes
            .report(&ProofInput::Program(&program), &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("   10 "));
        assert_eq!(lines[0].len(), 10);
    }

    #[test]
    fn test_identical_lines_get_identical_codes() {
        let mut a = vec![];
        let mut b = vec![];
        LineCodes
            .report(&ProofInput::Text("PRINT 5"), &mut a)
            .unwrap();
        LineCodes
            .report(&ProofInput::Text("PRINT 5"), &mut b)
            .unwrap();
        assert_eq!(a, b);
        let mut c = vec![];
        LineCodes
            .report(&ProofInput::Text("PRINT 6"), &mut c)
            .unwrap();
        assert_ne!(a, c);
    }
}
