use super::emit::push_token;
use crate::error;
use crate::lang::{Error, Token};
use std::collections::{HashMap, HashSet};

/// How many times one mark may resolve to the same address without the
/// whole chain settling before generation gives up. Ten revisits is
/// far past any converging chain and well short of forever.
pub const DEFAULT_SETTLE_LIMIT: usize = 10;

enum Item {
    Mark(String),
    Bytes(Vec<u8>),
    Token(Token),
    Address(String),
    AddressLow(String),
    AddressHigh(String),
}

/// Generated code whose embedded addresses depend on its own length.
///
/// A mark resolves to the output cursor at the moment it is passed, and
/// may be read before it is defined. Because an address is emitted as
/// decimal text, resolving one can change the emitted length, moving
/// every later mark; the chain is therefore re-run from scratch against
/// a fresh buffer until a full pass moves no mark. A mark that keeps
/// revisiting the same address without the chain settling is the
/// classic boundary oscillation, reported as a fatal error rather than
/// looped on forever.
pub struct Generator {
    items: Vec<Item>,
    settle_limit: usize,
}

impl Default for Generator {
    fn default() -> Generator {
        Generator::new()
    }
}

impl Generator {
    pub fn new() -> Generator {
        Generator::with_settle_limit(DEFAULT_SETTLE_LIMIT)
    }

    pub fn with_settle_limit(settle_limit: usize) -> Generator {
        Generator {
            items: vec![],
            settle_limit,
        }
    }

    /// Resolve `name` to the output address of this point.
    pub fn mark(&mut self, name: &str) {
        self.items.push(Item::Mark(name.to_string()));
    }

    pub fn bytes(&mut self, bytes: &[u8]) {
        self.items.push(Item::Bytes(bytes.to_vec()));
    }

    pub fn token(&mut self, token: Token) {
        self.items.push(Item::Token(token));
    }

    /// The mark's address as decimal text.
    pub fn address_of(&mut self, name: &str) {
        self.items.push(Item::Address(name.to_string()));
    }

    /// The low byte of the mark's address as decimal text.
    pub fn address_low(&mut self, name: &str) {
        self.items.push(Item::AddressLow(name.to_string()));
    }

    /// The high byte of the mark's address as decimal text.
    pub fn address_high(&mut self, name: &str) {
        self.items.push(Item::AddressHigh(name.to_string()));
    }

    pub fn generate(&self, origin: u16) -> Result<Vec<u8>, Error> {
        let marked: HashSet<&str> = self
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Mark(name) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        for item in &self.items {
            if let Item::Address(name) | Item::AddressLow(name) | Item::AddressHigh(name) = item {
                if !marked.contains(name.as_str()) {
                    return Err(error!(GenerateError; "UNDEFINED MARK {}", name));
                }
            }
        }

        let mut resolved: HashMap<&str, u16> = HashMap::new();
        let mut revisits: HashMap<(&str, u16), usize> = HashMap::new();
        loop {
            let mut out = vec![];
            let mut moved = false;
            for item in &self.items {
                let cursor = u32::from(origin) + out.len() as u32;
                if cursor > 0xFFFF {
                    return Err(error!(OverflowError; "GENERATED CODE PASSES THE TOP OF MEMORY"));
                }
                match item {
                    Item::Mark(name) => {
                        let address = cursor as u16;
                        if resolved.get(name.as_str()) != Some(&address) {
                            moved = true;
                        }
                        resolved.insert(name.as_str(), address);
                        let seen = revisits.entry((name.as_str(), address)).or_insert(0);
                        *seen += 1;
                        if *seen > self.settle_limit {
                            return Err(error!(GenerateError;
                                "MARK {} WILL NOT SETTLE: ADDRESS {} KEEPS RECURRING WHILE \
                                 A NEARBY ADDRESS LITERAL FLIPS ACROSS A DIGIT-COUNT \
                                 BOUNDARY, GROWING AND SHRINKING THE CODE AROUND IT",
                                name, address));
                        }
                    }
                    Item::Bytes(bytes) => out.extend_from_slice(bytes),
                    Item::Token(token) => push_token(&mut out, token)?,
                    Item::Address(name) => {
                        let address = resolved.get(name.as_str()).copied().unwrap_or(0);
                        out.extend(address.to_string().bytes());
                    }
                    Item::AddressLow(name) => {
                        let address = resolved.get(name.as_str()).copied().unwrap_or(0);
                        out.extend((address & 0xFF).to_string().bytes());
                    }
                    Item::AddressHigh(name) => {
                        let address = resolved.get(name.as_str()).copied().unwrap_or(0);
                        out.extend((address >> 8).to_string().bytes());
                    }
                }
            }
            if !moved {
                return Ok(out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ErrorCode;

    #[test]
    fn test_backward_reference_settles_in_two_passes() {
        let mut g = Generator::new();
        g.mark("here");
        g.bytes(b"xyz");
        g.address_of("here");
        let out = g.generate(0x0801).unwrap();
        assert_eq!(out, b"xyz2049");
    }

    #[test]
    fn test_forward_reference_grows_to_fixed_point() {
        // The data mark sits after its own address literal: the
        // literal's digit count feeds back into the mark's address.
        let mut g = Generator::new();
        g.address_of("data");
        g.mark("data");
        g.bytes(&[0xEA]);
        let out = g.generate(9995).unwrap();
        // 9995 + 4 digits = 9999; the literal settles at 9999.
        assert_eq!(out, [b'9', b'9', b'9', b'9', 0xEA]);
    }

    #[test]
    fn test_digit_growth_shifts_the_mark() {
        let mut g = Generator::new();
        g.address_of("data");
        g.mark("data");
        let out = g.generate(9998).unwrap();
        // 9998 + 5 digits = 10003: the first guess of four digits
        // pushed the mark across 10000 and the literal re-grew.
        assert_eq!(out, b"10003");
    }

    #[test]
    fn test_low_byte_boundary_oscillation_detected() {
        // lo(255) is three digits, lo(257) is one: the mark flips
        // between 255 and 257 forever. The revisit counter calls it.
        let mut g = Generator::new();
        g.address_low("data");
        g.mark("data");
        let err = g.generate(254).unwrap_err();
        assert_eq!(err.code(), ErrorCode::GenerateError);
        assert!(err.to_string().contains("WILL NOT SETTLE"));
    }

    #[test]
    fn test_undefined_mark_rejected_up_front() {
        let mut g = Generator::new();
        g.address_of("nowhere");
        let err = g.generate(0x0801).unwrap_err();
        assert!(err.to_string().contains("UNDEFINED MARK"));
    }

    #[test]
    fn test_final_pass_moves_nothing() {
        let mut g = Generator::new();
        g.address_of("a");
        g.bytes(b"-");
        g.address_of("b");
        g.mark("a");
        g.bytes(&[1, 2, 3]);
        g.mark("b");
        let out = g.generate(100).unwrap();
        // a = 100 + len("107-110") = 107, b = 110.
        assert_eq!(out, b"107-110\x01\x02\x03");
    }
}
