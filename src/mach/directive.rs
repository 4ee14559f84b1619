use super::generate::Generator;
use crate::error;
use crate::lang::{Error, Number, Token, TokenKind, Word};
use crate::settings::Settings;
use std::path::PathBuf;

type Result<T> = std::result::Result<T, Error>;

/// What the emitter gives a directive when its line is reached: the
/// output address its bytes start at, the line to jump to when code
/// must skip embedded data, and the compiler settings for path
/// resolution and external subsystems.
pub struct DirectiveContext<'a> {
    pub address: u16,
    pub next_line: Option<u16>,
    pub settings: &'a Settings,
}

/// A compiler pseudo-statement. The registry is closed and static;
/// referencing an unregistered name is fatal in the emitter.
pub trait Directive {
    fn name(&self) -> &'static str;
    fn emit(&self, parameters: &[Parameter], context: &DirectiveContext) -> Result<Vec<u8>>;
}

pub fn lookup(name: &str) -> Option<Box<dyn Directive>> {
    match name.to_ascii_lowercase().as_str() {
        "hex" => Some(Box::new(Hex)),
        "embed" => Some(Box::new(Embed)),
        "shape" => Some(Box::new(Shape)),
        _ => None,
    }
}

/// One `key=value` directive parameter.
pub struct Parameter {
    pub key: String,
    pub value: Token,
}

impl Parameter {
    fn string(&self) -> Result<&str> {
        match &self.value.kind {
            TokenKind::Str(text) => Ok(text),
            _ => Err(
                error!(DirectiveError, self.value.line; "PARAMETER {} WANTS A QUOTED VALUE", self.key),
            ),
        }
    }

    fn ident(&self) -> Result<&str> {
        match &self.value.kind {
            TokenKind::Ident(text) => Ok(text),
            _ => Err(
                error!(DirectiveError, self.value.line; "PARAMETER {} WANTS A VARIABLE NAME", self.key),
            ),
        }
    }
}

/// Accumulate `key=value` pairs from the directive's remaining tokens.
/// Commas between pairs are decoration and ignored.
pub fn parse_parameters(tokens: &[Token]) -> Result<Vec<Parameter>> {
    let mut parameters = vec![];
    let mut stream = tokens.iter().peekable();
    loop {
        while stream
            .peek()
            .map_or(false, |token| token.is_syntax(','))
        {
            stream.next();
        }
        let key = match stream.next() {
            None => return Ok(parameters),
            Some(token) => match &token.kind {
                TokenKind::Ident(text) => text.to_ascii_lowercase(),
                _ => {
                    return Err(error!(DirectiveError, token.line; "EXPECTED A PARAMETER NAME"))
                }
            },
        };
        match stream.next() {
            Some(token) if token.is_syntax('=') => {}
            _ => return Err(error!(DirectiveError; "PARAMETER {} IS MISSING ITS =", key)),
        }
        let value = match stream.next() {
            Some(token)
                if matches!(
                    token.kind,
                    TokenKind::Str(_) | TokenKind::Number(_) | TokenKind::Ident(_)
                ) =>
            {
                token.clone()
            }
            _ => return Err(error!(DirectiveError; "PARAMETER {} IS MISSING ITS VALUE", key)),
        };
        parameters.push(Parameter { key, value });
    }
}

fn find<'a>(parameters: &'a [Parameter], key: &str) -> Option<&'a Parameter> {
    parameters.iter().find(|parameter| parameter.key == key)
}

fn require<'a>(directive: &str, parameters: &'a [Parameter], key: &str) -> Result<&'a Parameter> {
    find(parameters, key).ok_or_else(|| error!(DirectiveError; "${} REQUIRES {}=", directive, key))
}

fn reject_unknown(directive: &str, parameters: &[Parameter], known: &[&str]) -> Result<()> {
    for parameter in parameters {
        if !known.contains(&parameter.key.as_str()) {
            return Err(
                error!(DirectiveError; "${} DOES NOT TAKE {}=", directive, parameter.key),
            );
        }
    }
    Ok(())
}

fn resolve(settings: &Settings, file: &str) -> PathBuf {
    match settings.source_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(file),
        _ => PathBuf::from(file),
    }
}

/// Append a jump past embedded data: `GOTO <next line>`, or `END` when
/// the directive line is the program's last.
fn jump_past(generator: &mut Generator, context: &DirectiveContext) {
    match context.next_line {
        Some(number) => {
            generator.token(Token::new(0, TokenKind::Word(Word::Goto)));
            generator.token(Token::new(
                0,
                TokenKind::Number(Number::new(f64::from(number))),
            ));
        }
        None => generator.token(Token::new(0, TokenKind::Word(Word::End))),
    }
}

/// `$hex bytes="A9 00 60"`: raw bytes, spelled in hex pairs. Spaces
/// and commas in the spelling are ignored.
struct Hex;

impl Directive for Hex {
    fn name(&self) -> &'static str {
        "hex"
    }

    fn emit(&self, parameters: &[Parameter], _context: &DirectiveContext) -> Result<Vec<u8>> {
        reject_unknown(self.name(), parameters, &["bytes"])?;
        let spelling = require(self.name(), parameters, "bytes")?.string()?;
        let mut out = vec![];
        let mut high: Option<u8> = None;
        for c in spelling.chars() {
            if c == ' ' || c == ',' {
                continue;
            }
            let digit = c
                .to_digit(16)
                .ok_or_else(|| error!(DirectiveError; "$hex CANNOT READ '{}' AS A HEX DIGIT", c))?
                as u8;
            high = match high {
                None => Some(digit),
                Some(h) => {
                    out.push(h << 4 | digit);
                    None
                }
            };
        }
        if high.is_some() {
            return Err(error!(DirectiveError; "$hex HAS A TRAILING HALF BYTE"));
        }
        Ok(out)
    }
}

/// `$embed file="sprites.bin" [var=AD]`: splice a binary file into the
/// line, assign its start address to `var` when asked, and jump past
/// it. The address literal's length feeds back into the address, so
/// the snippet is settled by the generator.
struct Embed;

impl Directive for Embed {
    fn name(&self) -> &'static str {
        "embed"
    }

    fn emit(&self, parameters: &[Parameter], context: &DirectiveContext) -> Result<Vec<u8>> {
        reject_unknown(self.name(), parameters, &["file", "var"])?;
        let file = require(self.name(), parameters, "file")?.string()?;
        let path = resolve(context.settings, file);
        let blob = std::fs::read(&path).map_err(
            |e| error!(DirectiveError; "$embed CANNOT READ {}: {}", path.display(), e),
        )?;
        let mut generator = Generator::new();
        if let Some(var) = find(parameters, "var") {
            generator.token(Token::new(0, TokenKind::Ident(var.ident()?.to_string())));
            generator.token(Token::new(0, TokenKind::Syntax('=')));
            generator.address_of("data");
            generator.token(Token::new(0, TokenKind::Syntax(':')));
        }
        jump_past(&mut generator, context);
        generator.mark("data");
        generator.bytes(&blob);
        generator.generate(context.address)
    }
}

/// `$shape file="logo.shp"`: hand the shape source to the external
/// shape subsystem, point the dialect's shape-table vector at the
/// emitted table, and jump past it.
struct Shape;

impl Directive for Shape {
    fn name(&self) -> &'static str {
        "shape"
    }

    fn emit(&self, parameters: &[Parameter], context: &DirectiveContext) -> Result<Vec<u8>> {
        reject_unknown(self.name(), parameters, &["file"])?;
        let file = require(self.name(), parameters, "file")?.string()?;
        let shapes = context
            .settings
            .shapes
            .as_ref()
            .ok_or_else(|| error!(DirectiveError; "$shape REQUIRES THE SHAPE SUBSYSTEM"))?;
        let path = resolve(context.settings, file);
        let source = std::fs::read_to_string(&path).map_err(
            |e| error!(DirectiveError; "$shape CANNOT READ {}: {}", path.display(), e),
        )?;
        let table = shapes.generate(&source)?;
        let mut generator = Generator::new();
        for (vector, part) in [(232.0, false), (233.0, true)].iter() {
            generator.token(Token::new(0, TokenKind::Word(Word::Poke)));
            generator.token(Token::new(0, TokenKind::Number(Number::new(*vector))));
            generator.token(Token::new(0, TokenKind::Syntax(',')));
            if *part {
                generator.address_high("table");
            } else {
                generator.address_low("table");
            }
            generator.token(Token::new(0, TokenKind::Syntax(':')));
        }
        jump_past(&mut generator, context);
        generator.mark("table");
        generator.bytes(table.bytes());
        generator.generate(context.address)
    }
}
