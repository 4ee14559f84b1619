use super::directive;
use crate::error;
use crate::lang::{syntax_code, Error, Line, Program, Token, TokenKind, Word};
use crate::settings::Settings;
use std::collections::BTreeMap;

/// The finished binary plus the line-number to load-address side map
/// kept for diagnostics.
#[derive(Debug)]
pub struct Image {
    pub bytes: Vec<u8>,
    pub addresses: BTreeMap<u16, u16>,
}

/// Lay the program out exactly as the interpreter loads it: per line a
/// little-endian pointer to the next line, the line number, the encoded
/// statements joined by `:`, and a zero terminator; after the last line
/// two zero words close the program.
pub fn emit(program: &Program, settings: &Settings) -> Result<Image, Error> {
    let mut bytes = vec![];
    let mut addresses = BTreeMap::new();
    let mut address = u32::from(settings.start_address);
    for (index, line) in program.lines().iter().enumerate() {
        addresses.entry(line.number).or_insert(address as u16);
        let body = line_body(program, index, line, address, settings)?;
        let next = address + 4 + body.len() as u32 + 1;
        if next > 0xFFFF {
            return Err(
                error!(OverflowError; "PROGRAM PASSES THE TOP OF MEMORY AT LINE {}", line.number),
            );
        }
        bytes.extend_from_slice(&(next as u16).to_le_bytes());
        bytes.extend_from_slice(&line.number.to_le_bytes());
        bytes.extend_from_slice(&body);
        bytes.push(0x00);
        address = next;
    }
    bytes.extend_from_slice(&[0x00; 4]);
    Ok(Image { bytes, addresses })
}

/// Encode one line's statements. A statement opening with a directive
/// token hands the rest of its tokens to the directive as parameters
/// and must close the line; anything after it is fatal.
fn line_body(
    program: &Program,
    index: usize,
    line: &Line,
    line_address: u32,
    settings: &Settings,
) -> Result<Vec<u8>, Error> {
    let mut out = vec![];
    let mut statements = line.statements.iter().enumerate();
    while let Some((i, statement)) = statements.next() {
        if i > 0 {
            out.push(b':');
        }
        match statement.tokens.first() {
            Some(Token {
                line: source_line,
                kind: TokenKind::Directive(name),
            }) => {
                if statements.next().is_some() {
                    return Err(
                        error!(DirectiveError, *source_line; "NO STATEMENTS MAY FOLLOW ${}", name),
                    );
                }
                let address = line_address + 4 + out.len() as u32;
                if address > 0xFFFF {
                    return Err(
                        error!(OverflowError; "DIRECTIVE PASSES THE TOP OF MEMORY AT LINE {}", line.number),
                    );
                }
                let context = directive::DirectiveContext {
                    address: address as u16,
                    next_line: program.number_after(index),
                    settings,
                };
                let handler = directive::lookup(name).ok_or_else(
                    || error!(DirectiveError, *source_line; "UNKNOWN DIRECTIVE ${}", name),
                )?;
                let parameters = directive::parse_parameters(&statement.tokens[1..])?;
                out.extend(handler.emit(&parameters, &context)?);
                break;
            }
            _ => {
                for token in &statement.tokens {
                    push_token(&mut out, token)?;
                }
            }
        }
    }
    Ok(out)
}

/// One token's bytes. The colon between statements and the line
/// terminator are the caller's business.
pub(crate) fn push_token(out: &mut Vec<u8>, token: &Token) -> Result<(), Error> {
    match &token.kind {
        TokenKind::Eol => {
            return Err(error!(InternalError, token.line; "END OF LINE INSIDE A STATEMENT"))
        }
        TokenKind::Directive(_) => {
            return Err(error!(InternalError, token.line; "DIRECTIVE OUTSIDE DIRECTIVE MODE"))
        }
        TokenKind::Number(number) => out.extend(number.spelling().bytes()),
        TokenKind::Ident(text) | TokenKind::Data(text) => out.extend(text.bytes()),
        TokenKind::Comment(text) => {
            out.push(Word::Rem.code());
            out.extend(text.bytes());
        }
        TokenKind::Str(text) => {
            out.push(b'"');
            out.extend(text.bytes());
            out.push(b'"');
        }
        TokenKind::Word(word) => out.push(word.code()),
        TokenKind::Syntax(c) => match syntax_code(*c) {
            Some(code) => out.push(code),
            None => out.push(*c as u8),
        },
    }
    Ok(())
}

/// Full emitted length of a line: header, body, terminator. The merge
/// pass measures prospective merges with this.
pub fn line_len(line: &Line) -> Result<usize, Error> {
    let mut out = vec![];
    for (i, statement) in line.statements.iter().enumerate() {
        if i > 0 {
            out.push(b':');
        }
        for token in &statement.tokens {
            push_token(&mut out, token)?;
        }
    }
    Ok(out.len() + 5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{lex, parse};

    fn emit_str(s: &str) -> Image {
        let settings = Settings::default();
        emit(&parse(&lex(s).unwrap()).unwrap(), &settings).unwrap()
    }

    #[test]
    fn test_single_line_layout() {
        let image = emit_str("10 HOME");
        assert_eq!(
            image.bytes,
            vec![0x07, 0x08, 0x0A, 0x00, 0x97, 0x00, 0x00, 0x00, 0x00, 0x00]
        );
        assert_eq!(image.addresses.get(&10), Some(&0x0801));
    }

    #[test]
    fn test_two_lines_link() {
        let image = emit_str("10 HOME\n20 TEXT");
        assert_eq!(
            image.bytes,
            vec![
                0x07, 0x08, 0x0A, 0x00, 0x97, 0x00, // 10 HOME
                0x0D, 0x08, 0x14, 0x00, 0x89, 0x00, // 20 TEXT
                0x00, 0x00, 0x00, 0x00,
            ]
        );
        assert_eq!(image.addresses.get(&20), Some(&0x0807));
    }

    #[test]
    fn test_token_encodings() {
        let image = emit_str("0 PRINT \"HI\";A%:GOTO 0");
        let body = &image.bytes[4..image.bytes.len() - 5];
        assert_eq!(
            body,
            [
                0xBA, b'"', b'H', b'I', b'"', b';', b'A', b'%', b':', 0xAB, b'0',
            ]
        );
    }

    #[test]
    fn test_overloaded_punctuation() {
        let image = emit_str("0 A=B*C+2^D");
        let body = &image.bytes[4..image.bytes.len() - 5];
        assert_eq!(
            body,
            [b'A', 0xD0, b'B', 0xCA, b'C', 0xC8, b'2', 0xCC, b'D']
        );
    }

    #[test]
    fn test_comment_encoding() {
        let image = emit_str("0 REM OK");
        let body = &image.bytes[4..image.bytes.len() - 5];
        assert_eq!(body, [0xB2, b' ', b'O', b'K']);
    }

    #[test]
    fn test_unknown_directive_is_fatal() {
        let settings = Settings::default();
        let program = parse(&lex("10 $nonesuch").unwrap()).unwrap();
        let err = emit(&program, &settings).unwrap_err();
        assert_eq!(err.code(), crate::lang::ErrorCode::DirectiveError);
    }

    #[test]
    fn test_statement_after_directive_is_fatal() {
        let settings = Settings::default();
        let program = parse(&lex("10 $hex bytes=\"00\":PRINT").unwrap()).unwrap();
        let err = emit(&program, &settings).unwrap_err();
        assert!(err.to_string().contains("NO STATEMENTS MAY FOLLOW"));
    }

    #[test]
    fn test_line_len() {
        let program = parse(&lex("10 HOME:PRINT 5").unwrap()).unwrap();
        // HOME(1) + :(1) + PRINT(1) + 5(1) + header/terminator(5)
        assert_eq!(line_len(&program.lines()[0]).unwrap(), 9);
    }

    #[test]
    fn test_preserved_spelling_emits() {
        let settings = Settings {
            preserve_numbers: true,
            ..Settings::default()
        };
        let program = parse(&crate::lang::lex_preserving("0 PRINT 007").unwrap()).unwrap();
        let image = emit(&program, &settings).unwrap();
        let body = &image.bytes[4..image.bytes.len() - 5];
        assert_eq!(body, [0xBA, b'0', b'0', b'7']);
    }
}
