use super::rewrite::{rewrite, Rewriter};
use crate::error;
use crate::lang::{Error, Number, Program, Token, TokenKind};
use crate::settings::Settings;

/// Rewrite each retained numeric spelling to its shortest equivalent:
/// leading zeros stripped, exact integers in integer form, a bare
/// leading zero before the decimal point dropped. Only meaningful when
/// number preservation carried the spellings this far.
pub fn shorten_numbers(program: &Program, settings: &Settings) -> Result<Program, Error> {
    if !settings.preserve_numbers {
        return Err(error!(PassError; "SHORTEN-NUMBERS REQUIRES NUMBER PRESERVATION"));
    }
    Ok(rewrite(program, &mut ShortenNumbers))
}

struct ShortenNumbers;

fn shortest(value: f64) -> String {
    let mut s = Number::canonical(value);
    if s.starts_with("0.") {
        s.remove(0);
    }
    s
}

impl Rewriter for ShortenNumbers {
    fn rewrite_token(&mut self, token: &Token) -> Option<Token> {
        match &token.kind {
            TokenKind::Number(number) if number.text.is_some() => Some(Token::new(
                token.line,
                TokenKind::Number(Number::preserved(number.value, &shortest(number.value))),
            )),
            _ => Some(token.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{lex_preserving, parse};

    #[test]
    fn test_spellings_shrink() {
        let settings = Settings {
            preserve_numbers: true,
            ..Settings::default()
        };
        let p = parse(&lex_preserving("10 PRINT 007:PRINT 5.0:PRINT 0.50").unwrap()).unwrap();
        let out = shorten_numbers(&p, &settings).unwrap();
        assert_eq!(out.to_string(), "10 PRINT 7:PRINT 5:PRINT .5\n");
    }

    #[test]
    fn test_requires_preservation() {
        let settings = Settings::default();
        let p = parse(&lex_preserving("10 PRINT 1").unwrap()).unwrap();
        assert!(shorten_numbers(&p, &settings).is_err());
    }
}
