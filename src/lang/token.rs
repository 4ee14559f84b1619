/// A lexed token. `line` is the 1-based physical source line it came
/// from, carried for diagnostics only; equality is structural.
#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub line: usize,
    pub kind: TokenKind,
}

#[derive(Debug, PartialEq, Clone)]
pub enum TokenKind {
    Eol,
    Number(Number),
    Ident(String),
    Comment(String),
    Str(String),
    Word(Word),
    Syntax(char),
    Directive(String),
    Data(String),
}

impl Token {
    pub fn new(line: usize, kind: TokenKind) -> Token {
        Token { line, kind }
    }

    pub fn word(&self) -> Option<Word> {
        match self.kind {
            TokenKind::Word(word) => Some(word),
            _ => None,
        }
    }

    pub fn number(&self) -> Option<&Number> {
        match &self.kind {
            TokenKind::Number(number) => Some(number),
            _ => None,
        }
    }

    pub fn is_eol(&self) -> bool {
        self.kind == TokenKind::Eol
    }

    pub fn is_syntax(&self, ch: char) -> bool {
        self.kind == TokenKind::Syntax(ch)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use TokenKind::*;
        match self {
            Eol => writeln!(f),
            Number(n) => write!(f, "{}", n.spelling()),
            Ident(s) => write!(f, "{}", s),
            Comment(s) => write!(f, "REM{}", s),
            Str(s) => write!(f, "\"{}\"", s),
            Word(w) => write!(f, "{}", w.text()),
            Syntax(c) => write!(f, "{}", c),
            Directive(s) => write!(f, "${}", s),
            Data(s) => write!(f, "{}", s),
        }
    }
}

/// Canonical text form of a token stream: what `LIST` would show.
/// A single space is inserted only where two alphanumeric runs would
/// otherwise fuse into one.
pub fn text(tokens: &[Token]) -> String {
    let mut out = String::new();
    write_tokens(&mut out, tokens);
    out
}

pub(crate) fn write_tokens(out: &mut String, tokens: &[Token]) {
    for token in tokens {
        if token.is_eol() {
            out.push('\n');
            continue;
        }
        let s = token.kind.to_string();
        let fuses = match (out.chars().last(), s.chars().next()) {
            (Some(a), Some(b)) => a.is_ascii_alphanumeric() && b.is_ascii_alphanumeric(),
            _ => false,
        };
        if fuses {
            out.push(' ');
        }
        out.push_str(&s);
    }
}

/// A numeric literal. The original spelling is retained only in
/// number-preservation mode; otherwise the canonical spelling is
/// derived from the value at emission time.
#[derive(Debug, PartialEq, Clone)]
pub struct Number {
    pub value: f64,
    pub text: Option<String>,
}

impl Number {
    pub fn new(value: f64) -> Number {
        Number { value, text: None }
    }

    pub fn preserved(value: f64, text: &str) -> Number {
        Number {
            value,
            text: Some(text.to_string()),
        }
    }

    pub fn spelling(&self) -> String {
        match &self.text {
            Some(text) => text.clone(),
            None => Number::canonical(self.value),
        }
    }

    pub fn canonical(value: f64) -> String {
        if value.fract() == 0.0 && value.abs() < 1e15 {
            format!("{}", value as i64)
        } else {
            format!("{}", value)
        }
    }

    pub fn as_line_number(&self) -> Option<u16> {
        if self.value.fract() == 0.0 && self.value >= 0.0 && self.value <= f64::from(u16::MAX) {
            Some(self.value as u16)
        } else {
            None
        }
    }
}

/// The dialect keyword set. `text` is the on-screen spelling, including
/// the mandatory trailing punctuation of the multi-part keywords;
/// `code` is the one-byte opcode in the tokenized program. Punctuation
/// that is an opcode on its own (`& + - * / ^ > = <`) is lexed as
/// `Syntax` and mapped by `syntax_code`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Word {
    End,
    For,
    Next,
    Data,
    Input,
    Del,
    Dim,
    Read,
    Gr,
    Text,
    PrNumber,
    InNumber,
    Call,
    Plot,
    Hlin,
    Vlin,
    Hgr2,
    Hgr,
    Hcolor,
    Hplot,
    Draw,
    Xdraw,
    Htab,
    Home,
    Rot,
    Scale,
    Shload,
    Trace,
    Notrace,
    Normal,
    Inverse,
    Flash,
    Color,
    Pop,
    Vtab,
    Himem,
    Lomem,
    Onerr,
    Resume,
    Recall,
    Store,
    Speed,
    Let,
    Goto,
    Run,
    If,
    Restore,
    Gosub,
    Return,
    Rem,
    Stop,
    On,
    Wait,
    Load,
    Save,
    Def,
    Poke,
    Print,
    Cont,
    List,
    Clear,
    Get,
    New,
    Tab,
    To,
    Fn,
    Spc,
    Then,
    At,
    Not,
    Step,
    And,
    Or,
    Sgn,
    Int,
    Abs,
    Usr,
    Fre,
    Scrn,
    Pdl,
    Pos,
    Sqr,
    Rnd,
    Log,
    Exp,
    Cos,
    Sin,
    Tan,
    Atn,
    Peek,
    Len,
    Str,
    Val,
    Asc,
    Chr,
    Left,
    Right,
    Mid,
}

impl Word {
    pub const ALL: [Word; 98] = {
        use Word::*;
        [
            End, For, Next, Data, Input, Del, Dim, Read, Gr, Text, PrNumber, InNumber, Call,
            Plot, Hlin, Vlin, Hgr2, Hgr, Hcolor, Hplot, Draw, Xdraw, Htab, Home, Rot, Scale,
            Shload, Trace, Notrace, Normal, Inverse, Flash, Color, Pop, Vtab, Himem, Lomem,
            Onerr, Resume, Recall, Store, Speed, Let, Goto, Run, If, Restore, Gosub, Return,
            Rem, Stop, On, Wait, Load, Save, Def, Poke, Print, Cont, List, Clear, Get, New,
            Tab, To, Fn, Spc, Then, At, Not, Step, And, Or, Sgn, Int, Abs, Usr, Fre, Scrn,
            Pdl, Pos, Sqr, Rnd, Log, Exp, Cos, Sin, Tan, Atn, Peek, Len, Str, Val, Asc, Chr,
            Left, Right, Mid,
        ]
    };

    pub fn text(self) -> &'static str {
        use Word::*;
        match self {
            End => "END",
            For => "FOR",
            Next => "NEXT",
            Data => "DATA",
            Input => "INPUT",
            Del => "DEL",
            Dim => "DIM",
            Read => "READ",
            Gr => "GR",
            Text => "TEXT",
            PrNumber => "PR#",
            InNumber => "IN#",
            Call => "CALL",
            Plot => "PLOT",
            Hlin => "HLIN",
            Vlin => "VLIN",
            Hgr2 => "HGR2",
            Hgr => "HGR",
            Hcolor => "HCOLOR=",
            Hplot => "HPLOT",
            Draw => "DRAW",
            Xdraw => "XDRAW",
            Htab => "HTAB",
            Home => "HOME",
            Rot => "ROT=",
            Scale => "SCALE=",
            Shload => "SHLOAD",
            Trace => "TRACE",
            Notrace => "NOTRACE",
            Normal => "NORMAL",
            Inverse => "INVERSE",
            Flash => "FLASH",
            Color => "COLOR=",
            Pop => "POP",
            Vtab => "VTAB",
            Himem => "HIMEM:",
            Lomem => "LOMEM:",
            Onerr => "ONERR",
            Resume => "RESUME",
            Recall => "RECALL",
            Store => "STORE",
            Speed => "SPEED=",
            Let => "LET",
            Goto => "GOTO",
            Run => "RUN",
            If => "IF",
            Restore => "RESTORE",
            Gosub => "GOSUB",
            Return => "RETURN",
            Rem => "REM",
            Stop => "STOP",
            On => "ON",
            Wait => "WAIT",
            Load => "LOAD",
            Save => "SAVE",
            Def => "DEF",
            Poke => "POKE",
            Print => "PRINT",
            Cont => "CONT",
            List => "LIST",
            Clear => "CLEAR",
            Get => "GET",
            New => "NEW",
            Tab => "TAB(",
            To => "TO",
            Fn => "FN",
            Spc => "SPC(",
            Then => "THEN",
            At => "AT",
            Not => "NOT",
            Step => "STEP",
            And => "AND",
            Or => "OR",
            Sgn => "SGN",
            Int => "INT",
            Abs => "ABS",
            Usr => "USR",
            Fre => "FRE",
            Scrn => "SCRN(",
            Pdl => "PDL",
            Pos => "POS",
            Sqr => "SQR",
            Rnd => "RND",
            Log => "LOG",
            Exp => "EXP",
            Cos => "COS",
            Sin => "SIN",
            Tan => "TAN",
            Atn => "ATN",
            Peek => "PEEK",
            Len => "LEN",
            Str => "STR$",
            Val => "VAL",
            Asc => "ASC",
            Chr => "CHR$",
            Left => "LEFT$",
            Right => "RIGHT$",
            Mid => "MID$",
        }
    }

    pub fn code(self) -> u8 {
        use Word::*;
        match self {
            End => 0x80,
            For => 0x81,
            Next => 0x82,
            Data => 0x83,
            Input => 0x84,
            Del => 0x85,
            Dim => 0x86,
            Read => 0x87,
            Gr => 0x88,
            Text => 0x89,
            PrNumber => 0x8A,
            InNumber => 0x8B,
            Call => 0x8C,
            Plot => 0x8D,
            Hlin => 0x8E,
            Vlin => 0x8F,
            Hgr2 => 0x90,
            Hgr => 0x91,
            Hcolor => 0x92,
            Hplot => 0x93,
            Draw => 0x94,
            Xdraw => 0x95,
            Htab => 0x96,
            Home => 0x97,
            Rot => 0x98,
            Scale => 0x99,
            Shload => 0x9A,
            Trace => 0x9B,
            Notrace => 0x9C,
            Normal => 0x9D,
            Inverse => 0x9E,
            Flash => 0x9F,
            Color => 0xA0,
            Pop => 0xA1,
            Vtab => 0xA2,
            Himem => 0xA3,
            Lomem => 0xA4,
            Onerr => 0xA5,
            Resume => 0xA6,
            Recall => 0xA7,
            Store => 0xA8,
            Speed => 0xA9,
            Let => 0xAA,
            Goto => 0xAB,
            Run => 0xAC,
            If => 0xAD,
            Restore => 0xAE,
            Gosub => 0xB0,
            Return => 0xB1,
            Rem => 0xB2,
            Stop => 0xB3,
            On => 0xB4,
            Wait => 0xB5,
            Load => 0xB6,
            Save => 0xB7,
            Def => 0xB8,
            Poke => 0xB9,
            Print => 0xBA,
            Cont => 0xBB,
            List => 0xBC,
            Clear => 0xBD,
            Get => 0xBE,
            New => 0xBF,
            Tab => 0xC0,
            To => 0xC1,
            Fn => 0xC2,
            Spc => 0xC3,
            Then => 0xC4,
            At => 0xC5,
            Not => 0xC6,
            Step => 0xC7,
            And => 0xCD,
            Or => 0xCE,
            Sgn => 0xD2,
            Int => 0xD3,
            Abs => 0xD4,
            Usr => 0xD5,
            Fre => 0xD6,
            Scrn => 0xD7,
            Pdl => 0xD8,
            Pos => 0xD9,
            Sqr => 0xDA,
            Rnd => 0xDB,
            Log => 0xDC,
            Exp => 0xDD,
            Cos => 0xDE,
            Sin => 0xDF,
            Tan => 0xE0,
            Atn => 0xE1,
            Peek => 0xE2,
            Len => 0xE3,
            Str => 0xE4,
            Val => 0xE5,
            Asc => 0xE6,
            Chr => 0xE7,
            Left => 0xE8,
            Right => 0xE9,
            Mid => 0xEA,
        }
    }

    pub fn from_text(s: &str) -> Option<Word> {
        Word::ALL
            .iter()
            .copied()
            .find(|w| w.text().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// Opcodes of the punctuation the dialect overloads. Anything else
/// emits as its literal byte.
pub fn syntax_code(ch: char) -> Option<u8> {
    match ch {
        '&' => Some(0xAF),
        '+' => Some(0xC8),
        '-' => Some(0xC9),
        '*' => Some(0xCA),
        '/' => Some(0xCB),
        '^' => Some(0xCC),
        '>' => Some(0xCF),
        '=' => Some(0xD0),
        '<' => Some(0xD1),
        _ => None,
    }
}

/// Outcome of testing the accumulated identifier buffer against the
/// keyword table after one more character.
#[derive(Debug, PartialEq)]
pub(crate) enum KeywordScan {
    /// No keyword ends here; keep accumulating.
    None,
    /// A keyword ends here, but the upcoming character grows it toward
    /// a longer one (ON before ONERR); keep accumulating.
    Defer,
    /// A keyword match. `prefix` characters of the buffer split off as
    /// a plain identifier first; `took_peek` means the lookahead
    /// character completed the spelling and must be consumed.
    Match {
        word: Word,
        prefix: usize,
        took_peek: bool,
    },
}

/// Longest-suffix keyword match over the accumulated buffer, with one
/// character of lookahead. The buffer must already be uppercase.
///
/// A match is deferred while a longer keyword is still reachable as a
/// suffix of buffer-plus-lookahead: `STO` holds the `TO` hit because
/// `STOP` and `STORE` may still arrive, `ON` holds for `ONERR`. If the
/// longer spelling never completes, the run falls back to a plain
/// identifier and the held hit is forfeit (the dialect's own quirk).
pub(crate) fn scan_keyword(buffer: &str, peek: Option<char>) -> KeywordScan {
    let peek = peek.map(|c| c.to_ascii_uppercase());
    let mut best: Option<(usize, Word, bool)> = None;
    for word in Word::ALL.iter().copied() {
        let text = word.text();
        let candidate = if buffer.ends_with(text) {
            Some((text.len(), word, false))
        } else if let Some(c) = peek {
            let (head, tail) = text.split_at(text.len() - 1);
            if tail.chars().next() == Some(c) && buffer.ends_with(head) {
                Some((text.len(), word, true))
            } else {
                None
            }
        } else {
            None
        };
        if let Some((len, _, took_peek)) = candidate {
            let better = match best {
                None => true,
                Some((best_len, _, best_peek)) => {
                    len > best_len || (len == best_len && best_peek && !took_peek)
                }
            };
            if better {
                best = candidate;
            }
        }
    }
    let (len, word, took_peek) = match best {
        None => return KeywordScan::None,
        Some(best) => best,
    };
    if let Some(c) = peek {
        let mut ext = String::with_capacity(buffer.len() + 1);
        ext.push_str(buffer);
        ext.push(c);
        for longer in Word::ALL.iter() {
            let text = longer.text();
            if text.len() <= len {
                continue;
            }
            for start in 0..=ext.len() - len {
                let suffix = &ext[start..];
                if suffix.len() < text.len() && text.starts_with(suffix) {
                    return KeywordScan::Defer;
                }
            }
        }
    }
    KeywordScan::Match {
        word,
        prefix: buffer.len() - (len - took_peek as usize),
        took_peek,
    }
}
