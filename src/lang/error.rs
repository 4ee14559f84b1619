/// Every failure in the pipeline is fatal and flows through this one
/// type back to the caller. `line` is the physical source line, when
/// one is known.
pub struct Error {
    code: ErrorCode,
    line: Option<usize>,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    SyntaxError,
    ParseError,
    PassError,
    DirectiveError,
    GenerateError,
    OverflowError,
    InternalError,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident, $line:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_line($line)
    };
    ($err:ident; $($msg:tt)*) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message(format!($($msg)*))
    };
    ($err:ident, $line:expr; $($msg:tt)*) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line($line)
            .message(format!($($msg)*))
    };
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code,
            line: None,
            message: String::new(),
        }
    }

    pub fn in_line(mut self, line: usize) -> Error {
        debug_assert!(self.line.is_none());
        self.line = Some(line);
        self
    }

    pub fn message(mut self, message: String) -> Error {
        debug_assert!(self.message.is_empty());
        self.message = message;
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {{ {} }}", self)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use ErrorCode::*;
        let code_str = match self.code {
            SyntaxError => "SYNTAX ERROR",
            ParseError => "PARSE ERROR",
            PassError => "OPTIMIZER ERROR",
            DirectiveError => "DIRECTIVE ERROR",
            GenerateError => "CODE GENERATION ERROR",
            OverflowError => "OVERFLOW",
            InternalError => "INTERNAL ERROR",
        };
        write!(f, "{}", code_str)?;
        if let Some(line) = self.line {
            write!(f, " IN LINE {}", line)?;
        }
        if !self.message.is_empty() {
            write!(f, "; {}", self.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = Error::new(ErrorCode::SyntaxError)
            .in_line(12)
            .message("UNEXPECTED CHARACTER '~'".to_string());
        assert_eq!(
            e.to_string(),
            "SYNTAX ERROR IN LINE 12; UNEXPECTED CHARACTER '~'"
        );
        let e = Error::new(ErrorCode::GenerateError);
        assert_eq!(e.to_string(), "CODE GENERATION ERROR");
    }
}
