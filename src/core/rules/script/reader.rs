//! S-expression reader.

use super::ScriptLimits;
use crate::error::ScriptError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Int(i64),
    Str(String),
    Bool(bool),
    Symbol(String),
    List(Vec<Expr>),
}

struct Reader {
    chars: Vec<char>,
    index: usize,
    line: usize,
    column: usize,
    /// Lists currently open
    depth: usize,
    max_depth: usize,
}

impl Reader {
    fn new(input: &str, max_depth: usize) -> Self {
        Self {
            chars: input.chars().collect(),
            index: 0,
            line: 1,
            column: 1,
            depth: 0,
            max_depth,
        }
    }

    fn parse(mut self) -> Result<Vec<Expr>, ScriptError> {
        let mut forms = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            if self.is_eof() {
                break;
            }
            forms.push(self.read_form()?);
        }
        Ok(forms)
    }

    fn read_form(&mut self) -> Result<Expr, ScriptError> {
        self.skip_whitespace_and_comments();
        let ch = self
            .peek_char()
            .ok_or_else(|| self.error_here("unexpected end of input"))?;
        match ch {
            '(' => {
                if self.depth >= self.max_depth {
                    return Err(ScriptError::DepthLimit {
                        limit: self.max_depth,
                    });
                }
                self.consume_char();
                self.depth += 1;
                let list = self.read_list();
                self.depth -= 1;
                list
            }
            ')' => Err(self.error_here("unexpected ')'")),
            '"' => self.read_string(),
            '#' => self.read_boolean(),
            c if c.is_ascii_digit()
                || (c == '-' && self.peek_next().is_some_and(|n| n.is_ascii_digit())) =>
            {
                self.read_number()
            }
            _ => self.read_symbol(),
        }
    }

    fn read_list(&mut self) -> Result<Expr, ScriptError> {
        let mut elements = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            match self.peek_char() {
                Some(')') => {
                    self.consume_char();
                    break;
                }
                Some(_) => elements.push(self.read_form()?),
                None => return Err(self.error_here("missing ')'")),
            }
        }
        Ok(Expr::List(elements))
    }

    fn read_string(&mut self) -> Result<Expr, ScriptError> {
        let (line, column) = (self.line, self.column);
        self.consume_char(); // opening quote
        let mut buf = String::new();
        while let Some(ch) = self.consume_char() {
            match ch {
                '"' => return Ok(Expr::Str(buf)),
                '\\' => {
                    let translated = match self.consume_char() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some(other) => {
                            let message = format!("unsupported escape \\{}", other);
                            return Err(self.error_at(line, column, message));
                        }
                        None => break,
                    };
                    buf.push(translated);
                }
                other => buf.push(other),
            }
        }
        Err(self.error_at(line, column, "unterminated string"))
    }

    fn read_boolean(&mut self) -> Result<Expr, ScriptError> {
        let (line, column) = (self.line, self.column);
        self.consume_char(); // '#'
        match self.consume_char() {
            Some('t') => Ok(Expr::Bool(true)),
            Some('f') => Ok(Expr::Bool(false)),
            _ => Err(self.error_at(line, column, "booleans are written #t or #f")),
        }
    }

    fn read_number(&mut self) -> Result<Expr, ScriptError> {
        let (line, column) = (self.line, self.column);
        let mut buf = String::new();
        if self.peek_char() == Some('-') {
            buf.push('-');
            self.consume_char();
        }
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() {
                buf.push(ch);
                self.consume_char();
            } else {
                break;
            }
        }
        if self.peek_char().is_some_and(is_symbol_char) {
            return Err(self.error_at(line, column, "invalid number"));
        }
        buf.parse::<i64>()
            .map(Expr::Int)
            .map_err(|_| self.error_at(line, column, format!("integer out of range: {}", buf)))
    }

    fn read_symbol(&mut self) -> Result<Expr, ScriptError> {
        let mut buf = String::new();
        while let Some(ch) = self.peek_char() {
            if is_symbol_char(ch) {
                buf.push(ch);
                self.consume_char();
            } else {
                break;
            }
        }
        if buf.is_empty() {
            let unexpected = self.peek_char().unwrap_or(' ');
            return Err(self.error_here(format!("unexpected character '{}'", unexpected)));
        }
        Ok(Expr::Symbol(buf))
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.peek_char().is_some_and(char::is_whitespace) {
                self.consume_char();
            }
            if self.peek_char() != Some(';') {
                break;
            }
            while let Some(ch) = self.consume_char() {
                if ch == '\n' {
                    break;
                }
            }
        }
    }

    fn consume_char(&mut self) -> Option<char> {
        let ch = self.chars.get(self.index).copied();
        if let Some(c) = ch {
            self.index += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.index + 1).copied()
    }

    fn is_eof(&self) -> bool {
        self.index >= self.chars.len()
    }

    fn error_here(&self, message: impl Into<String>) -> ScriptError {
        self.error_at(self.line, self.column, message)
    }

    fn error_at(&self, line: usize, column: usize, message: impl Into<String>) -> ScriptError {
        ScriptError::Parse {
            line,
            column,
            message: message.into(),
        }
    }
}

fn is_symbol_char(ch: char) -> bool {
    ch.is_alphanumeric()
        || matches!(ch, '-' | '_' | '+' | '*' | '/' | '%' | '?' | '!' | '<' | '>' | '=')
}

/// Read every top-level form of `source` with the default nesting limit
pub fn parse(source: &str) -> Result<Vec<Expr>, ScriptError> {
    parse_with_depth(source, ScriptLimits::default().max_depth)
}

/// Read every top-level form of `source`; lists may nest `max_depth` deep
pub fn parse_with_depth(source: &str, max_depth: usize) -> Result<Vec<Expr>, ScriptError> {
    Reader::new(source, max_depth).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Expr {
        Expr::Symbol(s.to_string())
    }

    #[test]
    fn reads_nested_lists() {
        let forms = parse(r#"(str "a" (+ index -1)) ; trailing comment"#).unwrap();
        assert_eq!(
            forms,
            vec![Expr::List(vec![
                sym("str"),
                Expr::Str("a".into()),
                Expr::List(vec![sym("+"), sym("index"), Expr::Int(-1)]),
            ])]
        );
    }

    #[test]
    fn reads_escapes_and_booleans() {
        let forms = parse(r#""a\"b\n" #t #f"#).unwrap();
        assert_eq!(
            forms,
            vec![Expr::Str("a\"b\n".into()), Expr::Bool(true), Expr::Bool(false)]
        );
    }

    #[test]
    fn minus_alone_is_a_symbol() {
        assert_eq!(
            parse("(- 3 1)").unwrap()[0],
            Expr::List(vec![sym("-"), Expr::Int(3), Expr::Int(1)])
        );
    }

    #[test]
    fn nesting_is_bounded_before_recursing() {
        let deep = "(".repeat(2_000_000);
        assert_eq!(parse_with_depth(&deep, 64), Err(ScriptError::DepthLimit { limit: 64 }));

        let ok = format!("{}x{}", "(a ".repeat(3), ")".repeat(3));
        assert!(parse_with_depth(&ok, 3).is_ok());
        assert!(parse_with_depth(&ok, 2).is_err());
    }

    #[test]
    fn reports_position_of_errors() {
        match parse("(str\n  \"open") {
            Err(ScriptError::Parse { line, column, .. }) => {
                assert_eq!((line, column), (2, 3));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(parse("(a b"), Err(ScriptError::Parse { .. })));
        assert!(matches!(parse(")"), Err(ScriptError::Parse { .. })));
        assert!(matches!(parse("12abc"), Err(ScriptError::Parse { .. })));
    }
}
