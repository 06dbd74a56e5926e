use crate::error::LexError;
use crate::scanner::Scanner;
use miette::SourceSpan;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

/// A position in a source file, attached to every token and AST node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
    pub column: usize,
    /// Byte offset from the start of the file.
    pub offset: usize,
}

impl SourceLocation {
    pub fn new(file: &str, line: usize, column: usize) -> Self {
        Self {
            file: file.to_string(),
            line,
            column,
            offset: 0,
        }
    }

    #[must_use]
    pub fn at_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// The single character at this location, for diagnostic labels.
    pub fn span(&self) -> SourceSpan {
        (self.offset, 1).into()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Represents the different kinds of tokens that the lexer can produce.
#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    /// Absence of a token. Never produced by the lexer; returned when looking
    /// past the end of the input.
    None,

    // == Punctuation & Operators ==
    /// `/`
    Slash,
    /// `-`
    Minus,
    /// `=`
    SetEqual,
    /// `(`
    ParenOpen,
    /// `)`
    ParenClose,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `..`
    DotDot,
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// `==`
    Equals,
    /// `!=`
    NotEquals,
    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
    /// `<=`
    LessThanOrEquals,
    /// `>=`
    GreaterThanOrEquals,
    /// `<<`, used to write output to a mob or the world.
    LeftShift,
    /// `>>`
    RightShift,
    /// `!`
    Not,

    // == Keywords ==
    If,
    Return,
    Set,
    In,
    New,
    Del,
    For,
    As,
    /// `var`, a reserved path segment.
    Var,
    /// `proc`, a reserved path segment.
    Proc,
    /// `verb`, a reserved path segment.
    Verb,
    /// `#define`
    Define,
    /// `#include`
    Include,

    // == Literals ==
    Integer(i64),
    /// An identifier, used for path segments, names and macro names.
    Symbol(String),
    /// A single-quoted resource name such as `'sword.dmi'`.
    Resource(String),
    StringStart,
    StringEnd,
    /// `[` inside a string, opening an embedded expression.
    StringInsertStart,
    /// The `]` closing an embedded expression.
    StringInsertEnd,
    /// A run of literal text inside a string.
    StringLiteral(String),

    // == Spacing ==
    /// A line break followed by no indentation. Before indentation
    /// translation this is raw spacing; afterwards it ends a line.
    Newline,
    /// A line break followed by this many spaces.
    Spaces(usize),
    /// A line break followed by this many tabs.
    Tabs(usize),
    /// Start of an indented block. Only produced by indentation translation.
    Indent,
    /// End of an indented block. Only produced by indentation translation.
    Unindent,
}

impl TokenType {
    pub fn is_spacing(&self) -> bool {
        matches!(
            self,
            TokenType::Newline | TokenType::Spaces(_) | TokenType::Tabs(_)
        )
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Integer(n) => write!(f, "Integer({n})"),
            TokenType::Spaces(n) => write!(f, "Spaces({n})"),
            TokenType::Tabs(n) => write!(f, "Tabs({n})"),
            TokenType::Symbol(s) => write!(f, "Symbol({s})"),
            TokenType::Resource(s) => write!(f, "Resource({s})"),
            TokenType::StringLiteral(s) => write!(f, "StringLiteral({s:?})"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// A token with its type and location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub ttype: TokenType,
    pub loc: SourceLocation,
}

impl Token {
    pub fn new(ttype: TokenType, loc: SourceLocation) -> Token {
        Token { ttype, loc }
    }

    pub fn none(loc: SourceLocation) -> Token {
        Token::new(TokenType::None, loc)
    }

    pub fn is_none(&self) -> bool {
        self.ttype == TokenType::None
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.ttype.fmt(f)
    }
}

pub fn is_valid_in_identifier(c: char) -> bool {
    c == '_' || c.is_alphabetic() || c.is_numeric()
}

fn keyword(sym: &str) -> Option<TokenType> {
    let ttype = match sym {
        "if" => TokenType::If,
        "return" => TokenType::Return,
        "set" => TokenType::Set,
        "in" => TokenType::In,
        "new" => TokenType::New,
        "del" => TokenType::Del,
        "for" => TokenType::For,
        "as" => TokenType::As,
        "var" => TokenType::Var,
        "proc" => TokenType::Proc,
        "verb" => TokenType::Verb,
        _ => return None,
    };
    Some(ttype)
}

/// The characters of an owned string, so a [`Lexer`] can outlive the buffer
/// its source was read into.
pub struct OwnedChars {
    text: String,
    pos: usize,
}

impl OwnedChars {
    pub fn new(text: String) -> Self {
        Self { text, pos: 0 }
    }
}

impl Iterator for OwnedChars {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        let ch = self.text.get(self.pos..)?.chars().next()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }
}

/// Whether a `-` right after this token is subtraction rather than the sign
/// of a literal.
fn ends_operand(ttype: &TokenType) -> bool {
    matches!(
        ttype,
        TokenType::Symbol(_)
            | TokenType::Integer(_)
            | TokenType::Resource(_)
            | TokenType::ParenClose
            | TokenType::StringEnd
            | TokenType::Dot
            | TokenType::DotDot
    )
}

/// Turns source text into raw tokens, including the spacing tokens that
/// [`crate::indent::Indenter`] turns into block structure.
///
/// Tokens are read on demand through [`Iterator`]. A string is read whole,
/// interpolation holes included, and its tokens are queued.
pub struct Lexer<I: Iterator<Item = char>> {
    scanner: Scanner<I>,
    pending: VecDeque<Token>,
    after_operand: bool,
    done: bool,
}

impl<'a> Lexer<std::str::Chars<'a>> {
    pub fn from_source(file: &str, source: &'a str) -> Self {
        Self::new(file, source.chars())
    }
}

impl Lexer<OwnedChars> {
    pub fn from_string(file: &str, source: String) -> Self {
        Self::new(file, OwnedChars::new(source))
    }
}

impl<I: Iterator<Item = char>> Lexer<I> {
    pub fn new(file: &str, chars: I) -> Self {
        // Start as if after a line break, so the first line's indentation is
        // measured the same way as every other line's.
        Self {
            scanner: Scanner::with_pending(file, chars, '\n'),
            pending: VecDeque::new(),
            after_operand: false,
            done: false,
        }
    }

    /// Reads every token, stopping at the first error.
    pub fn lex(self) -> Result<Vec<Token>, LexError> {
        self.collect()
    }

    fn emit(&mut self, ttype: TokenType, loc: SourceLocation) {
        self.after_operand = ends_operand(&ttype);
        self.pending.push_back(Token::new(ttype, loc));
    }

    fn loc(&self) -> SourceLocation {
        self.scanner.location().clone()
    }

    /// Lexes tokens until `terminator` is next in the input, leaving it
    /// unconsumed. With no terminator, lexes to the end of the input.
    fn lex_until(&mut self, terminator: Option<char>) -> Result<(), LexError> {
        while self.step(terminator)? {}
        Ok(())
    }

    /// Consumes one character's worth of input, queueing any tokens it
    /// completes. Returns false once `terminator` (or, with none, the end of
    /// input) is reached.
    fn step(&mut self, terminator: Option<char>) -> Result<bool, LexError> {
        let Some(ch) = self.scanner.take() else {
            return match terminator {
                None => Ok(false),
                Some(_) => {
                    let loc = self.loc();
                    Err(LexError::UnexpectedEof {
                        span: loc.span(),
                        loc,
                        src: None,
                    })
                }
            };
        };
        if Some(ch) == terminator {
            self.scanner.untake(ch)?;
            return Ok(false);
        }
        let loc = self.loc();
        match ch {
            '/' => {
                if self.scanner.accept('*') {
                    if !self.scanner.consume_block_comment() {
                        return Err(LexError::UnterminatedComment {
                            span: loc.span(),
                            loc,
                            src: None,
                        });
                    }
                } else if self.scanner.accept('/') {
                    // running out of input just ends the last line
                    if self.scanner.consume_until('\n') {
                        self.scanner.untake('\n')?;
                    }
                } else {
                    self.emit(TokenType::Slash, loc);
                }
            }
            '"' => self.read_string(loc)?,
            '\'' => {
                let (chunk, chunk_loc) = self.read_chunk('\'', false)?;
                if !self.scanner.accept('\'') {
                    let loc = self.loc();
                    return Err(LexError::UnterminatedResource {
                        span: loc.span(),
                        loc,
                        src: None,
                    });
                }
                self.emit(TokenType::Resource(chunk), chunk_loc);
            }
            '\r' | ' ' | '\t' => {}
            '\n' => self.read_line_start(loc)?,
            '(' => self.emit(TokenType::ParenOpen, loc),
            ')' => self.emit(TokenType::ParenClose, loc),
            ',' => self.emit(TokenType::Comma, loc),
            ':' => self.emit(TokenType::Colon, loc),
            ';' => self.emit(TokenType::Semicolon, loc),
            '.' => {
                let ttype = if self.scanner.accept('.') {
                    TokenType::DotDot
                } else {
                    TokenType::Dot
                };
                self.emit(ttype, loc);
            }
            '!' => {
                let ttype = if self.scanner.accept('=') {
                    TokenType::NotEquals
                } else {
                    TokenType::Not
                };
                self.emit(ttype, loc);
            }
            '=' => {
                let ttype = if self.scanner.accept('=') {
                    TokenType::Equals
                } else {
                    TokenType::SetEqual
                };
                self.emit(ttype, loc);
            }
            '<' => {
                let ttype = if self.scanner.accept('<') {
                    TokenType::LeftShift
                } else if self.scanner.accept('=') {
                    TokenType::LessThanOrEquals
                } else {
                    TokenType::LessThan
                };
                self.emit(ttype, loc);
            }
            '>' => {
                let ttype = if self.scanner.accept('>') {
                    TokenType::RightShift
                } else if self.scanner.accept('=') {
                    TokenType::GreaterThanOrEquals
                } else {
                    TokenType::GreaterThan
                };
                self.emit(ttype, loc);
            }
            '-' => {
                let signed = !self.after_operand
                    && self.scanner.peek().is_some_and(|c| c.is_ascii_digit());
                if signed {
                    let value = self.read_integer(true, &loc)?;
                    self.emit(TokenType::Integer(value), loc);
                } else {
                    self.emit(TokenType::Minus, loc);
                }
            }
            '#' => {
                let name = self.scanner.all_matching(is_valid_in_identifier);
                let ttype = match name.as_str() {
                    "define" => TokenType::Define,
                    "include" => TokenType::Include,
                    _ => {
                        return Err(LexError::UnknownDirective {
                            name,
                            span: loc.span(),
                            loc,
                            src: None,
                        })
                    }
                };
                self.emit(ttype, loc);
            }
            c if c.is_ascii_digit() => {
                self.scanner.untake(c)?;
                let value = self.read_integer(false, &loc)?;
                self.emit(TokenType::Integer(value), loc);
            }
            c if is_valid_in_identifier(c) => {
                self.scanner.untake(c)?;
                let sym = self.scanner.all_matching(is_valid_in_identifier);
                let ttype = keyword(&sym).unwrap_or(TokenType::Symbol(sym));
                self.emit(ttype, loc);
            }
            found => {
                return Err(LexError::UnexpectedCharacter {
                    found,
                    span: loc.span(),
                    loc,
                    src: None,
                })
            }
        }
        Ok(true)
    }

    /// Reads the indentation after a line break at `loc`.
    fn read_line_start(&mut self, loc: SourceLocation) -> Result<(), LexError> {
        let Some(kind) = self.scanner.peek().filter(|c| *c == ' ' || *c == '\t') else {
            self.emit(TokenType::Newline, loc);
            return Ok(());
        };
        self.scanner.take();
        let loc = self.loc();
        let count = 1 + self.scanner.accept_count(kind);
        let other = if kind == ' ' { '\t' } else { ' ' };
        if self.scanner.peek() == Some(other) {
            let mixed = self.loc();
            self.scanner.all_matching(|c| c == ' ' || c == '\t');
            // a blank line indents nothing
            if !matches!(self.scanner.peek(), None | Some('\n' | '\r')) {
                return Err(LexError::MixedIndentation {
                    span: mixed.span(),
                    loc: mixed,
                    src: None,
                });
            }
        }
        let ttype = if kind == ' ' {
            TokenType::Spaces(count)
        } else {
            TokenType::Tabs(count)
        };
        self.emit(ttype, loc);
        Ok(())
    }

    fn read_integer(&mut self, negative: bool, loc: &SourceLocation) -> Result<i64, LexError> {
        let mut text = String::new();
        if negative {
            text.push('-');
        }
        text.push_str(&self.scanner.all_matching(|c| c.is_ascii_digit()));
        text.parse::<i64>().map_err(|_| LexError::InvalidInteger {
            text,
            span: loc.span(),
            loc: loc.clone(),
            src: None,
        })
    }

    /// Reads literal text up to (not including) `terminator`, or an opening
    /// `[` when `interpolate` is set.
    fn read_chunk(
        &mut self,
        terminator: char,
        interpolate: bool,
    ) -> Result<(String, SourceLocation), LexError> {
        let mut text = String::new();
        let mut start = None;
        loop {
            let Some(mut ch) = self.scanner.take() else {
                let loc = start.unwrap_or_else(|| self.loc());
                return Err(LexError::UnterminatedString {
                    span: loc.span(),
                    loc,
                    src: None,
                });
            };
            let loc = start.get_or_insert_with(|| self.scanner.location().clone()).clone();
            if ch == terminator || (interpolate && ch == '[') {
                self.scanner.untake(ch)?;
                return Ok((text, loc));
            }
            if ch == '\\' {
                match self.scanner.take() {
                    Some(c) if c == terminator || c == '\\' => ch = c,
                    Some(escaped) => {
                        let loc = self.loc();
                        return Err(LexError::UnsupportedEscape {
                            escaped,
                            span: loc.span(),
                            loc,
                            src: None,
                        });
                    }
                    None => {
                        return Err(LexError::UnterminatedString {
                            span: loc.span(),
                            loc,
                            src: None,
                        })
                    }
                }
            }
            text.push(ch);
        }
    }

    fn read_string(&mut self, loc: SourceLocation) -> Result<(), LexError> {
        self.emit(TokenType::StringStart, loc);
        while !self.scanner.accept('"') {
            let (chunk, chunk_loc) = self.read_chunk('"', true)?;
            if !chunk.is_empty() {
                self.emit(TokenType::StringLiteral(chunk), chunk_loc);
            }
            if self.scanner.accept('[') {
                self.emit(TokenType::StringInsertStart, self.loc());
                self.lex_until(Some(']'))?;
                // lex_until only returns Ok once `]` is next
                self.scanner.accept(']');
                self.emit(TokenType::StringInsertEnd, self.loc());
            }
        }
        self.emit(TokenType::StringEnd, self.loc());
        Ok(())
    }
}

impl<I: Iterator<Item = char>> Iterator for Lexer<I> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pending.is_empty() && !self.done {
            match self.step(None) {
                Ok(more) => self.done = !more,
                Err(err) => {
                    self.done = true;
                    self.pending.clear();
                    return Some(Err(err));
                }
            }
        }
        self.pending.pop_front().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<TokenType> {
        Lexer::from_source("test.dm", input)
            .lex()
            .unwrap()
            .into_iter()
            .map(|t| t.ttype)
            .collect()
    }

    fn lex_err(input: &str) -> LexError {
        Lexer::from_source("test.dm", input).lex().unwrap_err()
    }

    fn sym(s: &str) -> TokenType {
        TokenType::Symbol(s.to_string())
    }

    #[test]
    fn test_empty() {
        assert_eq!(lex(""), vec![TokenType::Newline]);
    }

    #[test]
    fn test_operators() {
        let expected = vec![
            TokenType::Newline,
            TokenType::Slash,
            TokenType::Minus,
            TokenType::SetEqual,
            TokenType::ParenOpen,
            TokenType::ParenClose,
            TokenType::Comma,
            TokenType::Dot,
            TokenType::DotDot,
            TokenType::Colon,
            TokenType::Semicolon,
            TokenType::Equals,
            TokenType::NotEquals,
            TokenType::LessThan,
            TokenType::GreaterThan,
            TokenType::LessThanOrEquals,
            TokenType::GreaterThanOrEquals,
            TokenType::LeftShift,
            TokenType::RightShift,
            TokenType::Not,
        ];
        assert_eq!(lex("/ - = ( ) , . .. : ; == != < > <= >= << >> !"), expected);
    }

    #[test]
    fn test_keywords_and_symbols() {
        let expected = vec![
            TokenType::Newline,
            TokenType::If,
            TokenType::Return,
            TokenType::Set,
            TokenType::In,
            TokenType::New,
            TokenType::Del,
            TokenType::For,
            TokenType::As,
            TokenType::Var,
            TokenType::Proc,
            TokenType::Verb,
            sym("player"),
            sym("_x1"),
            sym("héros"),
        ];
        assert_eq!(
            lex("if return set in new del for as var proc verb player _x1 héros"),
            expected
        );
    }

    #[test]
    fn test_negative_numbers() {
        assert_eq!(
            lex("-5 a-5 - 5"),
            vec![
                TokenType::Newline,
                TokenType::Integer(-5),
                sym("a"),
                TokenType::Minus,
                TokenType::Integer(5),
                TokenType::Minus,
                TokenType::Integer(5),
            ]
        );
    }

    #[test]
    fn test_integer_overflow() {
        assert!(matches!(
            lex_err("99999999999999999999"),
            LexError::InvalidInteger { .. }
        ));
    }

    #[test]
    fn test_spacing_tokens() {
        assert_eq!(
            lex("a\n  b\n\t\tc\nd"),
            vec![
                TokenType::Newline,
                sym("a"),
                TokenType::Spaces(2),
                sym("b"),
                TokenType::Tabs(2),
                sym("c"),
                TokenType::Newline,
                sym("d"),
            ]
        );
    }

    #[test]
    fn test_plain_string() {
        assert_eq!(
            lex(r#""hello \"world\" \\""#),
            vec![
                TokenType::Newline,
                TokenType::StringStart,
                TokenType::StringLiteral(r#"hello "world" \"#.to_string()),
                TokenType::StringEnd,
            ]
        );
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(
            lex(r#""""#),
            vec![TokenType::Newline, TokenType::StringStart, TokenType::StringEnd]
        );
    }

    #[test]
    fn test_interpolated_string() {
        assert_eq!(
            lex(r#""[src] hits [target.name]!""#),
            vec![
                TokenType::Newline,
                TokenType::StringStart,
                TokenType::StringInsertStart,
                sym("src"),
                TokenType::StringInsertEnd,
                TokenType::StringLiteral(" hits ".to_string()),
                TokenType::StringInsertStart,
                sym("target"),
                TokenType::Dot,
                sym("name"),
                TokenType::StringInsertEnd,
                TokenType::StringLiteral("!".to_string()),
                TokenType::StringEnd,
            ]
        );
    }

    #[test]
    fn test_nested_interpolation() {
        assert_eq!(
            lex(r#""a[f("b[c]")]""#),
            vec![
                TokenType::Newline,
                TokenType::StringStart,
                TokenType::StringLiteral("a".to_string()),
                TokenType::StringInsertStart,
                sym("f"),
                TokenType::ParenOpen,
                TokenType::StringStart,
                TokenType::StringLiteral("b".to_string()),
                TokenType::StringInsertStart,
                sym("c"),
                TokenType::StringInsertEnd,
                TokenType::StringEnd,
                TokenType::ParenClose,
                TokenType::StringInsertEnd,
                TokenType::StringEnd,
            ]
        );
    }

    #[test]
    fn test_string_errors() {
        assert!(matches!(
            lex_err(r#""abc"#),
            LexError::UnterminatedString { .. }
        ));
        assert!(matches!(
            lex_err(r#""a\nb""#),
            LexError::UnsupportedEscape { escaped: 'n', .. }
        ));
        assert!(matches!(
            lex_err(r#""a[b"#),
            LexError::UnexpectedEof { .. }
        ));
    }

    #[test]
    fn test_resource() {
        assert_eq!(
            lex("'sword[1].dmi'"),
            vec![
                TokenType::Newline,
                TokenType::Resource("sword[1].dmi".to_string())
            ]
        );
        assert!(matches!(
            lex_err("'sword.dmi"),
            LexError::UnterminatedString { .. }
        ));
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            lex("a // comment\nb /* x /* y */ z */ c"),
            vec![
                TokenType::Newline,
                sym("a"),
                TokenType::Newline,
                sym("b"),
                sym("c"),
            ]
        );
        assert_eq!(lex("a // trailing"), vec![TokenType::Newline, sym("a")]);
        assert!(matches!(
            lex_err("/* /* */"),
            LexError::UnterminatedComment { .. }
        ));
    }

    #[test]
    fn test_directives() {
        assert_eq!(
            lex("#define X 1\n#include \"a.dm\""),
            vec![
                TokenType::Newline,
                TokenType::Define,
                sym("X"),
                TokenType::Integer(1),
                TokenType::Newline,
                TokenType::Include,
                TokenType::StringStart,
                TokenType::StringLiteral("a.dm".to_string()),
                TokenType::StringEnd,
            ]
        );
        assert!(matches!(
            lex_err("#pragma once"),
            LexError::UnknownDirective { .. }
        ));
    }

    #[test]
    fn test_unexpected_character() {
        assert!(matches!(
            lex_err("a $ b"),
            LexError::UnexpectedCharacter { found: '$', .. }
        ));
    }

    #[test]
    fn test_token_locations() {
        let tokens = Lexer::from_source("test.dm", "a\n  bc")
            .lex()
            .unwrap();
        let b = tokens
            .iter()
            .find(|t| t.ttype == sym("bc"))
            .unwrap();
        assert_eq!(b.loc, SourceLocation::new("test.dm", 2, 3).at_offset(4));
    }

    #[test]
    fn test_minus_after_operands() {
        use TokenType::*;
        assert_eq!(
            lex("f()-1 \"s\"-2 x.y-3 = -4"),
            vec![
                Newline,
                sym("f"),
                ParenOpen,
                ParenClose,
                Minus,
                Integer(1),
                StringStart,
                StringLiteral("s".to_string()),
                StringEnd,
                Minus,
                Integer(2),
                sym("x"),
                Dot,
                sym("y"),
                Minus,
                Integer(3),
                SetEqual,
                Integer(-4),
            ]
        );
    }

    #[test]
    fn test_negative_number_in_hole() {
        use TokenType::*;
        assert_eq!(
            lex("\"[-1]\""),
            vec![
                Newline,
                StringStart,
                StringInsertStart,
                Integer(-1),
                StringInsertEnd,
                StringEnd,
            ]
        );
    }

    #[test]
    fn test_mixed_indentation_run() {
        let err = lex_err("a\n \tb");
        assert!(matches!(err, LexError::MixedIndentation { .. }));
        assert_eq!(err.location().line, 2);
        assert_eq!(err.location().column, 2);

        assert!(matches!(lex_err("a\n\t b"), LexError::MixedIndentation { .. }));
    }

    #[test]
    fn test_mixed_whitespace_on_blank_line() {
        assert_eq!(
            lex("a\n \t\nb"),
            vec![
                TokenType::Newline,
                sym("a"),
                TokenType::Spaces(1),
                TokenType::Newline,
                sym("b"),
            ]
        );
    }

    #[test]
    fn test_tokens_stream_before_error() {
        let mut lexer = Lexer::from_source("test.dm", "a $ b");
        assert_eq!(lexer.next().unwrap().unwrap().ttype, TokenType::Newline);
        assert_eq!(lexer.next().unwrap().unwrap().ttype, sym("a"));
        assert!(matches!(
            lexer.next(),
            Some(Err(LexError::UnexpectedCharacter { found: '$', .. }))
        ));
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_owned_source() {
        let tokens: Vec<TokenType> = Lexer::from_string("test.dm", "héros 1".to_string())
            .map(|t| t.unwrap().ttype)
            .collect();
        assert_eq!(tokens, vec![TokenType::Newline, sym("héros"), TokenType::Integer(1)]);
    }

    #[test]
    fn test_offsets() {
        let tokens = Lexer::from_source("test.dm", "é x").lex().unwrap();
        let x = tokens.iter().find(|t| t.ttype == sym("x")).unwrap();
        assert_eq!(x.loc.offset, 3);
        assert_eq!(x.loc.column, 3);
    }
}
