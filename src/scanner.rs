use crate::error::LexError;
use crate::lexer::SourceLocation;

/// Columns a tab advances the location by.
const TAB_WIDTH: usize = 4;

/// A character cursor with a single character of pushback.
///
/// End of input is reported as `None` by every operation; callers decide
/// whether running out of characters is acceptable where they are.
pub struct Scanner<I: Iterator<Item = char>> {
    chars: I,
    pending: Option<char>,
    loc: SourceLocation,
    line: usize,
    column: usize,
    offset: usize,
}

impl<I: Iterator<Item = char>> Scanner<I> {
    pub fn new(file: &str, chars: I) -> Self {
        Self {
            chars,
            pending: None,
            loc: SourceLocation::new(file, 1, 1),
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    /// Creates a scanner whose first character is `first`, ahead of `chars`.
    pub fn with_pending(file: &str, chars: I, first: char) -> Self {
        let mut scanner = Self::new(file, chars);
        scanner.pending = Some(first);
        scanner
    }

    /// Location of the most recently read character.
    pub fn location(&self) -> &SourceLocation {
        &self.loc
    }

    fn fill(&mut self) -> bool {
        if self.pending.is_some() {
            return true;
        }
        let Some(ch) = self.chars.next() else {
            return false;
        };
        self.loc.line = self.line;
        self.loc.column = self.column;
        self.loc.offset = self.offset;
        self.offset += ch.len_utf8();
        match ch {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\t' => self.column += TAB_WIDTH,
            _ => self.column += 1,
        }
        self.pending = Some(ch);
        true
    }

    pub fn has_next(&mut self) -> bool {
        self.fill()
    }

    pub fn peek(&mut self) -> Option<char> {
        self.fill();
        self.pending
    }

    pub fn take(&mut self) -> Option<char> {
        self.fill();
        self.pending.take()
    }

    pub fn untake(&mut self, ch: char) -> Result<(), LexError> {
        if self.pending.is_some() {
            return Err(LexError::Pushback {
                ch,
                span: self.loc.span(),
                loc: self.loc.clone(),
                src: None,
            });
        }
        self.pending = Some(ch);
        Ok(())
    }

    pub fn accept(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn accept_count(&mut self, ch: char) -> usize {
        let mut count = 0;
        while self.accept(ch) {
            count += 1;
        }
        count
    }

    /// Consumes characters up to and including `ch`. Returns false if the
    /// input ran out first.
    pub fn consume_until(&mut self, ch: char) -> bool {
        loop {
            match self.take() {
                Some(c) if c == ch => return true,
                Some(_) => {}
                None => return false,
            }
        }
    }

    pub fn all_matching(&mut self, predicate: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }
            out.push(c);
            self.pending = None;
        }
        out
    }

    /// Consumes the body of a block comment whose opening `/*` was already
    /// read. Nested comments must be balanced.
    pub fn consume_block_comment(&mut self) -> bool {
        let mut depth = 1usize;
        while depth > 0 {
            match self.take() {
                None => return false,
                Some('/') if self.accept('*') => depth += 1,
                Some('*') if self.accept('/') => depth -= 1,
                Some(_) => {}
            }
        }
        true
    }
}
