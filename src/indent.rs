//! Translation of raw line-start spacing into block structure.
//!
//! The lexer reports every line break as `Newline`, `Spaces(n)` or `Tabs(n)`.
//! [`Indenter`] keeps a stack of open indentation widths and replaces that
//! spacing with `Newline`, `Indent` and `Unindent` markers, so the parser never
//! has to count whitespace.

use crate::error::{DreamError, IndentationError};
use crate::lexer::{SourceLocation, Token, TokenType};
use log::trace;
use std::collections::VecDeque;

/// Whether the file has committed to tabs or spaces for indentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Discipline {
    Unknown,
    Tabs,
    Spaces,
}

/// Translates indentation lazily. Errors from the token source are passed
/// through and end the stream.
pub struct Indenter<I> {
    input: I,
    stops: Vec<usize>,
    discipline: Discipline,
    pending_spacing: Option<Token>,
    output: VecDeque<Token>,
    last_loc: SourceLocation,
    emitted_any: bool,
    finished: bool,
}

impl<I, E> Indenter<I>
where
    I: Iterator<Item = Result<Token, E>>,
    E: Into<DreamError>,
{
    pub fn new(input: I) -> Self {
        Self {
            input,
            stops: Vec::new(),
            discipline: Discipline::Unknown,
            pending_spacing: None,
            output: VecDeque::new(),
            last_loc: SourceLocation::default(),
            emitted_any: false,
            finished: false,
        }
    }

    fn push(&mut self, ttype: TokenType, loc: &SourceLocation) {
        self.output.push_back(Token::new(ttype, loc.clone()));
    }

    /// Closes every open block and returns to the top level.
    fn clear(&mut self, loc: &SourceLocation) {
        self.push(TokenType::Newline, loc);
        while self.stops.pop().is_some() {
            self.push(TokenType::Unindent, loc);
            self.push(TokenType::Newline, loc);
        }
    }

    fn set_width(&mut self, width: usize, loc: &SourceLocation) -> Result<(), IndentationError> {
        self.push(TokenType::Newline, loc);
        match self.stops.last() {
            None => {}
            Some(&top) if width > top => {}
            Some(&top) if width == top => return Ok(()),
            Some(_) => {
                while let Some(&top) = self.stops.last() {
                    if width >= top {
                        break;
                    }
                    self.stops.pop();
                    match self.stops.last() {
                        Some(&next) if width <= next => {
                            self.push(TokenType::Unindent, loc);
                            self.push(TokenType::Newline, loc);
                        }
                        _ => {
                            return Err(IndentationError::MisalignedDedent {
                                width,
                                loc: loc.clone(),
                                span: loc.span(),
                                src: None,
                            })
                        }
                    }
                }
                return Ok(());
            }
        }
        trace!("indentation stop {width} opened at {loc}");
        self.stops.push(width);
        self.push(TokenType::Indent, loc);
        Ok(())
    }

    fn commit(&mut self, discipline: Discipline, loc: &SourceLocation) -> Result<(), IndentationError> {
        if self.discipline != Discipline::Unknown && self.discipline != discipline {
            return Err(IndentationError::MixedTabsAndSpaces {
                loc: loc.clone(),
                span: loc.span(),
                src: None,
            });
        }
        self.discipline = discipline;
        Ok(())
    }

    fn apply(&mut self, spacing: Token) -> Result<(), IndentationError> {
        let loc = spacing.loc;
        match spacing.ttype {
            TokenType::Spaces(width) => {
                self.commit(Discipline::Spaces, &loc)?;
                self.set_width(width, &loc)
            }
            TokenType::Tabs(width) => {
                self.commit(Discipline::Tabs, &loc)?;
                self.set_width(width, &loc)
            }
            _ => {
                self.clear(&loc);
                Ok(())
            }
        }
    }

    /// Pulls input until at least one token is ready for output, or the
    /// input ends.
    fn fill(&mut self) -> Result<(), DreamError> {
        while self.output.is_empty() {
            let Some(item) = self.input.next() else {
                self.finished = true;
                if self.emitted_any {
                    let loc = self
                        .pending_spacing
                        .take()
                        .map_or_else(|| self.last_loc.clone(), |t| t.loc);
                    self.clear(&loc);
                }
                return Ok(());
            };
            let token = item.map_err(Into::into)?;
            if token.ttype.is_spacing() {
                self.pending_spacing = Some(token);
                continue;
            }
            if let Some(spacing) = self.pending_spacing.take() {
                self.apply(spacing)?;
                if !self.emitted_any {
                    // nothing precedes the first line, so there is no line to end
                    self.output.retain(|t| t.ttype != TokenType::Newline);
                }
            }
            self.emitted_any = true;
            self.last_loc = token.loc.clone();
            self.output.push_back(token);
        }
        Ok(())
    }
}

impl<I, E> Iterator for Indenter<I>
where
    I: Iterator<Item = Result<Token, E>>,
    E: Into<DreamError>,
{
    type Item = Result<Token, DreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.output.is_empty() && !self.finished {
            if let Err(err) = self.fill() {
                self.finished = true;
                self.output.clear();
                return Some(Err(err));
            }
        }
        self.output.pop_front().map(Ok)
    }
}
