//! Macro substitution and file inclusion.
//!
//! The [`Preprocessor`] merges the token streams of every included file into
//! one stream, replaying `#define`d symbols and collecting the search path and
//! map files along the way. Streams are pulled lazily from an explicit stack,
//! so an included file is read only when its `#include` line is reached.

use crate::error::{DreamError, PreprocessError};
use crate::lexer::{SourceLocation, Token, TokenType};
use log::debug;
use std::collections::{HashMap, VecDeque};

/// Symbol whose definition appends to the search path instead of defining a
/// macro.
pub const SEARCH_PATH_SYMBOL: &str = "FILE_DIR";

/// A stream of structural tokens for one file.
pub type TokenStream = Box<dyn Iterator<Item = Result<Token, DreamError>>>;

/// Provides the token stream for a file name. A file that does not exist
/// yields an empty stream.
pub trait FileLoader {
    fn load(&mut self, name: &str) -> TokenStream;

    /// The text of `name`, used to show source snippets in error reports.
    fn source(&self, _name: &str) -> Option<String> {
        None
    }
}

impl<F> FileLoader for F
where
    F: FnMut(&str) -> TokenStream,
{
    fn load(&mut self, name: &str) -> TokenStream {
        self(name)
    }
}

/// A file on the inclusion stack.
struct OpenFile {
    name: String,
    tokens: TokenStream,
}

pub struct Preprocessor<L: FileLoader> {
    loader: L,
    stack: Vec<OpenFile>,
    definitions: HashMap<String, Vec<Token>>,
    replay: VecDeque<Token>,
    search_path: Vec<String>,
    maps: Vec<String>,
    done: bool,
}

impl<L: FileLoader> Preprocessor<L> {
    pub fn new(mut loader: L, filename: &str) -> Self {
        debug!("preprocessing {filename}");
        let root = OpenFile {
            name: filename.to_string(),
            tokens: loader.load(filename),
        };
        Self {
            loader,
            stack: vec![root],
            definitions: HashMap::new(),
            replay: VecDeque::new(),
            search_path: Vec::new(),
            maps: Vec::new(),
            done: false,
        }
    }

    /// Directories named by `#define FILE_DIR`, in the order seen so far.
    pub fn search_path(&self) -> &[String] {
        &self.search_path
    }

    /// `.dmm` files named by `#include`, in the order seen so far.
    pub fn maps(&self) -> &[String] {
        &self.maps
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<String>) {
        (self.search_path, self.maps)
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Releases every open stream and stops producing output.
    fn finish(&mut self) {
        self.done = true;
        self.replay.clear();
        for file in self.stack.drain(..).rev() {
            drop(file);
        }
    }

    /// Next token from the innermost open file, moving on to the including
    /// file when it runs out.
    fn pull(&mut self) -> Option<Result<Token, DreamError>> {
        while let Some(file) = self.stack.last_mut() {
            match file.tokens.next() {
                Some(item) => return Some(item),
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }

    /// Next token of the directive being read. Directives never span files.
    fn directive_token(&mut self, directive: &str, after: &SourceLocation) -> Result<Token, DreamError> {
        let eof = || PreprocessError::UnexpectedEof {
            directive: directive.to_string(),
            loc: after.clone(),
            span: after.span(),
            src: None,
        };
        let file = self.stack.last_mut().ok_or_else(eof)?;
        match file.tokens.next() {
            Some(item) => item,
            None => Err(eof().into()),
        }
    }

    fn expect_end_of_line(&mut self, directive: &str, after: &SourceLocation) -> Result<(), DreamError> {
        let token = self.directive_token(directive, after)?;
        if token.ttype != TokenType::Newline {
            return Err(PreprocessError::TrailingTokens {
                directive: directive.to_string(),
                found: token.to_string(),
                span: token.loc.span(),
                loc: token.loc,
                src: None,
            }
            .into());
        }
        Ok(())
    }

    /// Reads a string made only of literal chunks.
    fn constant_string(&mut self, directive: &str, after: &SourceLocation) -> Result<String, DreamError> {
        let start = self.directive_token(directive, after)?;
        if start.ttype == TokenType::Dot && directive == "#define" {
            return Ok(".".to_string());
        }
        if start.ttype != TokenType::StringStart {
            return Err(PreprocessError::ExpectedString {
                directive: directive.to_string(),
                found: start.to_string(),
                span: start.loc.span(),
                loc: start.loc,
                src: None,
            }
            .into());
        }
        let mut text = String::new();
        let mut after = start.loc;
        loop {
            let token = self.directive_token(directive, &after)?;
            match token.ttype {
                TokenType::StringEnd => return Ok(text),
                TokenType::StringLiteral(ref chunk) => text.push_str(chunk),
                _ => {
                    return Err(PreprocessError::NonConstantString {
                        directive: directive.to_string(),
                        found: token.to_string(),
                        span: token.loc.span(),
                        loc: token.loc,
                        src: None,
                    }
                    .into())
                }
            }
            after = token.loc;
        }
    }

    fn define(&mut self, loc: &SourceLocation) -> Result<(), DreamError> {
        let keyword = self.directive_token("#define", loc)?;
        let TokenType::Symbol(name) = keyword.ttype else {
            return Err(PreprocessError::ExpectedSymbol {
                found: keyword.to_string(),
                span: keyword.loc.span(),
                loc: keyword.loc,
                src: None,
            }
            .into());
        };
        if name == SEARCH_PATH_SYMBOL {
            let dir = self.constant_string("#define", loc)?;
            self.expect_end_of_line("#define", loc)?;
            debug!("search path entry {dir:?} at {loc}");
            self.search_path.push(dir);
            return Ok(());
        }
        let mut body = Vec::new();
        loop {
            let token = self.directive_token("#define", loc)?;
            if token.ttype == TokenType::Newline {
                break;
            }
            body.push(token);
        }
        if self.definitions.contains_key(&name) {
            return Err(PreprocessError::Redefinition {
                name,
                loc: loc.clone(),
                span: loc.span(),
                src: None,
            }
            .into());
        }
        debug!("defined {name} as {} token(s) at {loc}", body.len());
        self.definitions.insert(name, body);
        Ok(())
    }

    fn include(&mut self, loc: &SourceLocation) -> Result<(), DreamError> {
        let name = self.constant_string("#include", loc)?;
        self.expect_end_of_line("#include", loc)?;
        if name.ends_with(".dmm") {
            debug!("map file {name} at {loc}");
            self.maps.push(name);
        } else if self.stack.iter().any(|file| file.name == name) {
            return Err(PreprocessError::RecursiveInclude {
                name,
                loc: loc.clone(),
                span: loc.span(),
                src: None,
            }
            .into());
        } else {
            debug!("including {name} at {loc}");
            let tokens = self.loader.load(&name);
            self.stack.push(OpenFile { name, tokens });
        }
        Ok(())
    }

    fn step(&mut self) -> Option<Result<Token, DreamError>> {
        if let Some(token) = self.replay.pop_front() {
            return Some(Ok(token));
        }
        loop {
            let token = match self.pull()? {
                Ok(token) => token,
                Err(err) => return Some(Err(err)),
            };
            let handled = match &token.ttype {
                TokenType::Define => self.define(&token.loc),
                TokenType::Include => self.include(&token.loc),
                TokenType::Symbol(name) => match self.definitions.get(name) {
                    // replayed verbatim; a body is never expanded again
                    Some(body) => {
                        self.replay.extend(body.iter().cloned());
                        match self.replay.pop_front() {
                            Some(first) => return Some(Ok(first)),
                            None => continue,
                        }
                    }
                    None => return Some(Ok(token)),
                },
                _ => return Some(Ok(token)),
            };
            if let Err(err) = handled {
                return Some(Err(err));
            }
        }
    }
}

impl<L: FileLoader> Iterator for Preprocessor<L> {
    type Item = Result<Token, DreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.step();
        match &item {
            None => self.finish(),
            Some(Err(err)) => {
                debug!("preprocessing failed: {err}");
                self.finish();
            }
            Some(Ok(_)) => {}
        }
        item
    }
}
