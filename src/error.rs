use crate::lexer::{SourceLocation, Token};
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum DreamError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Indentation(#[from] IndentationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error("could not read {file}: {message}")]
    #[diagnostic(
        code(dream::io),
        help("The file exists but could not be read. Check its permissions and encoding.")
    )]
    Io { file: String, message: String },
}

type SourceSlot<'a> = (&'a SourceLocation, &'a mut Option<NamedSource<String>>);

impl DreamError {
    /// Where the error happened, if it points into a source file.
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            DreamError::Lex(e) => Some(e.location()),
            DreamError::Indentation(e) => Some(e.location()),
            DreamError::Preprocess(e) => Some(e.location()),
            DreamError::Parse(e) => Some(e.location()),
            DreamError::Io { .. } => None,
        }
    }

    /// Attaches the text of the file the error points into, so a report can
    /// show the offending line. `lookup` maps a file name to its contents.
    #[must_use]
    pub fn with_source(mut self, lookup: impl FnOnce(&str) -> Option<String>) -> Self {
        if let Some((loc, src)) = self.source_slot() {
            if let Some(text) = lookup(&loc.file) {
                *src = Some(NamedSource::new(loc.file.clone(), text));
            }
        }
        self
    }

    fn source_slot(&mut self) -> Option<SourceSlot<'_>> {
        match self {
            DreamError::Lex(e) => Some(e.source_slot()),
            DreamError::Indentation(e) => Some(e.source_slot()),
            DreamError::Preprocess(e) => Some(e.source_slot()),
            DreamError::Parse(e) => Some(e.source_slot()),
            DreamError::Io { .. } => None,
        }
    }
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum LexError {
    #[error("unexpected character {found:?} at {loc}")]
    #[diagnostic(
        code(dream::lex::unexpected_character),
        help("This character cannot start any token.")
    )]
    UnexpectedCharacter {
        found: char,
        loc: SourceLocation,
        #[label("unexpected character")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("unterminated string at {loc}")]
    #[diagnostic(
        code(dream::lex::unterminated_string),
        help("The input ended before the closing quote was found.")
    )]
    UnterminatedString {
        loc: SourceLocation,
        #[label("string starts here")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("expected resource literal to be ended with a single quote at {loc}")]
    #[diagnostic(code(dream::lex::unterminated_resource))]
    UnterminatedResource {
        loc: SourceLocation,
        #[label("missing `'`")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("unterminated block comment at {loc}")]
    #[diagnostic(
        code(dream::lex::unterminated_comment),
        help("Block comments nest; every `/*` needs a matching `*/`.")
    )]
    UnterminatedComment {
        loc: SourceLocation,
        #[label("comment opened here")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("unexpected end of input at {loc}")]
    #[diagnostic(
        code(dream::lex::unexpected_eof),
        help("An interpolation hole `[` was opened but never closed with `]`.")
    )]
    UnexpectedEof {
        loc: SourceLocation,
        #[label("input ends here")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("unsupported escape sequence \\{escaped} at {loc}")]
    #[diagnostic(
        code(dream::lex::unsupported_escape),
        help("Only the string delimiter and the backslash itself can be escaped.")
    )]
    UnsupportedEscape {
        escaped: char,
        loc: SourceLocation,
        #[label("unsupported escape")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid integer literal {text} at {loc}")]
    #[diagnostic(code(dream::lex::invalid_integer), help("Integers must fit in 64 bits."))]
    InvalidInteger {
        text: String,
        loc: SourceLocation,
        #[label("out of range")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("unknown preprocessor directive #{name} at {loc}")]
    #[diagnostic(
        code(dream::lex::unknown_directive),
        help("Only #define and #include are supported.")
    )]
    UnknownDirective {
        name: String,
        loc: SourceLocation,
        #[label("unknown directive")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("line indentation mixes tabs and spaces at {loc}")]
    #[diagnostic(
        code(dream::lex::mixed_indentation),
        help("Indent each line with only tabs or only spaces.")
    )]
    MixedIndentation {
        loc: SourceLocation,
        #[label("indentation changes kind here")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("cannot push back {ch:?} at {loc}: a character is already pending")]
    #[diagnostic(code(dream::lex::pushback))]
    Pushback {
        ch: char,
        loc: SourceLocation,
        #[label("here")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },
}

impl LexError {
    pub fn location(&self) -> &SourceLocation {
        match self {
            LexError::UnexpectedCharacter { loc, .. }
            | LexError::UnterminatedString { loc, .. }
            | LexError::UnterminatedResource { loc, .. }
            | LexError::UnterminatedComment { loc, .. }
            | LexError::UnexpectedEof { loc, .. }
            | LexError::UnsupportedEscape { loc, .. }
            | LexError::InvalidInteger { loc, .. }
            | LexError::UnknownDirective { loc, .. }
            | LexError::MixedIndentation { loc, .. }
            | LexError::Pushback { loc, .. } => loc,
        }
    }

    fn source_slot(&mut self) -> SourceSlot<'_> {
        match self {
            LexError::UnexpectedCharacter { loc, src, .. }
            | LexError::UnterminatedString { loc, src, .. }
            | LexError::UnterminatedResource { loc, src, .. }
            | LexError::UnterminatedComment { loc, src, .. }
            | LexError::UnexpectedEof { loc, src, .. }
            | LexError::UnsupportedEscape { loc, src, .. }
            | LexError::InvalidInteger { loc, src, .. }
            | LexError::UnknownDirective { loc, src, .. }
            | LexError::MixedIndentation { loc, src, .. }
            | LexError::Pushback { loc, src, .. } => (loc, src),
        }
    }
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum IndentationError {
    #[error("mixing tabs and spaces at {loc}")]
    #[diagnostic(
        code(dream::indent::mixed),
        help("A file must indent with either tabs or spaces, not both.")
    )]
    MixedTabsAndSpaces {
        loc: SourceLocation,
        #[label("indentation style changes here")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("did not remove enough indentation levels at once at {loc}")]
    #[diagnostic(
        code(dream::indent::misaligned_dedent),
        help("A dedented line must line up with an enclosing block.")
    )]
    MisalignedDedent {
        width: usize,
        loc: SourceLocation,
        #[label("no enclosing block is indented {width}")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },
}

impl IndentationError {
    pub fn location(&self) -> &SourceLocation {
        match self {
            IndentationError::MixedTabsAndSpaces { loc, .. }
            | IndentationError::MisalignedDedent { loc, .. } => loc,
        }
    }

    fn source_slot(&mut self) -> SourceSlot<'_> {
        match self {
            IndentationError::MixedTabsAndSpaces { loc, src, .. }
            | IndentationError::MisalignedDedent { loc, src, .. } => (loc, src),
        }
    }
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum PreprocessError {
    #[error("attempt to re-#define symbol {name:?} at {loc}")]
    #[diagnostic(
        code(dream::preprocess::redefinition),
        help("Each macro can only be defined once.")
    )]
    Redefinition {
        name: String,
        loc: SourceLocation,
        #[label("{name} is already defined")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("expected symbol immediately after #define, not {found} at {loc}")]
    #[diagnostic(code(dream::preprocess::expected_symbol))]
    ExpectedSymbol {
        found: String,
        loc: SourceLocation,
        #[label("expected a name")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("expected string immediately after {directive}, not {found} at {loc}")]
    #[diagnostic(code(dream::preprocess::expected_string))]
    ExpectedString {
        directive: String,
        found: String,
        loc: SourceLocation,
        #[label("expected a string")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("unexpected token {found} during {directive} string at {loc}")]
    #[diagnostic(
        code(dream::preprocess::non_constant_string),
        help("Directive strings cannot contain interpolation.")
    )]
    NonConstantString {
        directive: String,
        found: String,
        loc: SourceLocation,
        #[label("not constant")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("unexpected token {found} after {directive} at {loc}")]
    #[diagnostic(
        code(dream::preprocess::trailing_tokens),
        help("Nothing may follow the directive's argument on the same line.")
    )]
    TrailingTokens {
        directive: String,
        found: String,
        loc: SourceLocation,
        #[label("expected end of line")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("{name} includes itself at {loc}")]
    #[diagnostic(
        code(dream::preprocess::recursive_include),
        help("A file cannot be included while it is still being read.")
    )]
    RecursiveInclude {
        name: String,
        loc: SourceLocation,
        #[label("{name} is already open")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("ran out of tokens during {directive} after {loc}")]
    #[diagnostic(
        code(dream::preprocess::unexpected_eof),
        help("The directive must be completed on the line it starts on.")
    )]
    UnexpectedEof {
        directive: String,
        loc: SourceLocation,
        #[label("incomplete directive")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },
}

impl PreprocessError {
    pub fn location(&self) -> &SourceLocation {
        match self {
            PreprocessError::Redefinition { loc, .. }
            | PreprocessError::ExpectedSymbol { loc, .. }
            | PreprocessError::ExpectedString { loc, .. }
            | PreprocessError::NonConstantString { loc, .. }
            | PreprocessError::TrailingTokens { loc, .. }
            | PreprocessError::RecursiveInclude { loc, .. }
            | PreprocessError::UnexpectedEof { loc, .. } => loc,
        }
    }

    fn source_slot(&mut self) -> SourceSlot<'_> {
        match self {
            PreprocessError::Redefinition { loc, src, .. }
            | PreprocessError::ExpectedSymbol { loc, src, .. }
            | PreprocessError::ExpectedString { loc, src, .. }
            | PreprocessError::NonConstantString { loc, src, .. }
            | PreprocessError::TrailingTokens { loc, src, .. }
            | PreprocessError::RecursiveInclude { loc, src, .. }
            | PreprocessError::UnexpectedEof { loc, src, .. } => (loc, src),
        }
    }
}

/// Parse failures. Each carries the token the parser stood on when it gave
/// up (`found`) and the one after it (`next`).
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ParseError {
    #[error("expected {expected} at {loc} but got token {found} (next afterwards is {next})")]
    #[diagnostic(
        code(dream::parse::unexpected_token),
        help("The parser found a token it did not expect in this position.")
    )]
    UnexpectedToken {
        expected: String,
        found: Token,
        next: Token,
        loc: SourceLocation,
        #[label("expected {expected}")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("path {path} is already complete and cannot be extended at {loc}")]
    #[diagnostic(
        code(dream::parse::path_complete),
        help("A path can name at most one of var, proc or verb, and a proc or verb only one name.")
    )]
    PathComplete {
        path: String,
        found: Token,
        next: Token,
        loc: SourceLocation,
        #[label("cannot extend {path}")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("cannot join paths {base} and {relative} at {loc}")]
    #[diagnostic(code(dream::parse::cannot_join))]
    CannotJoin {
        base: String,
        relative: String,
        found: Token,
        next: Token,
        loc: SourceLocation,
        #[label("inside {base}")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("expected type path, not declaration path {path}, at {loc}")]
    #[diagnostic(code(dream::parse::expected_type_path))]
    ExpectedTypePath {
        path: String,
        found: Token,
        next: Token,
        loc: SourceLocation,
        #[label("declaration path")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("path {path} is not a variable definition at {loc}")]
    #[diagnostic(code(dream::parse::expected_var_def))]
    ExpectedVarDef {
        path: String,
        found: Token,
        next: Token,
        loc: SourceLocation,
        #[label("expected var/...")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid use of absolute path {path} at {loc}")]
    #[diagnostic(
        code(dream::parse::absolute_path),
        help("Only a relative path is allowed here.")
    )]
    AbsolutePath {
        path: String,
        found: Token,
        next: Token,
        loc: SourceLocation,
        #[label("absolute path")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("cannot {what} on root at {loc}")]
    #[diagnostic(
        code(dream::parse::root_declaration),
        help("Declarations must be attached to a type such as /obj or /mob.")
    )]
    OnRoot {
        what: String,
        found: Token,
        next: Token,
        loc: SourceLocation,
        #[label("declared on root")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("single-expression statement {expr} instead of call at {loc}")]
    #[diagnostic(
        code(dream::parse::bare_expression),
        help("Only calls and `new` expressions can stand alone as statements.")
    )]
    BareExpression {
        expr: String,
        found: Token,
        next: Token,
        loc: SourceLocation,
        #[label("value is never used")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("duplicate keyword argument {name:?} at {loc}")]
    #[diagnostic(code(dream::parse::duplicate_keyword))]
    DuplicateKeyword {
        name: String,
        found: Token,
        next: Token,
        loc: SourceLocation,
        #[label("{name} was already given")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("unknown input type {name:?} at {loc}")]
    #[diagnostic(
        code(dream::parse::unknown_input_type),
        help("Expected one of text, message, num, icon, sound, file, key, null, mob, obj, turf, area or anything.")
    )]
    UnknownInputType {
        name: String,
        found: Token,
        next: Token,
        loc: SourceLocation,
        #[label("unknown input type")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("unsupported: {what} at {loc}")]
    #[diagnostic(code(dream::parse::unsupported))]
    Unsupported {
        what: String,
        found: Token,
        next: Token,
        loc: SourceLocation,
        #[label("unsupported")]
        span: SourceSpan,
        #[source_code]
        src: Option<NamedSource<String>>,
    },
}

impl ParseError {
    pub fn location(&self) -> &SourceLocation {
        match self {
            ParseError::UnexpectedToken { loc, .. }
            | ParseError::PathComplete { loc, .. }
            | ParseError::CannotJoin { loc, .. }
            | ParseError::ExpectedTypePath { loc, .. }
            | ParseError::ExpectedVarDef { loc, .. }
            | ParseError::AbsolutePath { loc, .. }
            | ParseError::OnRoot { loc, .. }
            | ParseError::BareExpression { loc, .. }
            | ParseError::DuplicateKeyword { loc, .. }
            | ParseError::UnknownInputType { loc, .. }
            | ParseError::Unsupported { loc, .. } => loc,
        }
    }

    /// The token the parser stood on and the one after it.
    pub fn tokens(&self) -> (&Token, &Token) {
        match self {
            ParseError::UnexpectedToken { found, next, .. }
            | ParseError::PathComplete { found, next, .. }
            | ParseError::CannotJoin { found, next, .. }
            | ParseError::ExpectedTypePath { found, next, .. }
            | ParseError::ExpectedVarDef { found, next, .. }
            | ParseError::AbsolutePath { found, next, .. }
            | ParseError::OnRoot { found, next, .. }
            | ParseError::BareExpression { found, next, .. }
            | ParseError::DuplicateKeyword { found, next, .. }
            | ParseError::UnknownInputType { found, next, .. }
            | ParseError::Unsupported { found, next, .. } => (found, next),
        }
    }

    fn source_slot(&mut self) -> SourceSlot<'_> {
        match self {
            ParseError::UnexpectedToken { loc, src, .. }
            | ParseError::PathComplete { loc, src, .. }
            | ParseError::CannotJoin { loc, src, .. }
            | ParseError::ExpectedTypePath { loc, src, .. }
            | ParseError::ExpectedVarDef { loc, src, .. }
            | ParseError::AbsolutePath { loc, src, .. }
            | ParseError::OnRoot { loc, src, .. }
            | ParseError::BareExpression { loc, src, .. }
            | ParseError::DuplicateKeyword { loc, src, .. }
            | ParseError::UnknownInputType { loc, src, .. }
            | ParseError::Unsupported { loc, src, .. } => (loc, src),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Report;

    fn located(file: &str, offset: usize) -> SourceLocation {
        SourceLocation::new(file, 1, offset + 1).at_offset(offset)
    }

    #[test]
    fn test_with_source_matches_file() {
        let loc = located("a.dm", 4);
        let err: DreamError = LexError::UnexpectedCharacter {
            found: '$',
            span: loc.span(),
            loc,
            src: None,
        }
        .into();
        let err = err.with_source(|file| (file == "a.dm").then(|| "x = $\n".to_string()));
        let rendered = format!("{:?}", Report::from(err));
        assert!(rendered.contains("x = $"), "{rendered}");
        assert!(rendered.contains("unexpected character"), "{rendered}");
    }

    #[test]
    fn test_with_source_unknown_file() {
        let loc = located("gone.dm", 0);
        let err: DreamError = IndentationError::MixedTabsAndSpaces {
            span: loc.span(),
            loc,
            src: None,
        }
        .into();
        let err = err.with_source(|_| None);
        let DreamError::Indentation(IndentationError::MixedTabsAndSpaces { src, .. }) = err else {
            panic!("variant changed");
        };
        assert!(src.is_none());
    }

    #[test]
    fn test_io_has_no_location() {
        let err = DreamError::Io {
            file: "x.dm".to_string(),
            message: "denied".to_string(),
        };
        assert!(err.location().is_none());
        assert!(matches!(err.with_source(|_| Some(String::new())), DreamError::Io { .. }));
    }
}
