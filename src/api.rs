use crate::ast::File;
use crate::error::DreamError;
use crate::indent::Indenter;
use crate::lexer::{Lexer, Token};
use crate::parser::Parser;
use crate::preprocessor::{FileLoader, Preprocessor, TokenStream};
use log::debug;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::iter;
use std::path::PathBuf;

/// Tokenizes `source` and translates its indentation, as one file's stream.
///
/// Tokens are produced as they are pulled; a lexical error ends the stream.
pub fn token_stream(file: &str, source: impl Into<String>) -> TokenStream {
    Box::new(Indenter::new(Lexer::from_string(file, source.into())))
}

/// Loads files from a directory on disk. Names are resolved against `root`.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

impl Default for FsLoader {
    fn default() -> Self {
        Self::new(".")
    }
}

impl FileLoader for FsLoader {
    fn load(&mut self, name: &str) -> TokenStream {
        let path = self.root.join(name);
        match std::fs::read_to_string(&path) {
            Ok(source) => {
                debug!("loaded {} ({} bytes)", path.display(), source.len());
                token_stream(name, source)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("{} does not exist, skipping", path.display());
                Box::new(iter::empty())
            }
            Err(err) => Box::new(iter::once(Err(DreamError::Io {
                file: path.display().to_string(),
                message: err.to_string(),
            }))),
        }
    }

    fn source(&self, name: &str) -> Option<String> {
        std::fs::read_to_string(self.root.join(name)).ok()
    }
}

/// Serves sources from memory, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.files.insert(name.into(), source.into());
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }
}

impl FileLoader for MemoryLoader {
    fn load(&mut self, name: &str) -> TokenStream {
        match self.files.get(name) {
            Some(source) => token_stream(name, source.as_str()),
            None => Box::new(iter::empty()),
        }
    }

    fn source(&self, name: &str) -> Option<String> {
        self.files.get(name).cloned()
    }
}

/// Lends a loader to one parse while the caller keeps it.
struct LentLoader<'a, L>(&'a mut L);

impl<L: FileLoader> FileLoader for LentLoader<'_, L> {
    fn load(&mut self, name: &str) -> TokenStream {
        self.0.load(name)
    }

    fn source(&self, name: &str) -> Option<String> {
        self.0.source(name)
    }
}

/// Parses `name` and everything it includes.
///
/// # Errors
/// Returns the first lexical, indentation, preprocessing, IO or parse error.
pub fn parse_file<L: FileLoader>(loader: L, name: &str) -> Result<File, DreamError> {
    debug!("parsing {name}");
    let mut parser = Parser::new(Preprocessor::new(loader, name));
    let definitions = match parser.parse_definitions() {
        Ok(definitions) => definitions,
        Err(err) => {
            let preprocessor = parser.into_inner();
            return Err(err.with_source(|file| preprocessor.loader().source(file)));
        }
    };
    let (search_path, maps) = parser.into_inner().into_parts();
    debug!("parsed {name}: {} definition(s)", definitions.len());
    Ok(File {
        definitions,
        search_path,
        maps,
    })
}

/// Parses several compilation roots with one loader and merges the results
/// in order.
///
/// # Errors
/// Stops at the first file that fails to parse.
pub fn parse_files<L, S>(mut loader: L, names: impl IntoIterator<Item = S>) -> Result<File, DreamError>
where
    L: FileLoader,
    S: AsRef<str>,
{
    let mut total = File::new();
    for name in names {
        let single = parse_file(LentLoader(&mut loader), name.as_ref())?;
        total.extend(single);
    }
    Ok(total)
}

/// Parses a single in-memory source with no includes available.
///
/// # Errors
/// Returns the first error in `source`.
pub fn parse_source(name: &str, source: &str) -> Result<File, DreamError> {
    parse_file(MemoryLoader::new().with(name, source), name)
}

/// Runs everything but the parser: the merged, preprocessed token stream.
///
/// # Errors
/// Returns the first lexical, indentation, preprocessing or IO error.
pub fn tokenize_file<L: FileLoader>(loader: L, name: &str) -> Result<Vec<Token>, DreamError> {
    let mut preprocessor = Preprocessor::new(loader, name);
    preprocessor
        .by_ref()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| err.with_source(|file| preprocessor.loader().source(file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::DefinitionKind;
    use crate::lexer::TokenType;
    use tempfile::tempdir;

    #[test]
    fn test_parse_source() {
        let file = parse_source("main.dm", "/obj\n#define FILE_DIR \"icons\"\n").unwrap();
        assert_eq!(file.definitions.len(), 1);
        assert_eq!(file.search_path, vec!["icons"]);
    }

    #[test]
    fn test_token_stream_reports_lex_errors() {
        let items: Vec<_> = token_stream("bad.dm", "a $").collect();
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[0], Ok(t) if t.ttype == TokenType::Symbol("a".to_string())));
        assert!(matches!(items[1], Err(DreamError::Lex(_))));
    }

    #[test]
    fn test_memory_loader_includes() {
        let loader = MemoryLoader::new()
            .with("main.dm", "#include \"obj.dm\"\n/mob\n")
            .with("obj.dm", "/obj\n");
        let file = parse_file(loader, "main.dm").unwrap();
        let paths: Vec<String> = file.definitions.iter().map(|d| d.path().to_string()).collect();
        assert_eq!(paths, vec!["/obj", "/mob"]);
    }

    #[test]
    fn test_closure_loader() {
        let loader = |name: &str| -> TokenStream { token_stream(name, "/turf\n") };
        let file = parse_file(loader, "anything.dm").unwrap();
        assert!(matches!(
            &file.definitions[0].kind,
            DefinitionKind::TypeDefine { path } if path.to_string() == "/turf"
        ));
    }

    #[test]
    fn test_fs_loader() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("main.dm"), "#include \"sub.dm\"\n#include \"map.dmm\"\n").unwrap();
        std::fs::write(dir.path().join("sub.dm"), "/area\n").unwrap();

        let file = parse_file(FsLoader::new(dir.path()), "main.dm").unwrap();
        assert_eq!(file.definitions.len(), 1);
        assert_eq!(file.maps, vec!["map.dmm"]);
    }

    #[test]
    fn test_fs_loader_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let file = parse_file(FsLoader::new(dir.path()), "nope.dm").unwrap();
        assert!(file.definitions.is_empty());
    }

    #[test]
    fn test_fs_loader_unreadable_file() {
        let dir = tempdir().unwrap();
        // a directory cannot be read as a file
        std::fs::create_dir(dir.path().join("folder.dm")).unwrap();
        let err = parse_file(FsLoader::new(dir.path()), "folder.dm").unwrap_err();
        assert!(matches!(err, DreamError::Io { .. }));
    }

    #[test]
    fn test_parse_files_merges_in_order() {
        let loader = MemoryLoader::new()
            .with("a.dm", "/obj\n#define FILE_DIR \"a\"\n")
            .with("b.dm", "/mob\n#define FILE_DIR \"b\"\n");
        let file = parse_files(loader, ["a.dm", "b.dm"]).unwrap();
        let paths: Vec<String> = file.definitions.iter().map(|d| d.path().to_string()).collect();
        assert_eq!(paths, vec!["/obj", "/mob"]);
        assert_eq!(file.search_path, vec!["a", "b"]);
    }

    #[test]
    fn test_tokenize_file() {
        let loader = MemoryLoader::new().with("main.dm", "#define N 3\na = N\n");
        let tokens = tokenize_file(loader, "main.dm").unwrap();
        let types: Vec<TokenType> = tokens.into_iter().map(|t| t.ttype).collect();
        assert_eq!(
            types,
            vec![
                TokenType::Symbol("a".to_string()),
                TokenType::SetEqual,
                TokenType::Integer(3),
                TokenType::Newline
            ]
        );
    }

    #[test]
    fn test_errors_carry_source_text() {
        let err = parse_source("main.dm", "/mob/proc/f()\n\tx.y\n").unwrap_err();
        let DreamError::Parse(crate::error::ParseError::BareExpression { ref src, .. }) = err else {
            panic!("expected a bare expression, got {err:?}");
        };
        assert!(src.is_some());
        let rendered = format!("{:?}", miette::Report::from(err));
        assert!(rendered.contains("x.y"), "{rendered}");
    }

    #[test]
    fn test_errors_in_included_file_show_that_file() {
        let loader = MemoryLoader::new()
            .with("main.dm", "#include \"bad.dm\"\n")
            .with("bad.dm", "/obj\n\tname = $\n");
        let err = parse_file(loader, "main.dm").unwrap_err();
        assert_eq!(err.location().map(|l| l.file.as_str()), Some("bad.dm"));
        let rendered = format!("{:?}", miette::Report::from(err));
        assert!(rendered.contains("name = $"), "{rendered}");
    }

    #[test]
    fn test_closure_loader_has_no_source() {
        let loader = |name: &str| -> TokenStream { token_stream(name, "/mob/proc/f()\n\t5\n") };
        let err = parse_file(loader, "main.dm").unwrap_err();
        assert!(matches!(
            err,
            DreamError::Parse(crate::error::ParseError::BareExpression { src: None, .. })
        ));
    }

    #[test]
    fn test_include_cycle_ends() {
        let loader = MemoryLoader::new().with("a.dm", "#include \"a.dm\"\n");
        let err = parse_file(loader, "a.dm").unwrap_err();
        assert!(matches!(
            err,
            DreamError::Preprocess(crate::error::PreprocessError::RecursiveInclude { .. })
        ));
    }
}
