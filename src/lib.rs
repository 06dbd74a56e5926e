pub mod api;
pub mod ast;
pub mod dump;
pub mod error;
pub mod indent;
pub mod lexer;
pub mod parser;
pub mod path;
pub mod preprocessor;
pub mod scanner;

pub use api::{parse_file, parse_files, parse_source, tokenize_file, FsLoader, MemoryLoader};
pub use error::DreamError;
pub use preprocessor::{FileLoader, TokenStream};
