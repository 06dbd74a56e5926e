use dream_core::dump::dump_tokens;
use dream_core::{parse_file, tokenize_file, FsLoader};
use std::path::Path;

fn main() {
    let Some(arg) = std::env::args().nth(1) else {
        eprintln!("usage: dump <file.dm>");
        std::process::exit(2);
    };
    let path = Path::new(&arg);
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let tokens = match tokenize_file(FsLoader::new(dir), &name) {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("{:?}", miette::Report::from(e));
            std::process::exit(1);
        }
    };
    let mut out = String::new();
    if dump_tokens(&tokens, &mut out).is_ok() {
        print!("{out}");
    }

    match parse_file(FsLoader::new(dir), &name) {
        Ok(file) => print!("{}", file.dump_string()),
        Err(e) => {
            eprintln!("{:?}", miette::Report::from(e));
            std::process::exit(1);
        }
    }
}
