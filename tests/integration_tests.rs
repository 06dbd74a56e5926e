// Integration tests for dream-core using test fixtures
use dream_core::ast::{DefinitionKind, File};
use dream_core::error::{DreamError, IndentationError, LexError, ParseError, PreprocessError};
use dream_core::{parse_file, FsLoader};
use std::path::PathBuf;

fn fixture_dir(subdir: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join(subdir)
}

fn parse_fixture(subdir: &str, filename: &str) -> Result<File, DreamError> {
    parse_file(FsLoader::new(fixture_dir(subdir)), filename)
}

fn parse_ok(subdir: &str, filename: &str) -> File {
    match parse_fixture(subdir, filename) {
        Ok(file) => file,
        Err(err) => panic!("{filename} should parse: {:?}", miette::Report::from(err)),
    }
}

fn summary(file: &File) -> Vec<String> {
    file.definitions
        .iter()
        .map(|d| match &d.kind {
            DefinitionKind::TypeDefine { path } => format!("define {path}"),
            DefinitionKind::FieldAssign { path, name, value } => {
                format!("assign {path} {name} = {value}")
            }
            DefinitionKind::VarDecl {
                path,
                var_type,
                name,
            } => format!("var {path} {var_type} {name}"),
            DefinitionKind::ProcDecl { path, name } => format!("proc {path} {name}"),
            DefinitionKind::VerbDecl { path, name } => format!("verb {path} {name}"),
            DefinitionKind::Implement {
                path, name, body, ..
            } => format!("implement {path} {name} ({} statements)", body.len()),
        })
        .collect()
}

// Tests for valid files that should parse successfully
mod ok_tests {
    use super::*;

    #[test]
    fn test_player() {
        let file = parse_ok("ok", "player.dm");
        assert_eq!(
            summary(&file),
            vec![
                "define /mob/player",
                "var /mob/player / hp",
                "assign /mob/player hp = 100",
                "verb /mob/player heal",
                "implement /mob/player heal (2 statements)",
            ]
        );
    }

    #[test]
    fn test_game_with_includes() {
        let file = parse_ok("ok/game", "main.dm");
        assert_eq!(file.search_path, vec!["icons", "."]);
        assert_eq!(file.maps, vec!["world.dmm"]);
        assert_eq!(
            summary(&file),
            vec![
                "define /obj",
                "define /obj/item",
                "assign /obj/item icon = Resource('items.dmi')",
                "var /obj/item / weight",
                "assign /obj/item weight = 1",
                "verb /obj/item get",
                "implement /obj/item get (3 statements)",
                "define /obj/item/sword",
                "assign /obj/item/sword weight = 3",
                "var /obj/item/sword / damage",
                "assign /obj/item/sword damage = 30",
                "define /mob",
                "var /mob / hp",
                "assign /mob hp = 10",
                "var /mob /obj/item held",
                "proc /mob attack",
                "implement /mob attack (4 statements)",
                "implement /mob Login (2 statements)",
                "define /world",
                "assign /world name = \"Demo\"",
            ]
        );
    }

    #[test]
    fn test_space_indentation() {
        let file = parse_ok("ok", "spaces.dm");
        assert_eq!(
            summary(&file),
            vec![
                "define /turf",
                "define /turf/floor",
                "assign /turf/floor name = \"floor\"",
                "define /turf/wall",
                "verb /turf/wall knock",
                "implement /turf/wall knock (1 statements)",
            ]
        );
    }

    #[test]
    fn test_comments_only() {
        let file = parse_ok("ok", "empty.dm");
        assert!(file.definitions.is_empty());
    }

    #[test]
    fn test_serializes() {
        let file = parse_ok("ok/game", "main.dm");
        assert!(file.to_json().is_ok(), "Should serialize to JSON");
        assert!(file.to_yaml().is_ok(), "Should serialize to YAML");
    }

    #[test]
    fn test_parsing_twice_is_identical() {
        assert_eq!(parse_ok("ok/game", "main.dm"), parse_ok("ok/game", "main.dm"));
    }
}

// Tests for invalid files that should produce errors
mod err_tests {
    use super::*;

    fn parse_err(filename: &str) -> DreamError {
        match parse_fixture("err", filename) {
            Ok(file) => panic!("{filename} should fail, got {file:?}"),
            Err(err) => err,
        }
    }

    #[test]
    fn test_mixed_indent() {
        assert!(matches!(
            parse_err("mixed_indent.dm"),
            DreamError::Indentation(IndentationError::MixedTabsAndSpaces { .. })
        ));
    }

    #[test]
    fn test_misaligned() {
        assert!(matches!(
            parse_err("misaligned.dm"),
            DreamError::Indentation(IndentationError::MisalignedDedent { .. })
        ));
    }

    #[test]
    fn test_bare_expression() {
        assert!(matches!(
            parse_err("bare_expression.dm"),
            DreamError::Parse(ParseError::BareExpression { .. })
        ));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            parse_err("unterminated_string.dm"),
            DreamError::Lex(LexError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn test_redefine() {
        assert!(matches!(
            parse_err("redefine.dm"),
            DreamError::Preprocess(PreprocessError::Redefinition { .. })
        ));
    }

    #[test]
    fn test_proc_on_root() {
        assert!(matches!(
            parse_err("proc_on_root.dm"),
            DreamError::Parse(ParseError::OnRoot { .. })
        ));
    }

    #[test]
    fn test_unknown_directive() {
        assert!(matches!(
            parse_err("unknown_directive.dm"),
            DreamError::Lex(LexError::UnknownDirective { .. })
        ));
    }

    #[test]
    fn test_duplicate_keyword() {
        assert!(matches!(
            parse_err("duplicate_keyword.dm"),
            DreamError::Parse(ParseError::DuplicateKeyword { .. })
        ));
    }

    #[test]
    fn test_include_cycle() {
        assert!(matches!(
            parse_err("cycle.dm"),
            DreamError::Preprocess(PreprocessError::RecursiveInclude { ref name, .. }) if name == "cycle.dm"
        ));
    }

    #[test]
    fn test_report_shows_fixture_source() {
        let err = parse_err("bare_expression.dm");
        let rendered = format!("{:?}", miette::Report::from(err));
        assert!(rendered.contains("bare_expression.dm"), "{rendered}");
        assert!(rendered.contains("value is never used"), "{rendered}");
    }

    #[test]
    fn test_errors_carry_location() {
        let err = parse_err("bare_expression.dm");
        let rendered = err.to_string();
        assert!(rendered.contains("bare_expression.dm:2:"), "{rendered}");
    }
}
