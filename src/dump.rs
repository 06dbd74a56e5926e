//! Human-readable dumps of tokens and parsed files, plus JSON and YAML
//! serialization of the AST.

use crate::ast::{Definition, DefinitionKind, File, Statement, StatementKind};
use crate::lexer::Token;
use std::fmt::{self, Write};

fn indent(out: &mut impl Write, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        out.write_char('\t')?;
    }
    Ok(())
}

/// Writes one token per line between begin and end markers.
pub fn dump_tokens(tokens: &[Token], out: &mut impl Write) -> fmt::Result {
    writeln!(out, "[beginning of token dump]")?;
    for token in tokens {
        writeln!(out, "{}: {}", token.loc, token.ttype)?;
    }
    writeln!(out, "[end of token dump]")
}

fn dump_statements(
    out: &mut impl Write,
    header: &str,
    depth: usize,
    statements: &[Statement],
) -> fmt::Result {
    indent(out, depth)?;
    writeln!(out, "[{header} len={}]", statements.len())?;
    for statement in statements {
        dump_statement(out, depth + 1, statement)?;
    }
    Ok(())
}

fn field(out: &mut impl Write, depth: usize, name: &str, value: &dyn fmt::Display) -> fmt::Result {
    indent(out, depth)?;
    writeln!(out, "{name} = {value}")
}

fn dump_statement(out: &mut impl Write, depth: usize, statement: &Statement) -> fmt::Result {
    let inner = depth + 1;
    indent(out, depth)?;
    match &statement.kind {
        StatementKind::Write { dest, value } => {
            writeln!(out, "[statement write]")?;
            field(out, inner, "to", dest)?;
            field(out, inner, "from", value)
        }
        StatementKind::If { condition, body } => {
            writeln!(out, "[statement if]")?;
            field(out, inner, "from", condition)?;
            dump_statements(out, "body", depth + 1, body)
        }
        StatementKind::Return => writeln!(out, "[statement return]"),
        StatementKind::SetIn { name, value } => {
            writeln!(out, "[statement set-in]")?;
            field(out, inner, "name", &format!("{name:?}"))?;
            field(out, inner, "from", value)
        }
        StatementKind::SetTo { name, value } => {
            writeln!(out, "[statement set-to]")?;
            field(out, inner, "name", &format!("{name:?}"))?;
            field(out, inner, "from", value)
        }
        StatementKind::Evaluate { expr } => {
            writeln!(out, "[statement evaluate]")?;
            field(out, inner, "from", expr)
        }
        StatementKind::Assign { dest, value } => {
            writeln!(out, "[statement assign]")?;
            field(out, inner, "to", dest)?;
            field(out, inner, "from", value)
        }
        StatementKind::Del { expr } => {
            writeln!(out, "[statement del]")?;
            field(out, inner, "from", expr)
        }
        StatementKind::ForList {
            var_type,
            name,
            in_expr,
            body,
        } => {
            writeln!(out, "[statement for-list]")?;
            field(out, inner, "name", &format!("{name:?}"))?;
            field(out, inner, "path", var_type)?;
            if let Some(in_expr) = in_expr {
                field(out, inner, "from", in_expr)?;
            }
            dump_statements(out, "body", depth + 1, body)
        }
    }
}

fn dump_definition(out: &mut impl Write, definition: &Definition) -> fmt::Result {
    let label = match &definition.kind {
        DefinitionKind::TypeDefine { .. } => "define",
        DefinitionKind::FieldAssign { .. } => "assign",
        DefinitionKind::VarDecl { .. } => "vardef",
        DefinitionKind::ProcDecl { .. } => "procdecl",
        DefinitionKind::VerbDecl { .. } => "verbdecl",
        DefinitionKind::Implement { .. } => "implement",
    };
    writeln!(out, "[definition {label}]")?;
    writeln!(out, "\tpath = {}", definition.path())?;
    match &definition.kind {
        DefinitionKind::TypeDefine { .. } => Ok(()),
        DefinitionKind::FieldAssign { name, value, .. } => {
            writeln!(out, "\tvariable = {name}")?;
            writeln!(out, "\texpression = {value}")
        }
        DefinitionKind::VarDecl { var_type, name, .. } => {
            writeln!(out, "\tvartype = {var_type}")?;
            writeln!(out, "\tvariable = {name}")
        }
        DefinitionKind::ProcDecl { name, .. } | DefinitionKind::VerbDecl { name, .. } => {
            writeln!(out, "\tvariable = {name}")
        }
        DefinitionKind::Implement {
            name, args, body, ..
        } => {
            writeln!(out, "\tvariable = {name}")?;
            if !args.is_empty() {
                writeln!(out, "\t[arguments {}]", args.len())?;
                for (i, arg) in args.iter().enumerate() {
                    write!(out, "\t\t[{i}] {}: {}", arg.name, arg.type_path)?;
                    if let Some(input_type) = arg.input_type {
                        write!(out, " as {input_type}")?;
                    }
                    writeln!(out)?;
                }
            }
            if body.is_empty() {
                return Ok(());
            }
            dump_statements(out, "statements", 1, body)
        }
    }
}

impl File {
    /// Writes an indented text tree of the file's contents.
    pub fn dump(&self, out: &mut impl Write) -> fmt::Result {
        writeln!(out, "[beginning of parser dump]")?;
        for dir in &self.search_path {
            writeln!(out, "searchpath = {dir:?}")?;
        }
        for map in &self.maps {
            writeln!(out, "map = {map:?}")?;
        }
        for definition in &self.definitions {
            dump_definition(out, definition)?;
        }
        writeln!(out, "[end of parser dump]")
    }

    #[must_use]
    pub fn dump_string(&self) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = self.dump(&mut out);
        out
    }

    /// Serializes the file into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serializes the file into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
