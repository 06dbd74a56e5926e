use crate::lexer::SourceLocation;
use crate::path::TypePath;
use serde::Serialize;
use std::fmt;

#[derive(Debug, PartialEq, Clone, Default, Serialize)]
pub struct File {
    pub definitions: Vec<Definition>,
    pub search_path: Vec<String>,
    pub maps: Vec<String>,
}

impl File {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends everything from `other`, keeping source order.
    pub fn extend(&mut self, other: File) {
        self.definitions.extend(other.definitions);
        self.search_path.extend(other.search_path);
        self.maps.extend(other.maps);
    }
}

// --- Definitions ---

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct Definition {
    #[serde(flatten)]
    pub kind: DefinitionKind,
    pub loc: SourceLocation,
}

/// A top-level item. Every variant is anchored at `path`, the type it
/// belongs to.
#[derive(Debug, PartialEq, Clone, Serialize)]
#[serde(tag = "definition", rename_all = "snake_case")]
pub enum DefinitionKind {
    TypeDefine {
        path: TypePath,
    },
    FieldAssign {
        path: TypePath,
        name: String,
        value: Expression,
    },
    VarDecl {
        path: TypePath,
        var_type: TypePath,
        name: String,
    },
    ProcDecl {
        path: TypePath,
        name: String,
    },
    VerbDecl {
        path: TypePath,
        name: String,
    },
    Implement {
        path: TypePath,
        name: String,
        args: Vec<TypedName>,
        body: Vec<Statement>,
    },
}

impl Definition {
    pub fn new(kind: DefinitionKind, loc: SourceLocation) -> Self {
        Self { kind, loc }
    }

    pub fn path(&self) -> &TypePath {
        match &self.kind {
            DefinitionKind::TypeDefine { path }
            | DefinitionKind::FieldAssign { path, .. }
            | DefinitionKind::VarDecl { path, .. }
            | DefinitionKind::ProcDecl { path, .. }
            | DefinitionKind::VerbDecl { path, .. }
            | DefinitionKind::Implement { path, .. } => path,
        }
    }
}

/// A declared procedure argument, such as `mob/M as mob`.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct TypedName {
    /// Absolute; `/` when the argument is untyped.
    pub type_path: TypePath,
    pub name: String,
    pub input_type: Option<InputType>,
}

/// The filter a verb argument declares with `as`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    Message,
    Num,
    Icon,
    Sound,
    File,
    Key,
    Null,
    Mob,
    Obj,
    Turf,
    Area,
    Anything,
}

impl InputType {
    pub fn from_name(name: &str) -> Option<Self> {
        let input = match name {
            "text" => InputType::Text,
            "message" => InputType::Message,
            "num" => InputType::Num,
            "icon" => InputType::Icon,
            "sound" => InputType::Sound,
            "file" => InputType::File,
            "key" => InputType::Key,
            "null" => InputType::Null,
            "mob" => InputType::Mob,
            "obj" => InputType::Obj,
            "turf" => InputType::Turf,
            "area" => InputType::Area,
            "anything" => InputType::Anything,
            _ => return None,
        };
        Some(input)
    }

    pub fn name(self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Message => "message",
            InputType::Num => "num",
            InputType::Icon => "icon",
            InputType::Sound => "sound",
            InputType::File => "file",
            InputType::Key => "key",
            InputType::Null => "null",
            InputType::Mob => "mob",
            InputType::Obj => "obj",
            InputType::Turf => "turf",
            InputType::Area => "area",
            InputType::Anything => "anything",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// --- Statements ---

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct Statement {
    #[serde(flatten)]
    pub kind: StatementKind,
    pub loc: SourceLocation,
}

#[derive(Debug, PartialEq, Clone, Serialize)]
#[serde(tag = "statement", rename_all = "snake_case")]
pub enum StatementKind {
    /// `dest << value`
    Write { dest: Expression, value: Expression },
    If {
        condition: Expression,
        body: Vec<Statement>,
    },
    Return,
    /// `set name in value`
    SetIn { name: String, value: Expression },
    /// `set name = value`
    SetTo { name: String, value: Expression },
    /// A call or `new` evaluated for its effect.
    Evaluate { expr: Expression },
    Assign { dest: Expression, value: Expression },
    Del { expr: Expression },
    /// `for (var/T name in expr)`; without `in` the loop runs over the world.
    ForList {
        var_type: TypePath,
        name: String,
        in_expr: Option<Expression>,
        body: Vec<Statement>,
    },
}

impl Statement {
    pub fn new(kind: StatementKind, loc: SourceLocation) -> Self {
        Self { kind, loc }
    }
}

// --- Expressions ---

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct Expression {
    #[serde(flatten)]
    pub kind: ExpressionKind,
    pub loc: SourceLocation,
}

#[derive(Debug, PartialEq, Clone, Serialize)]
#[serde(tag = "expression", rename_all = "snake_case")]
pub enum ExpressionKind {
    ResourceLiteral {
        name: String,
    },
    PathLiteral {
        path: TypePath,
    },
    IntegerLiteral {
        value: i64,
    },
    StringLiteral {
        value: String,
    },
    /// An interpolated value, prefixed with the text macro (`The` or `the`)
    /// that decides how an object's name is articled.
    StringMacro {
        macro_name: String,
        expr: Box<Expression>,
    },
    StringConcat {
        parts: Vec<Expression>,
    },
    GetLocal {
        name: String,
    },
    GetNonLocal {
        name: String,
    },
    GetField {
        expr: Box<Expression>,
        field: String,
    },
    BooleanNot {
        expr: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        args: Vec<Argument>,
    },
    New {
        path: TypePath,
        args: Vec<Argument>,
    },
}

impl Expression {
    pub fn new(kind: ExpressionKind, loc: SourceLocation) -> Self {
        Self { kind, loc }
    }

    /// Whether the expression may stand alone as a statement.
    pub fn has_side_effects(&self) -> bool {
        matches!(
            self.kind,
            ExpressionKind::Call { .. } | ExpressionKind::New { .. }
        )
    }
}

/// A call argument, positional or `keyword = value`.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct Argument {
    pub keyword: Option<String>,
    pub value: Expression,
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Argument]) -> fmt::Result {
    f.write_str("[")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        if let Some(keyword) = &arg.keyword {
            write!(f, "{keyword}=")?;
        }
        write!(f, "{}", arg.value)?;
    }
    f.write_str("]")
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExpressionKind::ResourceLiteral { name } => write!(f, "Resource('{name}')"),
            ExpressionKind::PathLiteral { path } => write!(f, "Path({path})"),
            ExpressionKind::IntegerLiteral { value } => write!(f, "{value}"),
            ExpressionKind::StringLiteral { value } => write!(f, "{value:?}"),
            ExpressionKind::StringMacro { macro_name, expr } => {
                write!(f, "Macro({macro_name}, {expr})")
            }
            ExpressionKind::StringConcat { parts } => {
                f.write_str("Concat(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{part}")?;
                }
                f.write_str(")")
            }
            ExpressionKind::GetLocal { name } => write!(f, "GetLocal({name})"),
            ExpressionKind::GetNonLocal { name } => write!(f, "GetNonLocal({name})"),
            ExpressionKind::GetField { expr, field } => write!(f, "GetField({expr}, {field})"),
            ExpressionKind::BooleanNot { expr } => write!(f, "Not({expr})"),
            ExpressionKind::Call { callee, args } => {
                write!(f, "Call({callee}, ")?;
                write_args(f, args)?;
                f.write_str(")")
            }
            ExpressionKind::New { path, args } => {
                write!(f, "New({path}, ")?;
                write_args(f, args)?;
                f.write_str(")")
            }
        }
    }
}
