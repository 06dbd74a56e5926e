use crate::ast::*;
use crate::error::{DreamError, ParseError};
use crate::lexer::{SourceLocation, Token, TokenType};
use crate::path::{DeclKind, DeclPath, TypePath};
use log::trace;
use std::collections::VecDeque;

/// Local names visible at the current point of a procedure body.
///
/// Names are pushed when a body or loop is entered and truncated back to a
/// [`Scope::mark`] when it is left, so shadowed names reappear intact.
#[derive(Debug, Default, Clone)]
pub struct Scope {
    names: Vec<String>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn push(&mut self, name: impl Into<String>) {
        self.names.push(name.into());
    }

    pub fn mark(&self) -> usize {
        self.names.len()
    }

    pub fn restore(&mut self, mark: usize) {
        self.names.truncate(mark);
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A recursive descent parser over structural tokens, as produced by
/// [`crate::indent::Indenter`] and merged by [`crate::preprocessor::Preprocessor`].
///
/// Tokens are pulled lazily; errors from the token source end the parse.
pub struct Parser<I: Iterator<Item = Result<Token, DreamError>>> {
    input: I,
    lookahead: VecDeque<Token>,
    scope: Scope,
    last_loc: SourceLocation,
}

impl<I: Iterator<Item = Result<Token, DreamError>>> Parser<I> {
    pub fn new(input: I) -> Self {
        Self {
            input,
            lookahead: VecDeque::new(),
            scope: Scope::new(),
            last_loc: SourceLocation::default(),
        }
    }

    /// Gives back the token source, for reading what it collected.
    pub fn into_inner(self) -> I {
        self.input
    }

    // === Main Parsing Methods ===

    ///    File ::= { Newline | Block }
    pub fn parse_definitions(&mut self) -> Result<Vec<Definition>, DreamError> {
        let mut definitions = Vec::new();
        loop {
            while self.match_token(&TokenType::Newline)? {}
            if self.current()?.is_none() {
                break;
            }
            definitions.extend(self.parse_block(&DeclPath::root())?);
        }
        Ok(definitions)
    }

    /// Parses the whole input into a [`File`]. The search path and map list
    /// are left empty; they belong to whoever resolved the includes.
    pub fn parse_file(&mut self) -> Result<File, DreamError> {
        Ok(File {
            definitions: self.parse_definitions()?,
            ..File::default()
        })
    }

    ///    Block ::= Newline
    ///            | DeclPath ( VarTail | FunctionTail | Newline [ Nested ] | "=" Expr Newline )
    fn parse_block(&mut self, base: &DeclPath) -> Result<Vec<Definition>, DreamError> {
        if self.match_token(&TokenType::Newline)? {
            return Ok(Vec::new());
        }
        let loc = self.current()?.loc;
        let relative = self.parse_decl_path()?;
        let Some(path) = base.join(&relative) else {
            let (found, next) = self.context()?;
            return Err(ParseError::CannotJoin {
                base: base.to_string(),
                relative: relative.to_string(),
                found,
                next,
                span: loc.span(),
                loc,
                src: None,
            }
            .into());
        };
        trace!("block {path} at {loc}");

        if path.is_var_def() {
            return self.parse_var_tail(&path, loc);
        }
        if path.is_proc_def() || path.is_verb_def() {
            return self.parse_function_tail(&path, loc);
        }
        if !path.is_plain() {
            // `var`, `proc` or `obj/verb` on its own only opens a block
            self.expect(&TokenType::Newline)?;
            if self.check(&TokenType::Indent)? {
                return self.parse_nested(&path);
            }
            return Ok(Vec::new());
        }

        let plain = path.prefix.clone();
        if self.match_token(&TokenType::SetEqual)? {
            let (owner, name) = self.split_member(&plain, "assign variable", &loc)?;
            let value = self.parse_expression()?;
            self.expect(&TokenType::Newline)?;
            let kind = DefinitionKind::FieldAssign {
                path: owner,
                name,
                value,
            };
            return Ok(vec![Definition::new(kind, loc)]);
        }
        if self.check(&TokenType::ParenOpen)? {
            let (owner, name) = self.split_member(&plain, "implement function", &loc)?;
            let (args, body) = self.parse_function()?;
            let kind = DefinitionKind::Implement {
                path: owner,
                name,
                args,
                body,
            };
            return Ok(vec![Definition::new(kind, loc)]);
        }
        self.expect(&TokenType::Newline)?;
        let mut definitions = vec![Definition::new(
            DefinitionKind::TypeDefine { path: plain },
            loc,
        )];
        if self.check(&TokenType::Indent)? {
            definitions.extend(self.parse_nested(&path)?);
        }
        Ok(definitions)
    }

    ///    Nested ::= Indent { Block } Unindent Newline
    fn parse_nested(&mut self, base: &DeclPath) -> Result<Vec<Definition>, DreamError> {
        self.expect(&TokenType::Indent)?;
        let mut definitions = Vec::new();
        while !self.check(&TokenType::Unindent)? {
            definitions.extend(self.parse_block(base)?);
        }
        self.expect(&TokenType::Unindent)?;
        self.expect(&TokenType::Newline)?;
        Ok(definitions)
    }

    ///    VarTail ::= "=" Expr Newline | Newline
    fn parse_var_tail(
        &mut self,
        path: &DeclPath,
        loc: SourceLocation,
    ) -> Result<Vec<Definition>, DreamError> {
        let Some((owner, var_type, name)) = path.split_def() else {
            let (found, next) = self.context()?;
            return Err(ParseError::ExpectedVarDef {
                path: path.to_string(),
                found,
                next,
                span: loc.span(),
                loc,
                src: None,
            }
            .into());
        };
        let decl = Definition::new(
            DefinitionKind::VarDecl {
                path: owner.clone(),
                var_type: var_type.unwrap_or_else(TypePath::root),
                name: name.clone(),
            },
            loc.clone(),
        );
        if self.match_token(&TokenType::SetEqual)? {
            let value = self.parse_expression()?;
            self.expect(&TokenType::Newline)?;
            let assign = Definition::new(
                DefinitionKind::FieldAssign {
                    path: owner,
                    name,
                    value,
                },
                loc,
            );
            return Ok(vec![decl, assign]);
        }
        if self.check(&TokenType::ParenOpen)? {
            let (found, next) = self.context()?;
            return Err(ParseError::Unsupported {
                what: format!("arguments on variable {path}"),
                span: found.loc.span(),
                loc: found.loc.clone(),
                found,
                next,
                src: None,
            }
            .into());
        }
        self.expect(&TokenType::Newline)?;
        Ok(vec![decl])
    }

    ///    FunctionTail ::= Arguments Newline StatementBlock
    fn parse_function_tail(
        &mut self,
        path: &DeclPath,
        loc: SourceLocation,
    ) -> Result<Vec<Definition>, DreamError> {
        let Some((owner, _, name)) = path.split_def() else {
            return self.err_unexpected("procedure name");
        };
        if owner.segments.is_empty() {
            let (found, next) = self.context()?;
            return Err(ParseError::OnRoot {
                what: "declare function".to_string(),
                found,
                next,
                span: loc.span(),
                loc,
                src: None,
            }
            .into());
        }
        let (args, body) = self.parse_function()?;
        let decl = if path.kind == DeclKind::Verb {
            DefinitionKind::VerbDecl {
                path: owner.clone(),
                name: name.clone(),
            }
        } else {
            DefinitionKind::ProcDecl {
                path: owner.clone(),
                name: name.clone(),
            }
        };
        Ok(vec![
            Definition::new(decl, loc.clone()),
            Definition::new(
                DefinitionKind::Implement {
                    path: owner,
                    name,
                    args,
                    body,
                },
                loc,
            ),
        ])
    }

    fn split_member(
        &mut self,
        path: &TypePath,
        what: &str,
        loc: &SourceLocation,
    ) -> Result<(TypePath, String), DreamError> {
        match path.split_last() {
            Some((owner, name)) if !owner.segments.is_empty() => Ok((owner, name.to_string())),
            _ => {
                let (found, next) = self.context()?;
                Err(ParseError::OnRoot {
                    what: what.to_string(),
                    found,
                    next,
                    loc: loc.clone(),
                    span: loc.span(),
                    src: None,
                }
                .into())
            }
        }
    }

    /// Parses an argument list and body. The body sees the arguments plus
    /// `src` and `usr`.
    fn parse_function(&mut self) -> Result<(Vec<TypedName>, Vec<Statement>), DreamError> {
        let args = self.parse_function_arguments()?;
        self.expect(&TokenType::Newline)?;
        let mark = self.scope.mark();
        for arg in &args {
            self.scope.push(arg.name.clone());
        }
        self.scope.push("src");
        self.scope.push("usr");
        let body = self.parse_statement_block();
        self.scope.restore(mark);
        Ok((args, body?))
    }

    ///    Arguments ::= "(" [ TypedName { "," TypedName } ] ")"
    ///    TypedName ::= [ "var" "/" ] Path [ "as" InputType ]
    fn parse_function_arguments(&mut self) -> Result<Vec<TypedName>, DreamError> {
        self.expect(&TokenType::ParenOpen)?;
        let mut args = Vec::new();
        if self.match_token(&TokenType::ParenClose)? {
            return Ok(args);
        }
        loop {
            let loc = self.current()?.loc;
            if self.check(&TokenType::Var)? && self.peek_is(1, &TokenType::Slash)? {
                self.advance()?;
                self.advance()?;
            }
            if self.check(&TokenType::Slash)? {
                let path = self.parse_path()?;
                let (found, next) = self.context()?;
                return Err(ParseError::AbsolutePath {
                    path: path.to_string(),
                    found,
                    next,
                    span: loc.span(),
                    loc,
                    src: None,
                }
                .into());
            }
            // written without a leading slash, but always absolute
            let path = TypePath::root().join(&self.parse_path()?);
            let Some((type_path, name)) = path.split_last() else {
                return self.err_unexpected("argument name");
            };
            let input_type = if self.match_token(&TokenType::As)? {
                Some(self.parse_input_type()?)
            } else {
                None
            };
            args.push(TypedName {
                type_path,
                name: name.to_string(),
                input_type,
            });
            if !self.match_token(&TokenType::Comma)? {
                break;
            }
        }
        self.expect(&TokenType::ParenClose)?;
        Ok(args)
    }

    fn parse_input_type(&mut self) -> Result<InputType, DreamError> {
        let token = self.current()?;
        let TokenType::Symbol(name) = &token.ttype else {
            return self.err_unexpected("input type");
        };
        let Some(input) = InputType::from_name(name) else {
            let name = name.clone();
            let (found, next) = self.context()?;
            return Err(ParseError::UnknownInputType {
                name,
                found,
                next,
                span: token.loc.span(),
                loc: token.loc,
                src: None,
            }
            .into());
        };
        self.advance()?;
        Ok(input)
    }

    // === Paths ===

    ///    DeclPath ::= [ "/" ] Segment { "/" Segment }
    ///    Segment ::= Symbol | "var" | "proc" | "verb"
    fn parse_decl_path(&mut self) -> Result<DeclPath, DreamError> {
        let mut path = if self.match_token(&TokenType::Slash)? {
            DeclPath::root()
        } else {
            DeclPath::empty()
        };
        loop {
            let token = self.current()?;
            let kind = match &token.ttype {
                TokenType::Symbol(_) => DeclKind::Plain,
                TokenType::Var => DeclKind::Var,
                TokenType::Proc => DeclKind::Proc,
                TokenType::Verb => DeclKind::Verb,
                _ => return self.err_unexpected("path segment"),
            };
            let allowed = if kind == DeclKind::Plain {
                path.can_add()
            } else {
                path.can_add_decl()
            };
            if !allowed {
                let next = self.peek(1)?;
                return Err(ParseError::PathComplete {
                    path: path.to_string(),
                    span: token.loc.span(),
                    loc: token.loc.clone(),
                    found: token,
                    next,
                    src: None,
                }
                .into());
            }
            path = match token.ttype {
                TokenType::Symbol(segment) => path.add(&segment),
                _ => path.add_decl(kind),
            };
            self.advance()?;
            if !self.match_token(&TokenType::Slash)? {
                break;
            }
        }
        Ok(path)
    }

    fn parse_path(&mut self) -> Result<TypePath, DreamError> {
        let loc = self.current()?.loc;
        let decl = self.parse_decl_path()?;
        match decl.as_type_path() {
            Some(path) => Ok(path.clone()),
            None => {
                let (found, next) = self.context()?;
                Err(ParseError::ExpectedTypePath {
                    path: decl.to_string(),
                    found,
                    next,
                    span: loc.span(),
                    loc,
                    src: None,
                }
                .into())
            }
        }
    }

    // === Statements ===

    ///    StatementBlock ::= Indent { Statement } Unindent Newline
    fn parse_statement_block(&mut self) -> Result<Vec<Statement>, DreamError> {
        self.expect(&TokenType::Indent)?;
        let mut statements = Vec::new();
        while !self.check(&TokenType::Unindent)? {
            statements.push(self.parse_statement()?);
        }
        self.expect(&TokenType::Unindent)?;
        self.expect(&TokenType::Newline)?;
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Statement, DreamError> {
        let loc = self.current()?.loc;
        if self.match_token(&TokenType::If)? {
            self.expect(&TokenType::ParenOpen)?;
            let condition = self.parse_expression()?;
            self.expect(&TokenType::ParenClose)?;
            self.expect(&TokenType::Newline)?;
            let body = self.parse_statement_block()?;
            return Ok(Statement::new(StatementKind::If { condition, body }, loc));
        }
        if self.match_token(&TokenType::For)? {
            return self.parse_for(loc);
        }
        if self.match_token(&TokenType::Return)? {
            self.expect(&TokenType::Newline)?;
            return Ok(Statement::new(StatementKind::Return, loc));
        }
        if self.match_token(&TokenType::Set)? {
            let name = self.expect_symbol()?;
            let set_in = self.match_token(&TokenType::In)?;
            if !set_in {
                self.expect(&TokenType::SetEqual)?;
            }
            let value = self.parse_expression()?;
            self.expect(&TokenType::Newline)?;
            let kind = if set_in {
                StatementKind::SetIn { name, value }
            } else {
                StatementKind::SetTo { name, value }
            };
            return Ok(Statement::new(kind, loc));
        }
        if self.match_token(&TokenType::Del)? {
            let expr = self.parse_expression()?;
            self.expect(&TokenType::Newline)?;
            return Ok(Statement::new(StatementKind::Del { expr }, loc));
        }

        let left = self.parse_expression()?;
        let op_loc = self.current()?.loc;
        if self.check(&TokenType::Newline)? {
            if !left.has_side_effects() {
                let (found, next) = self.context()?;
                return Err(ParseError::BareExpression {
                    expr: left.to_string(),
                    found,
                    next,
                    span: loc.span(),
                    loc,
                    src: None,
                }
                .into());
            }
            self.advance()?;
            return Ok(Statement::new(StatementKind::Evaluate { expr: left }, loc));
        }
        if self.match_token(&TokenType::LeftShift)? {
            let value = self.parse_expression()?;
            self.expect(&TokenType::Newline)?;
            return Ok(Statement::new(
                StatementKind::Write { dest: left, value },
                op_loc,
            ));
        }
        if self.match_token(&TokenType::SetEqual)? {
            let value = self.parse_expression()?;
            self.expect(&TokenType::Newline)?;
            return Ok(Statement::new(
                StatementKind::Assign { dest: left, value },
                op_loc,
            ));
        }
        self.err_unexpected("top-level operator")
    }

    ///    For ::= "for" "(" "var" "/" [ Path "/" ] Symbol [ "in" Expr ] ")" Newline StatementBlock
    fn parse_for(&mut self, loc: SourceLocation) -> Result<Statement, DreamError> {
        self.expect(&TokenType::ParenOpen)?;
        let path_loc = self.current()?.loc;
        let path = self.parse_decl_path()?;
        if !path.is_var_def() {
            let (found, next) = self.context()?;
            return Err(ParseError::ExpectedVarDef {
                path: path.to_string(),
                found,
                next,
                span: path_loc.span(),
                loc: path_loc,
                src: None,
            }
            .into());
        }
        let Some((owner, var_type, name)) = path.split_def() else {
            return self.err_unexpected("loop variable");
        };
        if owner.is_absolute || !owner.segments.is_empty() {
            let (found, next) = self.context()?;
            return Err(ParseError::Unsupported {
                what: format!("prefix before var in loop variable {path}"),
                found,
                next,
                span: path_loc.span(),
                loc: path_loc,
                src: None,
            }
            .into());
        }
        if self.check(&TokenType::As)? {
            let (found, next) = self.context()?;
            return Err(ParseError::Unsupported {
                what: "keyword as in for loop".to_string(),
                span: found.loc.span(),
                loc: found.loc.clone(),
                found,
                next,
                src: None,
            }
            .into());
        }
        let in_expr = if self.match_token(&TokenType::In)? {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(&TokenType::ParenClose)?;
        self.expect(&TokenType::Newline)?;

        let mark = self.scope.mark();
        self.scope.push(name.clone());
        let body = self.parse_statement_block();
        self.scope.restore(mark);

        let kind = StatementKind::ForList {
            var_type: var_type.unwrap_or_else(TypePath::root),
            name,
            in_expr,
            body: body?,
        };
        Ok(Statement::new(kind, loc))
    }

    // === Expressions ===

    ///    Expr ::= "!" Postfix | Postfix
    fn parse_expression(&mut self) -> Result<Expression, DreamError> {
        let loc = self.current()?.loc;
        if self.match_token(&TokenType::Not)? {
            let expr = self.parse_postfix()?;
            return Ok(Expression::new(
                ExpressionKind::BooleanNot {
                    expr: Box::new(expr),
                },
                loc,
            ));
        }
        self.parse_postfix()
    }

    ///    Postfix ::= Primary { CallArguments | "." Symbol }
    fn parse_postfix(&mut self) -> Result<Expression, DreamError> {
        let mut expr = self.parse_primary()?;
        loop {
            let loc = self.current()?.loc;
            if self.check(&TokenType::ParenOpen)? {
                let args = self.parse_call_arguments()?;
                expr = Expression::new(
                    ExpressionKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    loc,
                );
            } else if self.match_token(&TokenType::Dot)? {
                let field_loc = self.current()?.loc;
                let field = self.expect_symbol()?;
                expr = Expression::new(
                    ExpressionKind::GetField {
                        expr: Box::new(expr),
                        field,
                    },
                    field_loc,
                );
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expression, DreamError> {
        let token = self.current()?;
        let loc = token.loc.clone();
        let kind = match token.ttype {
            TokenType::StringStart => return self.parse_string(),
            TokenType::Slash => ExpressionKind::PathLiteral {
                path: self.parse_path()?,
            },
            TokenType::New => {
                self.advance()?;
                let path = self.parse_path()?;
                let args = if self.check(&TokenType::ParenOpen)? {
                    self.parse_call_arguments()?
                } else {
                    Vec::new()
                };
                ExpressionKind::New { path, args }
            }
            TokenType::ParenOpen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(&TokenType::ParenClose)?;
                return Ok(expr);
            }
            TokenType::Integer(value) => {
                self.advance()?;
                ExpressionKind::IntegerLiteral { value }
            }
            TokenType::Resource(name) => {
                self.advance()?;
                ExpressionKind::ResourceLiteral { name }
            }
            TokenType::Symbol(name) => {
                self.advance()?;
                if self.scope.contains(&name) {
                    ExpressionKind::GetLocal { name }
                } else {
                    ExpressionKind::GetNonLocal { name }
                }
            }
            TokenType::Dot => {
                self.advance()?;
                ExpressionKind::GetLocal {
                    name: ".".to_string(),
                }
            }
            TokenType::DotDot => {
                self.advance()?;
                ExpressionKind::GetNonLocal {
                    name: "..".to_string(),
                }
            }
            _ => return self.err_unexpected("expression"),
        };
        Ok(Expression::new(kind, loc))
    }

    ///    String ::= StringStart { StringLiteral | StringInsertStart Expr StringInsertEnd } StringEnd
    fn parse_string(&mut self) -> Result<Expression, DreamError> {
        let loc = self.expect(&TokenType::StringStart)?.loc;
        let mut parts = Vec::new();
        let mut capitalize = true;
        while !self.match_token(&TokenType::StringEnd)? {
            let token = self.current()?;
            match token.ttype {
                TokenType::StringInsertStart => {
                    self.advance()?;
                    let expr = self.parse_expression()?;
                    self.expect(&TokenType::StringInsertEnd)?;
                    let macro_name = if capitalize { "The" } else { "the" };
                    parts.push(Expression::new(
                        ExpressionKind::StringMacro {
                            macro_name: macro_name.to_string(),
                            expr: Box::new(expr),
                        },
                        token.loc,
                    ));
                    capitalize = false;
                }
                TokenType::StringLiteral(value) => {
                    self.advance()?;
                    capitalize = value.trim().ends_with('.');
                    parts.push(Expression::new(
                        ExpressionKind::StringLiteral { value },
                        token.loc,
                    ));
                }
                _ => return self.err_unexpected("string contents"),
            }
        }
        match parts.len() {
            0 => Ok(Expression::new(
                ExpressionKind::StringLiteral {
                    value: String::new(),
                },
                loc,
            )),
            1 => Ok(parts.remove(0)),
            _ => Ok(Expression::new(ExpressionKind::StringConcat { parts }, loc)),
        }
    }

    ///    CallArguments ::= "(" [ Argument { "," Argument } ] ")"
    ///    Argument ::= [ Symbol "=" ] Expr
    fn parse_call_arguments(&mut self) -> Result<Vec<Argument>, DreamError> {
        self.expect(&TokenType::ParenOpen)?;
        let mut args: Vec<Argument> = Vec::new();
        if self.match_token(&TokenType::ParenClose)? {
            return Ok(args);
        }
        loop {
            let keyword = if self.peek_is(1, &TokenType::SetEqual)? {
                let (found, next) = self.context()?;
                let duplicate = match &found.ttype {
                    TokenType::Symbol(name)
                        if args.iter().any(|a| a.keyword.as_deref() == Some(name.as_str())) =>
                    {
                        Some(name.clone())
                    }
                    _ => None,
                };
                if let Some(name) = duplicate {
                    return Err(ParseError::DuplicateKeyword {
                        name,
                        span: found.loc.span(),
                        loc: found.loc.clone(),
                        found,
                        next,
                        src: None,
                    }
                    .into());
                }
                let name = self.expect_symbol()?;
                self.expect(&TokenType::SetEqual)?;
                Some(name)
            } else {
                None
            };
            let value = self.parse_expression()?;
            args.push(Argument { keyword, value });
            if !self.match_token(&TokenType::Comma)? {
                break;
            }
        }
        self.expect(&TokenType::ParenClose)?;
        Ok(args)
    }

    // === Token Helper Methods ===

    /// Returns the token `n` places ahead, or a `None` token past the end of
    /// the input.
    fn peek(&mut self, n: usize) -> Result<Token, DreamError> {
        while self.lookahead.len() <= n {
            match self.input.next() {
                Some(item) => self.lookahead.push_back(item?),
                None => return Ok(Token::none(self.last_loc.clone())),
            }
        }
        Ok(self.lookahead[n].clone())
    }

    fn current(&mut self) -> Result<Token, DreamError> {
        self.peek(0)
    }

    fn advance(&mut self) -> Result<Token, DreamError> {
        let token = self.current()?;
        if let Some(taken) = self.lookahead.pop_front() {
            self.last_loc = taken.loc;
        }
        Ok(token)
    }

    fn peek_is(&mut self, n: usize, ttype: &TokenType) -> Result<bool, DreamError> {
        let token = self.peek(n)?;
        Ok(std::mem::discriminant(&token.ttype) == std::mem::discriminant(ttype))
    }

    fn check(&mut self, ttype: &TokenType) -> Result<bool, DreamError> {
        self.peek_is(0, ttype)
    }

    fn match_token(&mut self, ttype: &TokenType) -> Result<bool, DreamError> {
        if self.check(ttype)? {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, expected: &TokenType) -> Result<Token, DreamError> {
        if self.check(expected)? {
            self.advance()
        } else {
            self.err_unexpected(&format!("token of type {expected:?}"))
        }
    }

    fn expect_symbol(&mut self) -> Result<String, DreamError> {
        match self.current()?.ttype {
            TokenType::Symbol(name) => {
                self.advance()?;
                Ok(name)
            }
            _ => self.err_unexpected("symbol"),
        }
    }

    fn err_unexpected<T>(&mut self, expected: &str) -> Result<T, DreamError> {
        let (found, next) = self.context()?;
        Err(ParseError::UnexpectedToken {
            expected: expected.to_string(),
            span: found.loc.span(),
            loc: found.loc.clone(),
            found,
            next,
            src: None,
        }
        .into())
    }

    /// The token under the cursor and the one after it, for error reports.
    fn context(&mut self) -> Result<(Token, Token), DreamError> {
        Ok((self.peek(0)?, self.peek(1)?))
    }
}
