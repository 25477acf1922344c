//! Grammar recognizer
//!
//! Recursive-descent parser over the token stream, generic over the
//! driver so the index pass and the full pass run the same grammar.
//! The parser recognizes shape only; every IR decision is a driver
//! call. Syntax checks are pass-independent, so a program accepted by
//! pass 1 can only fail pass 2 with semantic or incompatibility
//! errors.

use crate::driver::Driver;
use crate::token::{Span, Token};
use vypc_ir::{
    BinaryOp, CompileError, CompileResult, Datatype, ExprId, InstrId, Literal, PrimitiveType,
    Visibility,
};

/// Syntactic shape of a postfix expression, used to decide whether it
/// may stand as a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PostfixShape {
    Call,
    Other,
}

pub struct Parser<'a, D: Driver> {
    tokens: &'a [(Token, Span)],
    pos: usize,
    driver: &'a mut D,
}

impl<'a, D: Driver> Parser<'a, D> {
    pub fn new(tokens: &'a [(Token, Span)], driver: &'a mut D) -> Self {
        Parser {
            tokens,
            pos: 0,
            driver,
        }
    }

    // ----- token plumbing -----

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].0
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].0
    }

    fn span(&self) -> Span {
        self.tokens[self.pos.min(self.tokens.len() - 1)].1
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> CompileResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.err_expected(&token.describe()))
        }
    }

    fn expect_identifier(&mut self) -> CompileResult<String> {
        match self.peek() {
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.err_expected("identifier")),
        }
    }

    fn err_expected(&self, what: &str) -> CompileError {
        let span = self.span();
        CompileError::syntax(format!(
            "{}:{}: expected {}, found {}",
            span.line,
            span.column,
            what,
            self.peek().describe()
        ))
    }

    // ----- program structure -----

    pub fn parse_program(&mut self) -> CompileResult<()> {
        while !self.check(&Token::Eof) {
            if self.check(&Token::Class) {
                self.class_def()?;
            } else {
                self.function_def()?;
            }
        }
        Ok(())
    }

    fn function_def(&mut self) -> CompileResult<()> {
        let ret = self.parse_return_type()?;
        let name = self.expect_identifier()?;
        self.expect(&Token::LeftParen)?;
        let params = self.parse_params()?;
        self.expect(&Token::RightParen)?;
        self.driver.begin_function(ret, &name, &params)?;
        let body = self.parse_body()?;
        self.driver.end_function(body)
    }

    fn class_def(&mut self) -> CompileResult<()> {
        self.expect(&Token::Class)?;
        let name = self.expect_identifier()?;
        self.expect(&Token::Colon)?;
        let base = self.expect_identifier()?;
        self.expect(&Token::LeftBrace)?;
        self.driver.begin_class(&name, &base)?;
        while !self.check(&Token::RightBrace) {
            self.class_member()?;
        }
        self.expect(&Token::RightBrace)?;
        self.driver.end_class()
    }

    fn class_member(&mut self) -> CompileResult<()> {
        let visibility = if self.eat(&Token::Public) {
            Visibility::Public
        } else if self.eat(&Token::Protected) {
            Visibility::Protected
        } else if self.eat(&Token::Private) {
            Visibility::Private
        } else {
            Visibility::Public
        };
        self.driver.set_visibility(visibility);

        if self.check(&Token::Void) {
            return self.function_def();
        }
        let ty = self.parse_type()?;
        let name = self.expect_identifier()?;
        if self.check(&Token::LeftParen) {
            // Method with the already-consumed return type and name.
            self.expect(&Token::LeftParen)?;
            let params = self.parse_params()?;
            self.expect(&Token::RightParen)?;
            self.driver.begin_function(Some(ty), &name, &params)?;
            let body = self.parse_body()?;
            return self.driver.end_function(body);
        }

        // Attribute list.
        let init = self.parse_initializer()?;
        self.driver.declare(&ty, &name, init)?;
        while self.eat(&Token::Comma) {
            let name = self.expect_identifier()?;
            let init = self.parse_initializer()?;
            self.driver.declare(&ty, &name, init)?;
        }
        self.expect(&Token::Semicolon)
    }

    fn parse_initializer(&mut self) -> CompileResult<Option<ExprId>> {
        if self.eat(&Token::Equal) {
            Ok(Some(self.parse_expr()?))
        } else {
            Ok(None)
        }
    }

    fn parse_return_type(&mut self) -> CompileResult<Option<Datatype>> {
        if self.eat(&Token::Void) {
            Ok(None)
        } else {
            Ok(Some(self.parse_type()?))
        }
    }

    fn parse_type(&mut self) -> CompileResult<Datatype> {
        match self.peek().clone() {
            Token::Int => {
                self.advance();
                Ok(Datatype::Primitive(PrimitiveType::Int))
            }
            Token::Float => {
                self.advance();
                Ok(Datatype::Primitive(PrimitiveType::Float))
            }
            Token::String => {
                self.advance();
                Ok(Datatype::Primitive(PrimitiveType::String))
            }
            Token::Identifier(name) => {
                self.advance();
                self.driver.resolve_type(&name)
            }
            _ => Err(self.err_expected("type")),
        }
    }

    fn parse_params(&mut self) -> CompileResult<Vec<(Datatype, String)>> {
        if self.check(&Token::RightParen) {
            return Ok(Vec::new());
        }
        if self.check(&Token::Void) && *self.peek_at(1) == Token::RightParen {
            self.advance();
            return Ok(Vec::new());
        }
        let mut params = Vec::new();
        loop {
            let ty = self.parse_type()?;
            let name = self.expect_identifier()?;
            params.push((ty, name));
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok(params)
    }

    // ----- statements -----

    /// Function or method body: statements live in the scope the
    /// driver opened for the parameters, so a local cannot shadow a
    /// parameter.
    fn parse_body(&mut self) -> CompileResult<Vec<InstrId>> {
        self.expect(&Token::LeftBrace)?;
        let mut instrs = Vec::new();
        while !self.check(&Token::RightBrace) {
            if self.check(&Token::Eof) {
                return Err(self.err_expected("'}'"));
            }
            self.statement(&mut instrs)?;
        }
        self.expect(&Token::RightBrace)?;
        Ok(instrs)
    }

    /// Nested block of a branch or loop; gets its own alloca-only
    /// scope.
    fn parse_block(&mut self) -> CompileResult<Vec<InstrId>> {
        self.driver.begin_block();
        let result = self.parse_body();
        self.driver.end_block();
        result
    }

    fn statement(&mut self, instrs: &mut Vec<InstrId>) -> CompileResult<()> {
        match self.peek().clone() {
            Token::If => {
                self.advance();
                self.expect(&Token::LeftParen)?;
                let cond = self.parse_expr()?;
                self.expect(&Token::RightParen)?;
                let if_body = self.parse_block()?;
                let else_body = if self.eat(&Token::Else) {
                    self.parse_block()?
                } else {
                    Vec::new()
                };
                instrs.push(self.driver.create_if(cond, if_body, else_body)?);
                Ok(())
            }
            Token::While => {
                self.advance();
                self.expect(&Token::LeftParen)?;
                let cond = self.parse_expr()?;
                self.expect(&Token::RightParen)?;
                let body = self.parse_block()?;
                instrs.push(self.driver.create_while(cond, body)?);
                Ok(())
            }
            Token::Return => {
                self.advance();
                let value = if self.check(&Token::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(&Token::Semicolon)?;
                instrs.push(self.driver.create_return(value)?);
                Ok(())
            }
            Token::Int | Token::Float | Token::String => self.declaration(instrs),
            Token::Identifier(name) => {
                if matches!(self.peek_at(1), Token::Identifier(_)) {
                    // Class-typed declaration.
                    self.declaration(instrs)
                } else if *self.peek_at(1) == Token::Equal {
                    self.advance();
                    self.advance();
                    let value = self.parse_expr()?;
                    self.expect(&Token::Semicolon)?;
                    instrs.push(self.driver.assign_to_name(&name, value)?);
                    Ok(())
                } else {
                    self.expression_statement(instrs)
                }
            }
            Token::This | Token::Super => self.expression_statement(instrs),
            _ => Err(self.err_expected("statement")),
        }
    }

    fn declaration(&mut self, instrs: &mut Vec<InstrId>) -> CompileResult<()> {
        let ty = self.parse_type()?;
        loop {
            let name = self.expect_identifier()?;
            let init = self.parse_initializer()?;
            instrs.extend(self.driver.declare(&ty, &name, init)?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::Semicolon)
    }

    /// A statement headed by a postfix expression: either an assignment
    /// through a member access, or a call for its side effect.
    fn expression_statement(&mut self, instrs: &mut Vec<InstrId>) -> CompileResult<()> {
        let (expr, shape) = self.parse_postfix()?;
        if self.eat(&Token::Equal) {
            let value = self.parse_expr()?;
            self.expect(&Token::Semicolon)?;
            instrs.push(self.driver.assign(expr, value)?);
            return Ok(());
        }
        if shape != PostfixShape::Call {
            return Err(self.err_expected("statement"));
        }
        self.expect(&Token::Semicolon)?;
        instrs.push(self.driver.call_statement(expr)?);
        Ok(())
    }

    // ----- expressions (precedence climbing) -----

    fn parse_expr(&mut self) -> CompileResult<ExprId> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> CompileResult<ExprId> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::PipePipe) {
            let rhs = self.parse_and()?;
            lhs = self.driver.binary_expr(BinaryOp::Or, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> CompileResult<ExprId> {
        let mut lhs = self.parse_equality()?;
        while self.eat(&Token::AmpAmp) {
            let rhs = self.parse_equality()?;
            lhs = self.driver.binary_expr(BinaryOp::And, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> CompileResult<ExprId> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = if self.eat(&Token::EqualEqual) {
                BinaryOp::Equal
            } else if self.eat(&Token::BangEqual) {
                BinaryOp::NotEqual
            } else {
                return Ok(lhs);
            };
            let rhs = self.parse_relational()?;
            lhs = self.driver.binary_expr(op, lhs, rhs)?;
        }
    }

    fn parse_relational(&mut self) -> CompileResult<ExprId> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = if self.eat(&Token::Less) {
                BinaryOp::Less
            } else if self.eat(&Token::LessEqual) {
                BinaryOp::LessEqual
            } else if self.eat(&Token::Greater) {
                BinaryOp::Greater
            } else if self.eat(&Token::GreaterEqual) {
                BinaryOp::GreaterEqual
            } else {
                return Ok(lhs);
            };
            let rhs = self.parse_additive()?;
            lhs = self.driver.binary_expr(op, lhs, rhs)?;
        }
    }

    fn parse_additive(&mut self) -> CompileResult<ExprId> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = if self.eat(&Token::Plus) {
                BinaryOp::Add
            } else if self.eat(&Token::Minus) {
                BinaryOp::Sub
            } else {
                return Ok(lhs);
            };
            let rhs = self.parse_term()?;
            lhs = self.driver.binary_expr(op, lhs, rhs)?;
        }
    }

    fn parse_term(&mut self) -> CompileResult<ExprId> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = if self.eat(&Token::Star) {
                BinaryOp::Mul
            } else if self.eat(&Token::Slash) {
                BinaryOp::Div
            } else {
                return Ok(lhs);
            };
            let rhs = self.parse_unary()?;
            lhs = self.driver.binary_expr(op, lhs, rhs)?;
        }
    }

    fn parse_unary(&mut self) -> CompileResult<ExprId> {
        if self.eat(&Token::Bang) {
            let operand = self.parse_unary()?;
            return self.driver.not_expr(operand);
        }

        // `(string) e` is always a cast; `(Name) e` is a cast when the
        // next-but-two token can begin an expression. The rule is
        // purely syntactic so both passes agree on the parse.
        if self.check(&Token::LeftParen) {
            if *self.peek_at(1) == Token::String && *self.peek_at(2) == Token::RightParen {
                self.advance();
                self.advance();
                self.advance();
                let inner = self.parse_unary()?;
                return self.driver.string_cast_expr(inner);
            }
            if let Token::Identifier(class_name) = self.peek_at(1).clone() {
                if *self.peek_at(2) == Token::RightParen && starts_expression(self.peek_at(3)) {
                    self.advance();
                    self.advance();
                    self.advance();
                    let inner = self.parse_unary()?;
                    return self.driver.object_cast_expr(&class_name, inner);
                }
            }
        }

        Ok(self.parse_postfix()?.0)
    }

    fn parse_postfix(&mut self) -> CompileResult<(ExprId, PostfixShape)> {
        let mut expr = self.parse_primary()?;
        let mut shape = PostfixShape::Other;
        loop {
            if self.eat(&Token::Dot) {
                let member = self.expect_identifier()?;
                expr = self.driver.dot_expr(expr, &member)?;
                shape = PostfixShape::Other;
            } else if self.eat(&Token::LeftParen) {
                let args = self.parse_args()?;
                self.expect(&Token::RightParen)?;
                expr = self.driver.call_expr(expr, args)?;
                shape = PostfixShape::Call;
            } else {
                return Ok((expr, shape));
            }
        }
    }

    fn parse_args(&mut self) -> CompileResult<Vec<ExprId>> {
        let mut args = Vec::new();
        if self.check(&Token::RightParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if !self.eat(&Token::Comma) {
                return Ok(args);
            }
        }
    }

    fn parse_primary(&mut self) -> CompileResult<ExprId> {
        match self.peek().clone() {
            Token::IntLiteral(v) => {
                self.advance();
                self.driver.literal(Literal::Int(v))
            }
            Token::FloatLiteral(v) => {
                self.advance();
                self.driver.literal(Literal::Float(v))
            }
            Token::StringLiteral(s) => {
                self.advance();
                self.driver.literal(Literal::String(s))
            }
            Token::Identifier(name) => {
                self.advance();
                self.driver.identifier(&name)
            }
            Token::This => {
                self.advance();
                self.driver.this_expr()
            }
            Token::Super => {
                self.advance();
                self.driver.super_expr()
            }
            Token::New => {
                self.advance();
                let class_name = self.expect_identifier()?;
                self.driver.new_expr(&class_name)
            }
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }
            _ => Err(self.err_expected("expression")),
        }
    }
}

/// Tokens that can begin a unary expression; drives the cast
/// disambiguation in `parse_unary`.
fn starts_expression(token: &Token) -> bool {
    matches!(
        token,
        Token::Identifier(_)
            | Token::IntLiteral(_)
            | Token::FloatLiteral(_)
            | Token::StringLiteral(_)
            | Token::LeftParen
            | Token::Bang
            | Token::This
            | Token::Super
            | Token::New
    )
}
