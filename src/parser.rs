//! Module defining the parser: a recursive-descent translation of the
//! token stream into a list of statements (§4.2).

use crate::ast::{AssignTarget, BinOp, Expr, Stmt, UnOp};
use crate::error::{ConvoError, ConvoResult};
use crate::token::{Token, TokenKind};

/// Parses a full token stream (as produced by [`crate::token::Lexer`])
/// into a program: a flat list of top-level statements.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Nesting depth of `Define` bodies currently being parsed, so `Return`
    /// can be rejected at parse time when it occurs outside any function
    /// (§7: "`Return` outside any function body is a SyntaxError").
    fn_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0, fn_depth: 0 }
    }

    #[tracing::instrument(level = "trace", skip_all)]
    pub fn parse_program(mut self) -> ConvoResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        self.skip_newlines();
        while !self.check(&TokenKind::Eof) {
            stmts.push(self.parse_statement()?);
            self.skip_newlines();
        }
        tracing::debug!(stmt_count = stmts.len(), "parsed program");
        Ok(stmts)
    }

    // ---- token stream helpers ----

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn line(&self) -> usize {
        self.peek().line
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek().kind == *kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> ConvoResult<Token> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(&kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> Box<ConvoError> {
        ConvoError::syntax(
            format!(
                "unexpected token {:?}, expected {}",
                self.peek().kind,
                expected
            ),
            self.line(),
        )
        .into()
    }

    fn expect_identifier(&mut self) -> ConvoResult<String> {
        match self.peek().kind.clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Consume the header-ending `:`, then a required block of one or
    /// more statements (`INDENT statement+ DEDENT`, per §4.2).
    fn parse_block(&mut self) -> ConvoResult<Vec<Stmt>> {
        self.expect(TokenKind::Colon, "':'")?;
        self.skip_newlines();
        self.expect(TokenKind::Indent, "indented block")?;
        let mut stmts = Vec::new();
        self.skip_newlines();
        while !self.check(&TokenKind::Dedent) && !self.check(&TokenKind::Eof) {
            stmts.push(self.parse_statement()?);
            self.skip_newlines();
        }
        if stmts.is_empty() {
            return Err(ConvoError::syntax("unterminated block", self.line()).into());
        }
        self.expect(TokenKind::Dedent, "dedent")?;
        Ok(stmts)
    }

    // ---- statements ----

    #[tracing::instrument(level = "trace", skip_all)]
    fn parse_statement(&mut self) -> ConvoResult<Stmt> {
        let line = self.line();
        match self.peek().kind.clone() {
            TokenKind::Say => {
                self.advance();
                let expr = self.parse_expr()?;
                Ok(Stmt::Say { expr, line })
            }
            TokenKind::Let => self.parse_let(line),
            TokenKind::Define => self.parse_define(line),
            TokenKind::Call => self.parse_call_stmt(line),
            TokenKind::If => self.parse_if(line),
            TokenKind::While => self.parse_while(line),
            TokenKind::ForEach => self.parse_for_each(line),
            TokenKind::Try => self.parse_try(line),
            TokenKind::Throw => {
                self.advance();
                let expr = self.parse_expr()?;
                Ok(Stmt::Throw { expr, line })
            }
            TokenKind::Return => {
                if self.fn_depth == 0 {
                    return Err(ConvoError::syntax(
                        "'Return' outside any function body",
                        line,
                    )
                    .into());
                }
                self.advance();
                let expr = if self.check(&TokenKind::Newline) || self.check(&TokenKind::Dedent) || self.check(&TokenKind::Eof) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                Ok(Stmt::Return { expr, line })
            }
            TokenKind::Import => {
                self.advance();
                let name = self.expect_identifier()?;
                Ok(Stmt::Import { name, line })
            }
            TokenKind::Stop => {
                self.advance();
                Ok(Stmt::Stop { line })
            }
            _ => {
                let expr = self.parse_expr()?;
                Ok(Stmt::ExpressionStmt { expr, line })
            }
        }
    }

    fn parse_let(&mut self, line: usize) -> ConvoResult<Stmt> {
        self.advance(); // Let
        let first = self.expect_identifier()?;
        let target = if self.eat(TokenKind::Dot) {
            let field = self.expect_identifier()?;
            AssignTarget::Field {
                target: Box::new(Expr::Identifier { name: first, line }),
                field,
            }
        } else {
            AssignTarget::Name(first)
        };
        self.expect(TokenKind::Be, "'be'")?;
        let expr = self.parse_expr()?;
        Ok(Stmt::Let { target, expr, line })
    }

    fn parse_params(&mut self) -> ConvoResult<Vec<String>> {
        let mut params = Vec::new();
        if self.eat(TokenKind::With) {
            params.push(self.expect_identifier()?);
            while self.eat(TokenKind::Comma) {
                params.push(self.expect_identifier()?);
            }
        }
        Ok(params)
    }

    fn parse_define(&mut self, line: usize) -> ConvoResult<Stmt> {
        self.advance(); // Define
        let name = self.expect_identifier()?;
        let params = self.parse_params()?;
        self.fn_depth += 1;
        let body = self.parse_block();
        self.fn_depth -= 1;
        Ok(Stmt::FunctionDef { name, params, body: body?, line })
    }

    fn parse_call_args(&mut self) -> ConvoResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.eat(TokenKind::With) {
            args.push(self.parse_expr()?);
            while self.eat(TokenKind::Comma) {
                args.push(self.parse_expr()?);
            }
        }
        Ok(args)
    }

    fn parse_call_stmt(&mut self, line: usize) -> ConvoResult<Stmt> {
        self.advance(); // Call
        let name = self.expect_identifier()?;
        let args = self.parse_call_args()?;
        Ok(Stmt::FunctionCall { name, args, line })
    }

    fn parse_if(&mut self, line: usize) -> ConvoResult<Stmt> {
        self.advance(); // If
        let cond = self.parse_expr()?;
        self.eat(TokenKind::Then);
        let then_body = self.parse_block()?;
        self.skip_newlines();
        let else_body = if self.check(&TokenKind::Else) {
            self.advance();
            if self.check(&TokenKind::If) {
                Some(vec![self.parse_if(self.line())?])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If { cond, then_body, else_body, line })
    }

    fn parse_while(&mut self, line: usize) -> ConvoResult<Stmt> {
        self.advance(); // While
        let cond = self.parse_expr()?;
        self.eat(TokenKind::Do);
        let body = self.parse_block()?;
        Ok(Stmt::While { cond, body, line })
    }

    fn parse_for_each(&mut self, line: usize) -> ConvoResult<Stmt> {
        self.advance(); // ForEach
        let var_name = self.expect_identifier()?;
        self.expect(TokenKind::In, "'in'")?;
        let iter_expr = self.parse_expr()?;
        self.eat(TokenKind::Do);
        let body = self.parse_block()?;
        Ok(Stmt::ForEach { var_name, iter_expr, body, line })
    }

    fn parse_try(&mut self, line: usize) -> ConvoResult<Stmt> {
        self.advance(); // Try
        let body = self.parse_block()?;
        self.skip_newlines();
        self.expect(TokenKind::Catch, "'Catch'")?;
        let catch_var = self.expect_identifier()?;
        let catch_body = self.parse_block()?;
        Ok(Stmt::Try { body, catch_var, catch_body, line })
    }

    // ---- expressions (precedence climb, low to high; see §4.2) ----

    pub fn parse_expr(&mut self) -> ConvoResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ConvoResult<Expr> {
        let mut lhs = self.parse_and()?;
        while self.check(&TokenKind::Or) {
            let line = self.line();
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expr::Binary { op: BinOp::Or, lhs: Box::new(lhs), rhs: Box::new(rhs), line };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> ConvoResult<Expr> {
        let mut lhs = self.parse_not()?;
        while self.check(&TokenKind::And) {
            let line = self.line();
            self.advance();
            let rhs = self.parse_not()?;
            lhs = Expr::Binary { op: BinOp::And, lhs: Box::new(lhs), rhs: Box::new(rhs), line };
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> ConvoResult<Expr> {
        if self.check(&TokenKind::Not) {
            let line = self.line();
            self.advance();
            let operand = self.parse_not()?;
            return Ok(Expr::Unary { op: UnOp::Not, operand: Box::new(operand), line });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ConvoResult<Expr> {
        let lhs = self.parse_add()?;
        let op = match self.peek().kind {
            TokenKind::Equals => BinOp::Equals,
            TokenKind::NotEquals => BinOp::NotEquals,
            TokenKind::GreaterThan => BinOp::Greater,
            TokenKind::GreaterEqual => BinOp::GreaterEqual,
            TokenKind::LessThan => BinOp::Less,
            TokenKind::LessEqual => BinOp::LessEqual,
            _ => return Ok(lhs),
        };
        let line = self.line();
        self.advance();
        let rhs = self.parse_add()?;
        Ok(Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), line })
    }

    fn parse_add(&mut self) -> ConvoResult<Expr> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let line = self.line();
            self.advance();
            let rhs = self.parse_mul()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), line };
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> ConvoResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            let line = self.line();
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), line };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> ConvoResult<Expr> {
        if self.check(&TokenKind::Minus) {
            let line = self.line();
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary { op: UnOp::Neg, operand: Box::new(operand), line });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ConvoResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            let line = self.line();
            if self.check(&TokenKind::LParen) {
                self.advance();
                let mut args = Vec::new();
                if !self.check(&TokenKind::RParen) {
                    args.push(self.parse_expr()?);
                    while self.eat(TokenKind::Comma) {
                        args.push(self.parse_expr()?);
                    }
                }
                self.expect(TokenKind::RParen, "')'")?;
                expr = Expr::Call { callee: Box::new(expr), args, line };
            } else if self.check(&TokenKind::LBracket) {
                self.advance();
                let key = self.parse_expr()?;
                self.expect(TokenKind::RBracket, "']'")?;
                expr = Expr::Index { target: Box::new(expr), key: Box::new(key), line };
            } else if self.check(&TokenKind::Dot) {
                self.advance();
                let field = self.expect_identifier()?;
                expr = Expr::Member { target: Box::new(expr), field, line };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> ConvoResult<Expr> {
        let line = self.line();
        match self.peek().kind.clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::NumberLit(n))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::StringLit(s))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::BoolLit(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::BoolLit(false))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::NullLit)
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expr::Identifier { name, line })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                self.advance();
                let mut items = Vec::new();
                if !self.check(&TokenKind::RBracket) {
                    items.push(self.parse_expr()?);
                    while self.eat(TokenKind::Comma) {
                        items.push(self.parse_expr()?);
                    }
                }
                self.expect(TokenKind::RBracket, "']'")?;
                Ok(Expr::ListLit(items))
            }
            TokenKind::LBrace => {
                self.advance();
                let mut pairs = Vec::new();
                if !self.check(&TokenKind::RBrace) {
                    pairs.push(self.parse_dict_pair()?);
                    while self.eat(TokenKind::Comma) {
                        pairs.push(self.parse_dict_pair()?);
                    }
                }
                self.expect(TokenKind::RBrace, "'}'")?;
                Ok(Expr::DictLit(pairs))
            }
            TokenKind::New => {
                self.advance();
                let class_name = self.expect_identifier()?;
                let args = self.parse_call_args()?;
                Ok(Expr::New { class_name, args, line })
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_dict_pair(&mut self) -> ConvoResult<(Expr, Expr)> {
        let key = self.parse_expr()?;
        self.expect(TokenKind::Colon, "':'")?;
        let value = self.parse_expr()?;
        Ok((key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Lexer;

    fn parse(src: &str) -> ConvoResult<Vec<Stmt>> {
        let tokens = Lexer::new(src, 4, true).tokenize()?;
        Parser::new(tokens).parse_program()
    }

    #[test]
    fn parses_say_string() {
        let stmts = parse("Say \"Hello, World!\"\n").unwrap();
        assert_eq!(stmts.len(), 1);
        assert!(matches!(&stmts[0], Stmt::Say { .. }));
    }

    #[test]
    fn parses_let_and_arithmetic() {
        let stmts = parse("Let n be 3\nLet m be 4\nSay n + m\n").unwrap();
        assert_eq!(stmts.len(), 3);
    }

    #[test]
    fn parses_while_loop_block() {
        let stmts = parse("Let c be 1\nWhile c less than 4 do:\n    Say c\n    Let c be c + 1\n").unwrap();
        assert!(matches!(&stmts[1], Stmt::While { .. }));
    }

    #[test]
    fn parses_function_def_with_params() {
        let stmts = parse("Define fact with n:\n    If n less than 2 then:\n        Return 1\n    Return n * fact(n - 1)\n").unwrap();
        match &stmts[0] {
            Stmt::FunctionDef { name, params, body, .. } => {
                assert_eq!(name, "fact");
                assert_eq!(params, &vec!["n".to_string()]);
                assert_eq!(body.len(), 2);
            }
            _ => panic!("expected FunctionDef"),
        }
    }

    #[test]
    fn parses_try_catch() {
        let stmts = parse("Try:\n    Let x be 10 / 0\nCatch e:\n    Say \"caught: \" + e\n").unwrap();
        assert!(matches!(&stmts[0], Stmt::Try { .. }));
    }

    #[test]
    fn parses_for_each() {
        let stmts = parse("For each v in xs do:\n    Say v\n").unwrap();
        assert!(matches!(&stmts[0], Stmt::ForEach { .. }));
    }

    #[test]
    fn comparisons_do_not_chain() {
        // `a equals b equals c` parses `a equals b` then leaves a dangling
        // `equals c`, which should surface as a syntax error downstream
        // (an unexpected token at statement-separator position) rather
        // than silently chaining.
        let err = parse("Say 1 equals 1 equals 1\n");
        assert!(err.is_err());
    }

    #[test]
    fn unexpected_token_reports_line_number() {
        let err = parse("Say 1\nLet\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn field_assignment_target_parses() {
        let stmts = parse("Let this.x be 5\n").unwrap();
        match &stmts[0] {
            Stmt::Let { target: AssignTarget::Field { field, .. }, .. } => {
                assert_eq!(field, "x");
            }
            _ => panic!("expected field assignment"),
        }
    }

    #[test]
    fn top_level_return_is_a_syntax_error() {
        let err = parse("Return 5\n").unwrap_err();
        assert_eq!(err.kind.label(), "SyntaxError");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn return_nested_in_if_inside_a_function_is_allowed() {
        let stmts = parse("Define f with n:\n    If n then:\n        Return 1\n    Return 0\n").unwrap();
        assert!(matches!(&stmts[0], Stmt::FunctionDef { .. }));
    }

    #[test]
    fn bare_identifier_expression_carries_its_line() {
        let stmts = parse("Say 1\nmissing\n").unwrap();
        match &stmts[1] {
            Stmt::ExpressionStmt { expr: Expr::Identifier { name, line }, .. } => {
                assert_eq!(name, "missing");
                assert_eq!(*line, 2);
            }
            other => panic!("expected a bare identifier expression, got {other:?}"),
        }
    }
}
