//! Recursive-descent statement parser

use super::span::Span;
use super::token::Token;
use crate::convert::parse_literal;
use crate::error::{CompileError, Result};
use crate::interp::builtins::{self, BuiltinKind};
use crate::symbol::{
    BinOp, Callee, Class, Context, Handle, Pending, RoutineKind, Statement, SymbolTable,
    normalize,
};

/// Parser over one source text. Every call that builds nodes takes the
/// symbol table explicitly so execution can interleave with parsing.
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<(Token, Span)>,
    pos: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Result<Self> {
        Ok(Self::from_tokens(source, super::tokenize(source)?))
    }

    pub fn from_tokens(source: &'src str, tokens: Vec<(Token, Span)>) -> Self {
        Parser {
            source,
            tokens,
            pos: 0,
        }
    }

    // ---- token cursor ----

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|(t, _)| t)
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, span)) => *span,
            None => Span::new(self.source.len(), self.source.len()),
        }
    }

    fn advance(&mut self) -> Option<(Token, Span)> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        match self.peek() {
            Some(found) => {
                CompileError::parser(format!("expected {expected}, found {found}"), self.span())
            }
            None => CompileError::incomplete(expected, self.span()),
        }
    }

    fn expect(&mut self, token: Token, expected: &str) -> Result<Span> {
        if self.check(&token) {
            let span = self.span();
            self.pos += 1;
            Ok(span)
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn ident(&mut self, expected: &str) -> Result<String> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn skip_newlines(&mut self) {
        while self.eat(&Token::Newline) {}
    }

    /// Next significant token after any newlines, without consuming
    fn peek_past_newlines(&self) -> Option<&Token> {
        self.tokens[self.pos..]
            .iter()
            .map(|(t, _)| t)
            .find(|t| **t != Token::Newline)
    }

    fn end_of_statement(&mut self) -> Result<()> {
        match self.peek() {
            None | Some(Token::Newline) => {
                self.eat(&Token::Newline);
                Ok(())
            }
            Some(t) if t.is_block_end() || *t == Token::Else => Ok(()),
            Some(_) => Err(self.unexpected("end of statement")),
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.peek_past_newlines().is_none()
    }

    // ---- statements ----

    /// Parses the next top-level statement. Returns `None` at end of input.
    pub fn next_statement(&mut self, st: &mut SymbolTable) -> Result<Option<Handle>> {
        self.skip_newlines();
        if self.peek().is_none() {
            return Ok(None);
        }
        st.set_line(self.span().line(self.source));
        let statement = self.statement(st)?;
        self.end_of_statement()?;
        Ok(Some(statement))
    }

    fn statement(&mut self, st: &mut SymbolTable) -> Result<Handle> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.unexpected("statement"));
        };
        match token {
            Token::If => self.if_statement(st),
            Token::For => self.for_statement(st),
            Token::While => self.while_statement(st),
            Token::Repeat => self.repeat_statement(st),
            Token::Begin => {
                self.advance();
                let items = self.statement_list(st, &[Token::End])?;
                self.expect(Token::End, "'end'")?;
                Ok(st.new_statement(Statement::Block(items))?)
            }
            Token::Return => {
                self.advance();
                let value = if self.eat(&Token::Comma) {
                    Some(self.expr(st)?)
                } else {
                    None
                };
                Ok(st.new_statement(Statement::Return(value))?)
            }
            Token::Break => {
                self.advance();
                Ok(st.new_statement(Statement::Break)?)
            }
            Token::Continue => {
                self.advance();
                Ok(st.new_statement(Statement::Continue)?)
            }
            Token::Subr => self.routine(st, RoutineKind::Subroutine, Token::EndSubr),
            Token::Func => self.routine(st, RoutineKind::Function, Token::EndFunc),
            Token::Block => self.routine(st, RoutineKind::Block, Token::EndBlock),
            Token::Run => {
                self.advance();
                self.eat(&Token::Comma);
                let name = self.ident("block routine name")?;
                let block = st.defer_routine(RoutineKind::Block, &name)?;
                Ok(st.new_statement(Statement::Run(block))?)
            }
            Token::Include(path) => {
                self.advance();
                Ok(st.new_statement(Statement::Include(path))?)
            }
            Token::Ident(name) => {
                if self.peek_at(1) == Some(&Token::Assign) {
                    self.assignment(st, name)
                } else {
                    self.call_statement(st, name)
                }
            }
            _ => Err(self.unexpected("statement")),
        }
    }

    /// Statements up to (not including) one of `terminators`
    fn statement_list(&mut self, st: &mut SymbolTable, terminators: &[Token]) -> Result<Vec<Handle>> {
        let mut items = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek() {
                Some(t) if terminators.contains(t) => return Ok(items),
                None => {
                    let expected = terminators
                        .iter()
                        .map(|t| format!("'{t}'"))
                        .collect::<Vec<_>>()
                        .join(" or ");
                    return Err(CompileError::incomplete(expected, self.span()));
                }
                Some(_) => {
                    items.push(self.statement(st)?);
                    self.end_of_statement()?;
                }
            }
        }
    }

    fn assignment(&mut self, st: &mut SymbolTable, name: String) -> Result<Handle> {
        self.advance();
        self.expect(Token::Assign, "'='")?;
        let target = st.install_variable(&name)?;
        let value = self.expr(st)?;
        Ok(st.new_statement(Statement::Replace { target, value })?)
    }

    fn call_statement(&mut self, st: &mut SymbolTable, name: String) -> Result<Handle> {
        self.advance();
        let mut count = 0;
        while self.eat(&Token::Comma) {
            let arg = self.call_arg(st)?;
            st.push_pending(Pending { key: None, value: arg });
            count += 1;
        }
        let callee = match builtins::find(&name, BuiltinKind::Subroutine) {
            Some(index) => Callee::Builtin(index),
            None => Callee::User(st.defer_routine(RoutineKind::Subroutine, &name)?),
        };
        Ok(st.new_call_statement(callee, count)?)
    }

    fn if_statement(&mut self, st: &mut SymbolTable) -> Result<Handle> {
        self.advance();
        let cond = self.expr(st)?;
        self.expect(Token::Then, "'then'")?;
        self.skip_newlines();
        let then = self.statement(st)?;
        let otherwise = if self.peek_past_newlines() == Some(&Token::Else) {
            self.skip_newlines();
            self.advance();
            self.skip_newlines();
            Some(self.statement(st)?)
        } else {
            None
        };
        Ok(st.new_statement(Statement::If { cond, then, otherwise })?)
    }

    fn for_statement(&mut self, st: &mut SymbolTable) -> Result<Handle> {
        self.advance();
        let name = self.ident("loop variable")?;
        let var = st.install_variable(&name)?;
        self.expect(Token::Assign, "'='")?;
        let start = self.expr(st)?;
        self.expect(Token::Comma, "','")?;
        let end = self.expr(st)?;
        self.expect(Token::Do, "'do'")?;
        self.skip_newlines();
        let body = self.statement(st)?;
        Ok(st.new_statement(Statement::For { var, start, end, body })?)
    }

    fn while_statement(&mut self, st: &mut SymbolTable) -> Result<Handle> {
        self.advance();
        let cond = self.expr(st)?;
        self.expect(Token::Do, "'do'")?;
        self.skip_newlines();
        let body = self.statement(st)?;
        Ok(st.new_statement(Statement::While { cond, body })?)
    }

    fn repeat_statement(&mut self, st: &mut SymbolTable) -> Result<Handle> {
        self.advance();
        self.skip_newlines();
        let body = self.statement(st)?;
        self.skip_newlines();
        self.expect(Token::Until, "'until'")?;
        let cond = self.expr(st)?;
        Ok(st.new_statement(Statement::Repeat { body, cond })?)
    }

    /// `subr name, p...`, `func name(p...)` or `block name`, then the body
    /// up to the matching end keyword
    fn routine(&mut self, st: &mut SymbolTable, kind: RoutineKind, end: Token) -> Result<Handle> {
        let start = self.span();
        self.advance();
        if st.scope() != Context::TopLevel {
            return Err(CompileError::parser(
                "routines cannot be defined inside another routine",
                start,
            ));
        }
        let name = self.ident("routine name")?;

        let mut params = Vec::new();
        if kind != RoutineKind::Block {
            if self.eat(&Token::LParen) {
                if !self.check(&Token::RParen) {
                    params.push(self.ident("parameter name")?);
                    while self.eat(&Token::Comma) {
                        params.push(self.ident("parameter name")?);
                    }
                }
                self.expect(Token::RParen, "')'")?;
            } else {
                while self.eat(&Token::Comma) {
                    params.push(self.ident("parameter name")?);
                }
            }
        }

        let param_refs: Vec<&str> = params.iter().map(String::as_str).collect();
        let handle = st.declare_routine(kind, &name, &param_refs)?;

        let previous = st.enter_routine(handle);
        let body = self.statement_list(st, std::slice::from_ref(&end));
        st.leave_routine(previous);
        let body = body?;
        self.expect(end, "end of routine")?;

        st.define_routine(handle, body)?;
        log::debug!("compiled {} {name}", kind.class());
        Ok(handle)
    }

    // ---- expressions ----

    /// Argument of a call: `name = expr` keyword, `a:b` range, or expression
    fn call_arg(&mut self, st: &mut SymbolTable) -> Result<Handle> {
        if let (Some(Token::Ident(name)), Some(Token::Assign)) = (self.peek(), self.peek_at(1)) {
            let name = name.clone();
            self.pos += 2;
            let value = self.expr(st)?;
            return Ok(st.new_keyword(&name, value)?);
        }
        let first = self.expr(st)?;
        if self.eat(&Token::Colon) {
            let second = self.expr(st)?;
            return Ok(st.new_range(first, second)?);
        }
        Ok(first)
    }

    pub fn expr(&mut self, st: &mut SymbolTable) -> Result<Handle> {
        self.comparison(st)
    }

    fn comparison(&mut self, st: &mut SymbolTable) -> Result<Handle> {
        let mut lhs = self.additive(st)?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => BinOp::Eq,
                Some(Token::Ne) => BinOp::Ne,
                Some(Token::Lt) => BinOp::Lt,
                Some(Token::Le) => BinOp::Le,
                Some(Token::Gt) => BinOp::Gt,
                Some(Token::Ge) => BinOp::Ge,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.additive(st)?;
            lhs = st.new_binary(op, lhs, rhs)?;
        }
    }

    fn additive(&mut self, st: &mut SymbolTable) -> Result<Handle> {
        let mut lhs = self.term(st)?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.term(st)?;
            lhs = st.new_binary(op, lhs, rhs)?;
        }
    }

    fn term(&mut self, st: &mut SymbolTable) -> Result<Handle> {
        let mut lhs = self.unary(st)?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.unary(st)?;
            lhs = st.new_binary(op, lhs, rhs)?;
        }
    }

    fn unary(&mut self, st: &mut SymbolTable) -> Result<Handle> {
        if self.eat(&Token::Minus) {
            let operand = self.unary(st)?;
            let zero = st.constants().zero;
            return Ok(st.new_binary(BinOp::Sub, zero, operand)?);
        }
        if self.eat(&Token::Plus) {
            return self.unary(st);
        }
        self.primary(st)
    }

    fn primary(&mut self, st: &mut SymbolTable) -> Result<Handle> {
        let Some((token, span)) = self.advance() else {
            return Err(self.unexpected("expression"));
        };
        match token {
            Token::Number(text) => Ok(st.new_scalar(parse_literal(&text))?),
            Token::Str(text) => Ok(st.new_string(text)?),
            Token::Ident(name) => {
                if self.check(&Token::LParen) {
                    self.call_or_extract(st, &name)
                } else {
                    Ok(st.install_variable(&name)?)
                }
            }
            Token::LParen => {
                let inner = self.expr(st)?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::LBracket => {
                let (count, _) = self.pending_items(st, Token::RBracket, false)?;
                let concat = builtins::find("CONCAT", BuiltinKind::Function)
                    .ok_or_else(|| CompileError::parser("array constructor unavailable", span))?;
                Ok(st.new_call(Callee::Builtin(concat), count)?)
            }
            Token::LBrace => {
                let (count, keyed) = self.pending_items(st, Token::RBrace, true)?;
                if keyed {
                    Ok(st.new_list(count)?)
                } else {
                    Ok(st.new_compact_list(count)?)
                }
            }
            other => {
                self.pos -= 1;
                Err(CompileError::parser(format!("expected expression, found {other}"), span))
            }
        }
    }

    /// Comma-separated items up to `close`, pushed on the pending stack.
    /// With `keys`, `name: expr` items carry their key and the second
    /// result reports whether any item had one.
    fn pending_items(
        &mut self,
        st: &mut SymbolTable,
        close: Token,
        keys: bool,
    ) -> Result<(usize, bool)> {
        let mut count = 0;
        let mut keyed = false;
        self.skip_newlines();
        if self.eat(&close) {
            return Ok((0, false));
        }
        loop {
            self.skip_newlines();
            let key = match (self.peek(), self.peek_at(1)) {
                (Some(Token::Ident(name)), Some(Token::Colon)) if keys => {
                    let name = normalize(name);
                    self.pos += 2;
                    Some(name)
                }
                _ => None,
            };
            keyed |= key.is_some();
            let value = self.expr(st)?;
            st.push_pending(Pending { key, value });
            count += 1;
            self.skip_newlines();
            if self.eat(&close) {
                return Ok((count, keyed));
            }
            self.expect(Token::Comma, "','")?;
        }
    }

    /// `name(...)`: a subscript when `name` is a variable in scope, else a
    /// built-in or user function call
    fn call_or_extract(&mut self, st: &mut SymbolTable, name: &str) -> Result<Handle> {
        self.expect(Token::LParen, "'('")?;
        let mut count = 0;
        if !self.check(&Token::RParen) {
            loop {
                let arg = self.call_arg(st)?;
                st.push_pending(Pending { key: None, value: arg });
                count += 1;
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "')'")?;

        if let Some(var) = st.find_variable(name) {
            if st.class_of(var) != Class::Undefined || builtins::find(name, BuiltinKind::Function).is_none() {
                return Ok(st.new_extract(var, count)?);
            }
        }
        let callee = match builtins::find(name, BuiltinKind::Function) {
            Some(index) => Callee::Builtin(index),
            None => Callee::User(st.defer_routine(RoutineKind::Function, name)?),
        };
        Ok(st.new_call(callee, count)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::symbol::{Namespace, Number, Payload};

    fn parse_one(st: &mut SymbolTable, source: &str) -> Handle {
        let mut parser = Parser::new(source).unwrap();
        parser.next_statement(st).unwrap().unwrap()
    }

    #[test]
    fn test_assignment_builds_replace_node() {
        let mut st = SymbolTable::new(&Config::default());
        let h = parse_one(&mut st, "x = 1 + 2 * 3");
        let Payload::Executable(Statement::Replace { target, value }) = st.payload(h).unwrap().clone() else {
            panic!("expected a replace statement");
        };
        assert_eq!(st.name_of(target), Some("X"));
        assert_eq!(st.display(value), "(1 + (2 * 3))");
    }

    #[test]
    fn test_list_literal_uses_keys() {
        let mut st = SymbolTable::new(&Config::default());
        let h = parse_one(&mut st, "y = {a: 1, 'b'}");
        let Payload::Executable(Statement::Replace { value, .. }) = st.payload(h).unwrap().clone() else {
            panic!("expected a replace statement");
        };
        assert_eq!(st.class_of(value), Class::List);
        assert_eq!(st.display(value), "{A: 1, b}");
        assert_eq!(st.pending_len(), 0);
    }

    #[test]
    fn test_compact_list_without_keys() {
        let mut st = SymbolTable::new(&Config::default());
        let h = parse_one(&mut st, "y = {1, 2}");
        let Payload::Executable(Statement::Replace { value, .. }) = st.payload(h).unwrap().clone() else {
            panic!("expected a replace statement");
        };
        assert_eq!(st.class_of(value), Class::CompactList);
    }

    #[test]
    fn test_subscript_of_variable_is_extract() {
        let mut st = SymbolTable::new(&Config::default());
        let x = st.install_variable("X").unwrap();
        let v = st.new_scalar(Number::Int32(0)).unwrap();
        st.replace(x, v).unwrap();
        let h = parse_one(&mut st, "print, x(1:2), int8(3)");
        let Payload::Executable(Statement::Call { args, .. }) = st.payload(h).unwrap().clone() else {
            panic!("expected a call");
        };
        assert_eq!(st.class_of(args[0]), Class::Extract);
        assert_eq!(st.class_of(args[1]), Class::FunctionCall);
    }

    #[test]
    fn test_routine_definition_and_forward_call() {
        let mut st = SymbolTable::new(&Config::default());
        let source = "subr outer, a\n  inner, a\nendsubr\n";
        let outer = parse_one(&mut st, source);
        assert_eq!(st.class_of(outer), Class::Subroutine);
        let inner = st.find_routine(RoutineKind::Subroutine, "INNER").unwrap();
        assert!(st.routine(inner).unwrap().body.is_none());
        let params = st.routine(outer).unwrap().params.clone();
        assert_eq!(st.lookup(Namespace::Variable, "A", Context::Owner(outer)), Some(params[0]));
    }

    #[test]
    fn test_missing_end_is_incomplete() {
        let mut st = SymbolTable::new(&Config::default());
        let mut parser = Parser::new("func f(x)\n return, x\n").unwrap();
        let err = parser.next_statement(&mut st).unwrap_err();
        assert!(err.is_incomplete(), "{err}");
    }

    #[test]
    fn test_unexpected_token_reports_span() {
        let mut st = SymbolTable::new(&Config::default());
        let mut parser = Parser::new("x = )").unwrap();
        let err = parser.next_statement(&mut st).unwrap_err();
        assert_eq!(err.span(), Some(Span::new(4, 5)));
        assert!(!err.is_incomplete());
    }

    #[test]
    fn test_statements_are_consumed_one_at_a_time() {
        let mut st = SymbolTable::new(&Config::default());
        let mut parser = Parser::new("a = 1\n\nb = 2\n").unwrap();
        assert!(parser.next_statement(&mut st).unwrap().is_some());
        assert_eq!(st.line(), 1);
        assert!(parser.next_statement(&mut st).unwrap().is_some());
        assert_eq!(st.line(), 3);
        assert!(parser.next_statement(&mut st).unwrap().is_none());
    }
}
