//! The recursive-descent compiler: token sequence → expression tree,
//! consulting the operator registry and folding binary operators flat,
//! left-to-right, with **no precedence**.

use std::rc::Rc;

use crate::ast::Node;
use crate::error::SyntaxError;
use crate::functions;
use crate::operators;
use crate::token::{Token, TokenClass};
use crate::value::Value;

pub fn compile(tokens: Vec<Token>, source: &str) -> Result<Node, SyntaxError> {
    let prepared = prepare_tokens(tokens, source)?;
    let mut parser = Parser { tokens: prepared, pos: 0, source: Rc::from(source), depth: 0 };
    if parser.tokens.is_empty() {
        return Ok(Node::Empty);
    }
    let node = parser.parse_expr()?;
    if parser.pos != parser.tokens.len() {
        let tok = &parser.tokens[parser.pos];
        return Err(SyntaxError::new(
            format!("unexpected token '{}'", tok.text),
            tok.position,
            source,
        ));
    }
    Ok(node)
}

/// Drops blanks/newlines/comments, validates subscript brackets, and fuses
/// a REAL-ending-in-E token with a following `+`/`-` INTEGRAL token (the
/// numeric-literal split the tokenizer deliberately leaves behind).
fn prepare_tokens(tokens: Vec<Token>, source: &str) -> Result<Vec<Token>, SyntaxError> {
    let filtered: Vec<Token> = tokens.into_iter().filter(|t| !t.is_elided()).collect();

    for (i, tok) in filtered.iter().enumerate() {
        if tok.class == TokenClass::SubscrBegin {
            let prev_is_identifier = i > 0 && filtered[i - 1].class == TokenClass::Identifier;
            if !prev_is_identifier {
                return Err(SyntaxError::new(
                    "'[' must follow an identifier",
                    tok.position,
                    source,
                ));
            }
        }
    }

    let mut fixed = Vec::with_capacity(filtered.len());
    let mut i = 0;
    while i < filtered.len() {
        let tok = &filtered[i];
        let ends_in_e = tok.class == TokenClass::Real
            && matches!(tok.text.chars().last(), Some('e') | Some('E'));
        if ends_in_e {
            if let (Some(sign), Some(digits)) = (filtered.get(i + 1), filtered.get(i + 2)) {
                let is_sign = sign.class == TokenClass::Operator && (sign.text == "+" || sign.text == "-");
                if is_sign && digits.class == TokenClass::Integral {
                    let fused_text = format!("{}{}{}", tok.text, sign.text, digits.text);
                    fixed.push(Token::new(fused_text, TokenClass::Real, tok.position, tok.source.clone()));
                    i += 3;
                    continue;
                }
            }
        }
        fixed.push(tok.clone());
        i += 1;
    }
    Ok(fixed)
}

const MAX_NESTING_DEPTH: usize = 200;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    source: Rc<str>,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        self.pos += 1;
        tok
    }

    fn error(&self, message: impl Into<String>, position: usize) -> SyntaxError {
        SyntaxError::new(message, position, self.source.as_ref())
    }

    fn eof_error(&self, message: &str) -> SyntaxError {
        let position = self.source.len();
        self.error(message, position)
    }

    fn expect_class(&mut self, class: TokenClass, what: &str) -> Result<Token, SyntaxError> {
        match self.peek() {
            Some(tok) if tok.class == class => Ok(self.advance()),
            Some(tok) => Err(self.error(format!("expected {what}"), tok.position)),
            None => Err(self.eof_error(&format!("expected {what}"))),
        }
    }

    /// `expr := operand (operator operand)*` — flat, left-associative fold
    /// across every registered operator with no precedence distinction.
    fn parse_expr(&mut self) -> Result<Node, SyntaxError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            let position = self.peek().map(|t| t.position).unwrap_or(self.source.len());
            self.depth -= 1;
            return Err(self.error("expression nested too deeply", position));
        }
        let mut left = self.parse_operand()?;
        loop {
            let Some(tok) = self.peek() else { break };
            if tok.class != TokenClass::Operator {
                break;
            }
            let Some(symbol) = operators::resolve(&tok.text) else { break };
            self.advance();
            let right = self.parse_operand()?;
            left = Node::Binary(symbol, Box::new(left), Box::new(right));
        }
        self.depth -= 1;
        Ok(left)
    }

    /// ```text
    /// operand := INTEGRAL | REAL | STRING_LITERAL
    ///          | IDENTIFIER [ '(' arglist ')' | '[' expr ']' ]
    ///          | '(' expr ')'
    ///          | unary operand        // unary + - not b_not
    /// ```
    fn parse_operand(&mut self) -> Result<Node, SyntaxError> {
        let tok = self.peek().cloned().ok_or_else(|| self.eof_error("expected operand"))?;

        if tok.class == TokenClass::Operator && (tok.text == "+" || tok.text == "-") {
            self.advance();
            let inner = self.parse_operand()?;
            let op: &'static str = if tok.text == "+" { "+" } else { "-" };
            return Ok(Node::Unary(op, Box::new(inner)));
        }
        if tok.class == TokenClass::Operator && tok.text.eq_ignore_ascii_case("++") {
            self.advance();
            let name = self.expect_class(TokenClass::Identifier, "identifier after '++'")?;
            return Ok(Node::PreIncrement(name.text));
        }
        if tok.class == TokenClass::Operator && tok.text.eq_ignore_ascii_case("--") {
            self.advance();
            let name = self.expect_class(TokenClass::Identifier, "identifier after '--'")?;
            return Ok(Node::PreDecrement(name.text));
        }

        match tok.class {
            TokenClass::Integral => {
                self.advance();
                Ok(Node::Constant(parse_integral(&tok.text)))
            }
            TokenClass::Real => {
                self.advance();
                let v: f64 = tok.text.parse().unwrap_or(0.0);
                Ok(Node::Constant(Value::double(v)))
            }
            TokenClass::StringLiteral => {
                self.advance();
                Ok(Node::Constant(Value::string(tok.text)))
            }
            TokenClass::Identifier => self.parse_identifier_operand(tok),
            TokenClass::SubexpBegin => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect_class(TokenClass::SubexpEnd, "')'")?;
                Ok(inner)
            }
            _ => Err(self.error(format!("unexpected token '{}'", tok.text), tok.position)),
        }
    }

    fn parse_identifier_operand(&mut self, tok: Token) -> Result<Node, SyntaxError> {
        // "not"/"b_not" are ordinary identifiers in the lexical policy;
        // they are reinterpreted as unary prefix operators unless followed
        // directly by '(' (the callable form).
        let is_unary_keyword =
            tok.text.eq_ignore_ascii_case("not") || tok.text.eq_ignore_ascii_case("b_not");
        let followed_by_call = matches!(
            self.tokens.get(self.pos + 1).map(|t| t.class),
            Some(TokenClass::SubexpBegin)
        );
        if is_unary_keyword && !followed_by_call {
            self.advance();
            let inner = self.parse_operand()?;
            let op: &'static str = if tok.text.eq_ignore_ascii_case("not") { "not" } else { "b_not" };
            return Ok(Node::Unary(op, Box::new(inner)));
        }

        self.advance();
        let name = tok.text;
        match self.peek().map(|t| t.class) {
            Some(TokenClass::SubexpBegin) => {
                self.advance();
                let args = self.parse_arglist()?;
                self.expect_class(TokenClass::SubexpEnd, "')'")?;
                let lowered = name.to_ascii_lowercase();
                if functions::is_registered(&lowered) {
                    let (min, max) = functions::arity_bounds(&lowered);
                    if args.len() < min || args.len() > max {
                        return Err(self.error(
                            format!("'{lowered}()' expects {}", arity_description(min, max)),
                            tok.position,
                        ));
                    }
                    Ok(Node::FunctionCall(lowered, args))
                } else {
                    Ok(Node::FunctionCall(name, args))
                }
            }
            Some(TokenClass::SubscrBegin) => {
                self.advance();
                let index = self.parse_expr()?;
                self.expect_class(TokenClass::SubscrEnd, "']'")?;
                Ok(Node::Subscript(name, Box::new(index)))
            }
            _ => Ok(Node::Variable(name)),
        }
    }

    fn parse_arglist(&mut self) -> Result<Vec<Node>, SyntaxError> {
        if matches!(self.peek().map(|t| t.class), Some(TokenClass::SubexpEnd)) {
            return Ok(Vec::new());
        }
        let mut args = vec![self.parse_expr()?];
        while matches!(self.peek(), Some(t) if t.class == TokenClass::Operator && t.text == ",") {
            self.advance();
            args.push(self.parse_expr()?);
        }
        Ok(args)
    }
}

fn arity_description(min: usize, max: usize) -> String {
    if min == max {
        format!("{min} argument(s)")
    } else {
        format!("between {min} and {max} argument(s)")
    }
}

fn parse_integral(text: &str) -> Value {
    match text.parse::<i32>() {
        Ok(i) => Value::int(i),
        Err(_) => Value::long(text.parse::<i64>().unwrap_or(0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::lexer::{LexPolicy, Lexer};

    fn eval(src: &str) -> Value {
        let policy = LexPolicy::default();
        let tokens = Lexer::new(src, &policy).tokenize().unwrap();
        let tree = compile(tokens, src).unwrap();
        let mut ctx = Context::new();
        tree.evaluate(&mut ctx).unwrap()
    }

    #[test]
    fn left_to_right_fold_has_no_precedence() {
        // 1+2*3 must fold left-to-right: (1+2)*3 = 9, not 7.
        assert_eq!(eval("1+2*3").to_int(), 9);
    }

    #[test]
    fn parentheses_override_the_fold() {
        assert_eq!(eval("(1+2)*3").to_int(), 9);
    }

    #[test]
    fn function_call_parses_and_evaluates() {
        assert_eq!(eval(r#"len("hello")"#).to_int(), 5);
    }

    #[test]
    fn subscript_after_identifier_only() {
        let policy = LexPolicy::default();
        let tokens = Lexer::new("[1]", &policy).tokenize().unwrap();
        assert!(compile(tokens, "[1]").is_err());
    }

    #[test]
    fn exponent_split_is_repaired_by_fix_real_numbers() {
        let mut ctx = Context::new();
        let policy = LexPolicy::default();
        let tokens = Lexer::new("1E-3+1", &policy).tokenize().unwrap();
        let tree = compile(tokens, "1E-3+1").unwrap();
        let v = tree.evaluate(&mut ctx).unwrap();
        assert!((v.to_double() - 1.001).abs() < 1e-9);
    }
}
