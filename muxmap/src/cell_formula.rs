// SPDX-License-Identifier: Apache-2.0

//! Boolean formula AST, parser and bit-parallel evaluator for Liberty cell
//! functions.
//!
//! Supported syntax: `*` / `&` (and), `+` / `|` (or), `^` (xor), prefix `!`
//! and postfix `'` (not), parentheses and the constants `0` / `1`.
//!
//! A chain of one operator is kept as a single n-ary node, so a
//! sum-of-products over thousands of terms stays a shallow tree.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Input(String),
    And(Vec<Term>),
    Or(Vec<Term>),
    Xor(Vec<Term>),
    Negate(Box<Term>),
    Constant(bool),
}

impl Term {
    /// Recursively collect all input names in the formula.
    pub fn inputs(&self) -> Vec<String> {
        let mut v = Vec::new();
        self.collect_inputs(&mut v);
        v
    }
    fn collect_inputs(&self, v: &mut Vec<String>) {
        match self {
            Term::Input(s) => {
                if !v.contains(s) {
                    v.push(s.clone())
                }
            }
            Term::And(ts) | Term::Or(ts) | Term::Xor(ts) => {
                for t in ts {
                    t.collect_inputs(v);
                }
            }
            Term::Negate(t) => t.collect_inputs(v),
            Term::Constant(_) => {}
        }
    }

    /// Resolves input names to positions in `pins`, producing a term that can
    /// be evaluated over a slice of lane words.
    pub fn bind(&self, pins: &[&str]) -> Result<BoundTerm, String> {
        let positions: HashMap<&str, usize> =
            pins.iter().enumerate().map(|(i, p)| (*p, i)).collect();
        self.bind_with(&positions)
    }

    fn bind_with(&self, positions: &HashMap<&str, usize>) -> Result<BoundTerm, String> {
        let bind_all = |ts: &[Term]| -> Result<Vec<BoundTerm>, String> {
            ts.iter().map(|t| t.bind_with(positions)).collect()
        };
        Ok(match self {
            Term::Input(name) => match positions.get(name.as_str()) {
                Some(i) => BoundTerm::Pin(*i),
                None => return Err(format!("formula refers to unknown pin '{}'", name)),
            },
            Term::And(ts) => BoundTerm::And(bind_all(ts)?),
            Term::Or(ts) => BoundTerm::Or(bind_all(ts)?),
            Term::Xor(ts) => BoundTerm::Xor(bind_all(ts)?),
            Term::Negate(t) => BoundTerm::Negate(Box::new(t.bind_with(positions)?)),
            Term::Constant(b) => BoundTerm::Constant(*b),
        })
    }
}

fn write_joined(f: &mut std::fmt::Formatter<'_>, ts: &[Term], op: &str) -> std::fmt::Result {
    write!(f, "(")?;
    for (i, t) in ts.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", op)?;
        }
        write!(f, "{}", t)?;
    }
    write!(f, ")")
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Input(s) => write!(f, "{}", s),
            Term::And(ts) => write_joined(f, ts, "*"),
            Term::Or(ts) => write_joined(f, ts, "+"),
            Term::Xor(ts) => write_joined(f, ts, "^"),
            Term::Negate(t) => write!(f, "!{}", t),
            Term::Constant(b) => write!(f, "{}", if *b { 1 } else { 0 }),
        }
    }
}

/// A [`Term`] whose inputs are pin positions.
///
/// Evaluation is bit-parallel: every bit of a `u64` lane word is an
/// independent assignment of the inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundTerm {
    Pin(usize),
    And(Vec<BoundTerm>),
    Or(Vec<BoundTerm>),
    Xor(Vec<BoundTerm>),
    Negate(Box<BoundTerm>),
    Constant(bool),
}

impl BoundTerm {
    /// `values[i]` holds the lanes of pin `i`.
    pub fn eval(&self, values: &[u64]) -> u64 {
        match self {
            BoundTerm::Pin(i) => values[*i],
            BoundTerm::And(ts) => ts.iter().fold(u64::MAX, |acc, t| acc & t.eval(values)),
            BoundTerm::Or(ts) => ts.iter().fold(0, |acc, t| acc | t.eval(values)),
            BoundTerm::Xor(ts) => ts.iter().fold(0, |acc, t| acc ^ t.eval(values)),
            BoundTerm::Negate(t) => !t.eval(values),
            BoundTerm::Constant(true) => u64::MAX,
            BoundTerm::Constant(false) => 0,
        }
    }
}

/// Parse a Liberty boolean formula string into a Term AST.
pub fn parse_formula(s: &str) -> Result<Term, String> {
    let tokens = tokenize(s)?;
    let (term, rest) = parse_expr(&tokens)?;
    if !rest.is_empty() {
        return Err(format!("Unexpected tokens at end: {:?}", rest));
    }
    Ok(term)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
    Ident(String),
    LParen,
    RParen,
    And,
    Or,
    Xor,
    Not,
    PostNot,
    Const(bool),
}

fn tokenize(s: &str) -> Result<Vec<Tok>, String> {
    let mut tokens = Vec::new();
    let mut chars = s.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' | '"' => {
                chars.next();
            }
            '(' => {
                tokens.push(Tok::LParen);
                chars.next();
            }
            ')' => {
                tokens.push(Tok::RParen);
                chars.next();
            }
            '*' | '&' => {
                tokens.push(Tok::And);
                chars.next();
            }
            '+' | '|' => {
                tokens.push(Tok::Or);
                chars.next();
            }
            '^' => {
                tokens.push(Tok::Xor);
                chars.next();
            }
            '!' => {
                tokens.push(Tok::Not);
                chars.next();
            }
            '\'' => {
                tokens.push(Tok::PostNot);
                chars.next();
            }
            '1' => {
                tokens.push(Tok::Const(true));
                chars.next();
            }
            '0' => {
                tokens.push(Tok::Const(false));
                chars.next();
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c2) = chars.peek() {
                    if c2.is_ascii_alphanumeric() || c2 == '_' {
                        ident.push(c2);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Tok::Ident(ident));
            }
            _ => return Err(format!("Unexpected character in formula: '{}'", c)),
        }
    }
    Ok(tokens)
}

/// A lone operand stands for itself; longer chains become one n-ary node.
fn collapse(mut operands: Vec<Term>, node: fn(Vec<Term>) -> Term) -> Term {
    if operands.len() == 1 {
        operands.remove(0)
    } else {
        node(operands)
    }
}

// Precedence, loosest first: or, xor, and, not.
fn parse_expr(tokens: &[Tok]) -> Result<(Term, &[Tok]), String> {
    parse_or(tokens)
}

fn parse_or(tokens: &[Tok]) -> Result<(Term, &[Tok]), String> {
    let (first, mut rest) = parse_xor(tokens)?;
    let mut operands = vec![first];
    while let Some(Tok::Or) = rest.first() {
        let (rhs, rest2) = parse_xor(&rest[1..])?;
        operands.push(rhs);
        rest = rest2;
    }
    Ok((collapse(operands, Term::Or), rest))
}

fn parse_xor(tokens: &[Tok]) -> Result<(Term, &[Tok]), String> {
    let (first, mut rest) = parse_and(tokens)?;
    let mut operands = vec![first];
    while let Some(Tok::Xor) = rest.first() {
        let (rhs, rest2) = parse_and(&rest[1..])?;
        operands.push(rhs);
        rest = rest2;
    }
    Ok((collapse(operands, Term::Xor), rest))
}

fn parse_and(tokens: &[Tok]) -> Result<(Term, &[Tok]), String> {
    let (first, mut rest) = parse_not(tokens)?;
    let mut operands = vec![first];
    while let Some(Tok::And) = rest.first() {
        let (rhs, rest2) = parse_not(&rest[1..])?;
        operands.push(rhs);
        rest = rest2;
    }
    Ok((collapse(operands, Term::And), rest))
}

fn parse_not(tokens: &[Tok]) -> Result<(Term, &[Tok]), String> {
    if let Some(Tok::Not) = tokens.first() {
        let (expr, rest) = parse_not(&tokens[1..])?;
        Ok((Term::Negate(Box::new(expr)), rest))
    } else {
        let (mut expr, mut rest) = parse_atom(tokens)?;
        while let Some(Tok::PostNot) = rest.first() {
            expr = Term::Negate(Box::new(expr));
            rest = &rest[1..];
        }
        Ok((expr, rest))
    }
}

fn parse_atom(tokens: &[Tok]) -> Result<(Term, &[Tok]), String> {
    match tokens.first() {
        Some(Tok::Ident(s)) => Ok((Term::Input(s.clone()), &tokens[1..])),
        Some(Tok::Const(b)) => Ok((Term::Constant(*b), &tokens[1..])),
        Some(Tok::LParen) => {
            let (expr, rest) = parse_expr(&tokens[1..])?;
            match rest.first() {
                Some(Tok::RParen) => Ok((expr, &rest[1..])),
                _ => Err("Expected ')'".to_string()),
            }
        }
        Some(tok) => Err(format!("Unexpected token: {:?}", tok)),
        None => Err("Unexpected end of input".to_string()),
    }
}
