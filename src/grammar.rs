//! Combinators for writing grammars in Rust.
//!
//! Each expression lowers to the same RPN an ABNF source text produces: binary
//! operators fold to the left and quoted literals are case-insensitive.

use std::ops::BitOr;
use crate::automata::Range;
use crate::error::{Result, SyntaxError};
use crate::rule::{RuleList, Token};

#[derive(Debug, Clone)]
pub struct Expr(ExprVariant);

#[derive(Debug, Clone)]
enum ExprVariant {
  Sym(String),
  Lit(Vec<u8>),
  Char(u32),
  Range(u32, u32),
  Seq(Vec<Expr>),
  Or(Vec<Expr>),
  Rep(Box<ExprRep>),
}

#[derive(Debug, Clone)]
struct ExprRep {
  min: u32,
  max: Option<u32>,
  expr: Expr,
}

/// A reference to another rule.
pub fn sym(
  sym: impl Into<String>,
) -> Expr {
  Expr(ExprVariant::Sym(sym.into()))
}

/// A quoted string, matched without regard to ASCII case.
pub fn lit(
  text: &str,
) -> Expr {
  Expr(ExprVariant::Lit(text.as_bytes().to_vec()))
}

/// A single character code, `%xNN`.
pub fn chr(
  code: u32,
) -> Expr {
  Expr(ExprVariant::Char(code))
}

/// A range of character codes, `%xNN-MM`.
pub fn range(
  lo: u32,
  hi: u32,
) -> Expr {
  Expr(ExprVariant::Range(lo, hi))
}

pub fn seq<const N: usize>(
  exprs: [Expr; N],
) -> Expr {
  Expr(ExprVariant::Seq(exprs.into()))
}

/// `*expr`
pub fn many(
  expr: Expr,
) -> Expr {
  rep(0, None, expr)
}

/// `1*expr`
pub fn some(
  expr: Expr,
) -> Expr {
  rep(1, None, expr)
}

/// `[expr]`
pub fn option(
  expr: Expr,
) -> Expr {
  rep(0, Some(1), expr)
}

pub fn rep(
  min: u32,
  max: Option<u32>,
  expr: Expr,
) -> Expr {
  Expr(ExprVariant::Rep(Box::new(ExprRep {
    min,
    max,
    expr,
  })))
}

impl BitOr for Expr {
  type Output = Expr;

  fn bitor(self, rhs: Expr) -> Expr {
    match (self.0, rhs.0) {
      (ExprVariant::Or(mut x), ExprVariant::Or(mut y)) => {
        x.append(&mut y);
        Expr(ExprVariant::Or(x))
      }
      (ExprVariant::Or(mut x), y) => {
        x.push(Expr(y));
        Expr(ExprVariant::Or(x))
      }
      (x, ExprVariant::Or(mut y)) => {
        y.insert(0, Expr(x));
        Expr(ExprVariant::Or(y))
      }
      (x, y) => {
        Expr(ExprVariant::Or(vec![Expr(x), Expr(y)]))
      }
    }
  }
}

impl Expr {
  /// Lowers the expression to RPN tokens.
  pub fn to_tokens(&self) -> Result<Vec<Token>> {
    let mut tokens = vec![];
    self.lower(&mut tokens)?;
    Ok(tokens)
  }

  fn lower(&self, out: &mut Vec<Token>) -> Result<()> {
    match &self.0 {
      ExprVariant::Sym(name) => out.push(Token::RuleName(name.clone())),
      ExprVariant::Lit(text) => out.extend(literal(text)?),
      ExprVariant::Char(code) => out.push(Token::Char(*code)),
      ExprVariant::Range(lo, hi) => out.push(Token::Num(Range::new(*lo, *hi)?)),
      ExprVariant::Seq(exprs) => fold(exprs, Token::Concatenation, out)?,
      ExprVariant::Or(exprs) => fold(exprs, Token::Alternation, out)?,
      ExprVariant::Rep(rep) => {
        rep.expr.lower(out)?;
        out.push(Token::Repetition { min: rep.min, max: rep.max });
      }
    }
    Ok(())
  }
}

fn fold(exprs: &[Expr], op: Token, out: &mut Vec<Token>) -> Result<()> {
  let (first, rest) = exprs.split_first()
    .ok_or_else(|| SyntaxError::new("an empty sequence or alternation has no meaning"))?;
  first.lower(out)?;
  for expr in rest {
    expr.lower(out)?;
    out.push(op.clone());
  }
  Ok(())
}

/// RPN for a quoted string. Letters match either case, lowercase first.
pub(crate) fn literal(text: &[u8]) -> Result<Vec<Token>> {
  if text.is_empty() {
    return Err(SyntaxError::new("empty quoted strings are not supported"));
  }
  let mut out = vec![];
  for (i, &b) in text.iter().enumerate() {
    if b.is_ascii_alphabetic() {
      out.push(Token::Char(b.to_ascii_lowercase() as u32));
      out.push(Token::Char(b.to_ascii_uppercase() as u32));
      out.push(Token::Alternation);
    } else {
      out.push(Token::Char(b as u32));
    }
    if i > 0 {
      out.push(Token::Concatenation);
    }
  }
  Ok(out)
}

/// Lowers every rule, keeping the declaration order.
pub fn definitions(
  rules: &[(&str, Expr)],
) -> Result<Vec<(String, Vec<Token>)>> {
  rules.iter()
    .map(|(name, expr)| expr.to_tokens().map(|tokens| ((*name).to_owned(), tokens)))
    .collect()
}

pub fn grammar(
  rules: &[(&str, Expr)],
) -> Result<RuleList> {
  RuleList::new(definitions(rules)?)
}
