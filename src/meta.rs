//! The grammar of ABNF, written both with the combinators and as ABNF text.
//!
//! Whitespace trails the element it follows, which keeps every decision
//! of the generated table down to a single byte of lookahead. Comments and
//! continuation lines never reach the parser; [`crate::source::Source`]
//! removes them first.

use crate::abnf::RuleListBuilder;
use crate::error::Result;
use crate::grammar::*;
use crate::rule::RuleList;

pub const META_GRAMMAR: &str = r#"; ABNF as read by abnf-gen, core rules come from RFC 5234
rulelist      = *( rule / ( *WSP LF ) )
rule          = rulename *WSP defined-as *WSP alternation LF
rulename      = ALPHA *( ALPHA / DIGIT / "-" )
defined-as    = "=" / "=/"      ; "=/" adds alternatives to a rule
alternation   = concatenation *( "/" *WSP concatenation )
concatenation = 1*( repetition *WSP )
repetition    = [ repeat ] element
repeat        = 1*DIGIT / ( *DIGIT "*" *DIGIT )
element       = rulename / group / option /
                char-val / num-val / prose-val
group         = "(" *WSP alternation ")"
option        = "[" *WSP alternation "]"
char-val      = DQUOTE *( %x20-21 / %x23-7E ) DQUOTE
num-val       = "%" ( bin-val / dec-val / hex-val )
bin-val       = "b" 1*BIT [ 1*( "." 1*BIT ) / ( "-" 1*BIT ) ]
dec-val       = "d" 1*DIGIT [ 1*( "." 1*DIGIT ) / ( "-" 1*DIGIT ) ]
hex-val       = "x" 1*HEXDIG [ 1*( "." 1*HEXDIG ) / ( "-" 1*HEXDIG ) ]
prose-val     = "<" *( %x20-3D / %x3F-7E ) ">"   ; bracketed prose
"#;

fn definitions() -> Vec<(&'static str, Expr)> {
  let wsp = || many(sym("WSP"));
  vec![
    ("rulelist", many(sym("rule") | seq([wsp(), sym("LF")]))),
    ("rule", seq([
      sym("rulename"), wsp(), sym("defined-as"), wsp(), sym("alternation"), sym("LF"),
    ])),
    ("rulename", seq([sym("ALPHA"), many(sym("ALPHA") | sym("DIGIT") | lit("-"))])),
    ("defined-as", lit("=") | lit("=/")),
    ("alternation", seq([
      sym("concatenation"),
      many(seq([lit("/"), wsp(), sym("concatenation")])),
    ])),
    ("concatenation", some(seq([sym("repetition"), wsp()]))),
    ("repetition", seq([option(sym("repeat")), sym("element")])),
    ("repeat", some(sym("DIGIT")) | seq([many(sym("DIGIT")), lit("*"), many(sym("DIGIT"))])),
    ("element", sym("rulename") | sym("group") | sym("option")
      | sym("char-val") | sym("num-val") | sym("prose-val")),
    ("group", seq([lit("("), wsp(), sym("alternation"), lit(")")])),
    ("option", seq([lit("["), wsp(), sym("alternation"), lit("]")])),
    ("char-val", seq([
      sym("DQUOTE"), many(range(0x20, 0x21) | range(0x23, 0x7e)), sym("DQUOTE"),
    ])),
    ("num-val", seq([lit("%"), sym("bin-val") | sym("dec-val") | sym("hex-val")])),
    ("bin-val", num_val("b", "BIT")),
    ("dec-val", num_val("d", "DIGIT")),
    ("hex-val", num_val("x", "HEXDIG")),
    ("prose-val", seq([lit("<"), many(range(0x20, 0x3d) | range(0x3f, 0x7e)), lit(">")])),
  ]
}

/// `prefix 1*digit [ 1*( "." 1*digit ) / ( "-" 1*digit ) ]`
fn num_val(
  prefix: &str,
  digit: &str,
) -> Expr {
  seq([
    lit(prefix),
    some(sym(digit)),
    option(some(seq([lit("."), some(sym(digit))])) | seq([lit("-"), some(sym(digit))])),
  ])
}

/// The meta-grammar with the core rules it uses appended.
pub fn rules() -> Result<RuleList> {
  let mut builder = RuleListBuilder::new();
  for (name, tokens) in crate::grammar::definitions(&definitions())? {
    builder.define(&name, tokens)?;
  }
  builder.build()
}
