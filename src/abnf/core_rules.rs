//! The core rules of RFC 5234, appendix B.1.

use crate::grammar::*;

pub const CORE_RULE_NAMES: [&str; 16] = [
  "ALPHA", "BIT", "CHAR", "CR", "CRLF", "CTL", "DIGIT", "DQUOTE",
  "HEXDIG", "HTAB", "LF", "LWSP", "OCTET", "SP", "VCHAR", "WSP",
];

/// The definition of a core rule, looked up without regard to case. Returns
/// the canonical name along with it.
pub fn core_rule(name: &str) -> Option<(&'static str, Expr)> {
  let canonical = *CORE_RULE_NAMES.iter()
    .find(|core| core.eq_ignore_ascii_case(name))?;
  let expr = match canonical {
    "ALPHA" => range(0x41, 0x5a) | range(0x61, 0x7a),
    "BIT" => lit("0") | lit("1"),
    "CHAR" => range(0x01, 0x7f),
    "CR" => chr(0x0d),
    "CRLF" => seq([sym("CR"), sym("LF")]),
    "CTL" => range(0x00, 0x1f) | chr(0x7f),
    "DIGIT" => range(0x30, 0x39),
    "DQUOTE" => chr(0x22),
    "HEXDIG" => sym("DIGIT") | lit("A") | lit("B") | lit("C") | lit("D") | lit("E") | lit("F"),
    "HTAB" => chr(0x09),
    "LF" => chr(0x0a),
    "LWSP" => many(sym("WSP") | seq([sym("CRLF"), sym("WSP")])),
    "OCTET" => range(0x00, 0xff),
    "SP" => chr(0x20),
    "VCHAR" => range(0x21, 0x7e),
    "WSP" => sym("SP") | sym("HTAB"),
    _ => return None,
  };
  Some((canonical, expr))
}
