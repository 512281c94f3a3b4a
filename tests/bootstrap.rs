//! End-to-end runs: ABNF text through the meta parser, then through the
//! grammar it describes.

use abnf_gen::meta::{self, META_GRAMMAR};
use abnf_gen::source::Source;
use abnf_gen::{build, AbnfParser, Compiled, Config, Node};
use pretty_assertions::assert_eq;

fn compile(text: &str) -> Compiled {
  build(&Config::default(), text.as_bytes()).unwrap().unwrap()
}

fn rule_name<'a>(compiled: &'a Compiled, node: &Node) -> &'a str {
  compiled.table.rule_name(node.rule().unwrap()).unwrap()
}

#[test]
fn meta_grammar_compiles_itself() {
  let compiled = compile(META_GRAMMAR);
  assert_eq!(compiled.rules, meta::rules().unwrap());

  let source = Source::new(META_GRAMMAR.as_bytes());
  let parser = compiled.clone().into_parser();
  let tree = parser.parse(source.text()).unwrap();

  assert_eq!(rule_name(&compiled, &tree), "rulelist");
  let rules = tree.children().iter()
    .filter(|child| child.rule().map(|id| compiled.table.rule_name(id)) == Some(Some("rule")))
    .count();
  assert_eq!(rules, 17);
}

#[test]
fn generated_parser_matches_longest_alternative() {
  let compiled = compile("S = *( A / B / C )\nA = \"a\"\nB = \"ab\"\nC = \"b\"\n");
  let parser = compiled.clone().into_parser();

  let tree = parser.parse(b"ab").unwrap();
  let names = tree.children().iter()
    .map(|child| rule_name(&compiled, child))
    .collect::<Vec<_>>();
  assert_eq!(names, vec!["B"]);

  let tree = parser.parse(b"bAB").unwrap();
  let names = tree.children().iter()
    .map(|child| rule_name(&compiled, child))
    .collect::<Vec<_>>();
  assert_eq!(names, vec!["C", "B"]);
}

#[test]
fn user_grammar_end_to_end() {
  let compiled = compile(concat!(
    "; dotted version numbers\r\n",
    "version    = number 1*( \".\" number ) [ suffix ]\r\n",
    "number     = 1*DIGIT\r\n",
    "suffix     = \"-\" 1*( ALPHA / DIGIT )\r\n",
  ));
  let parser = compiled.clone().into_parser();

  let tree = parser.parse(b"1.22.3-rc1").unwrap();
  assert_eq!(tree.text(), b"1.22.3-rc1");
  let parts = tree.children().iter()
    .filter_map(|child| child.rule().map(|_| String::from_utf8(child.text()).unwrap()))
    .collect::<Vec<_>>();
  assert_eq!(parts, vec!["1", "22", "3", "-rc1"]);

  let err = parser.parse(b"1..2").unwrap_err();
  assert_eq!(err.message(), "line 1, column 3: unexpected \".\"");
  assert!(parser.parse(b"7").is_err());
}

#[test]
fn chosen_start_rule() {
  let config = Config {
    start: Some("number".to_owned()),
    ..Config::default()
  };
  let compiled = build(&config, b"version = number \".\" number\nnumber = 1*DIGIT\n")
    .unwrap()
    .unwrap();
  let parser = compiled.into_parser();

  assert!(parser.parse(b"42").is_ok());
  assert!(parser.parse(b"4.2").is_err());
}

#[test]
fn grammar_without_rules() {
  assert!(build(&Config::default(), b"").unwrap().is_none());
  assert!(build(&Config::default(), b"; just a comment\r\n\r\n").unwrap().is_none());
}

#[test]
fn unicode_is_rejected_when_compiling() {
  let rules = AbnfParser::new().unwrap().parse(b"a = %x3042\n").unwrap();
  let err = Compiled::new(rules, None).unwrap_err();
  insta::assert_snapshot!(err.to_string(),
    @"ABNF doesn't support Unicode, character codes must be in range [0, 255].");
}

/// The ABNF definition of ABNF from RFC 5234, section 4.
const RFC5234: &str = r#"rulelist       =  1*( rule / (*c-wsp c-nl) )

rule           =  rulename defined-as elements c-nl
                       ; continues if next line starts
                       ;  with white space

rulename       =  ALPHA *(ALPHA / DIGIT / "-")

defined-as     =  *c-wsp ("=" / "=/") *c-wsp
                       ; basic rules definition and
                       ;  incremental alternatives

elements       =  alternation *c-wsp

c-wsp          =  WSP / (c-nl WSP)

c-nl           =  comment / CRLF
                       ; comment or newline

comment        =  ";" *(WSP / VCHAR) CRLF

alternation    =  concatenation
                  *(*c-wsp "/" *c-wsp concatenation)

concatenation  =  repetition *(1*c-wsp repetition)

repetition     =  [repeat] element

repeat         =  1*DIGIT / (*DIGIT "*" *DIGIT)

element        =  rulename / group / option /
                  char-val / num-val / prose-val

group          =  "(" *c-wsp alternation *c-wsp ")"

option         =  "[" *c-wsp alternation *c-wsp "]"

char-val       =  DQUOTE *(%x20-21 / %x23-7E) DQUOTE
                       ; quoted string of SP and VCHAR
                       ;  without DQUOTE

num-val        =  "%" (bin-val / dec-val / hex-val)

bin-val        =  "b" 1*BIT
                  [ 1*("." 1*BIT) / ("-" 1*BIT) ]
                       ; series of concatenated bit values
                       ;  or single ONEOF range

dec-val        =  "d" 1*DIGIT
                  [ 1*("." 1*DIGIT) / ("-" 1*DIGIT) ]

hex-val        =  "x" 1*HEXDIG
                  [ 1*("." 1*HEXDIG) / ("-" 1*HEXDIG) ]

prose-val      =  "<" *(%x20-3D / %x3F-7E) ">"
                       ; bracketed string of SP and VCHAR
                       ;  without angles
                       ; prose description, to be used as
                       ;  last resort
"#;

#[test]
fn rfc_grammar_needs_more_than_one_byte_of_lookahead() {
  let compiled = compile(RFC5234);
  assert_eq!(compiled.rules.len(), 21 + 12);

  // After a repetition, CR may start a continuation line (`c-nl WSP`) or end
  // the rule (`c-nl`). The shift wins, so the line break is always read as
  // the start of a continuation.
  let conflicts = compiled.table.describe_conflicts();
  assert!(
    conflicts.iter().any(|line| line.ends_with("on 0x0d: shift wins over reduce 'concatenation'")),
    "{:#?}", conflicts);

  let parser = compiled.into_parser();
  let err = parser.parse(b"a = b\r\n").unwrap_err();
  assert_eq!(err.message(), "line 2, column 1: unexpected end of input");
  let err = parser.parse(b"a = b\r\n  / c\r\n").unwrap_err();
  assert_eq!(err.message(), "line 2, column 3: unexpected \"/\"");

  // the meta grammar takes whitespace after each element and reads both forms
  let abnf = AbnfParser::new().unwrap();
  assert_eq!(abnf.parse(b"a = DIGIT\r\n").unwrap().len(), 2);
  assert_eq!(abnf.parse(b"a = DIGIT\r\n  / ALPHA\r\n").unwrap().len(), 3);
}
