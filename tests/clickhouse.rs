use lucene_filter::error::{QueryError, RenderError, StructureError};
use lucene_filter::expr::Operator;
use lucene_filter::to_filter;
use rstest::rstest;

#[rstest]
#[case::string_equality("a:b", "lowerUTF8(strings.value[indexOf(strings.name,'a')]) like lowerUTF8('b')")]
#[case::integer("a:5", "numbers.value[indexOf(numbers.name,'a')] = 5")]
#[case::negative_integer("a:-5", "numbers.value[indexOf(numbers.name,'a')] = -5")]
#[case::float("a:1.5", "numbers.value[indexOf(numbers.name,'a')] = 1.5")]
#[case::boolean("a:true", "bools.value[indexOf(bools.name,'a')] = true")]
#[case::single_letter_is_text("a:f", "lowerUTF8(strings.value[indexOf(strings.name,'a')]) like lowerUTF8('f')")]
#[case::boolean_list("a:(true OR false)", "bools.value[indexOf(bools.name,'a')] IN (true, false)")]
#[case::quoted_number_stays_text("a:\"5\"", "lowerUTF8(strings.value[indexOf(strings.name,'a')]) like lowerUTF8('5')")]
#[case::quoted_phrase("a:\"b AND c\"", "lowerUTF8(strings.value[indexOf(strings.name,'a')]) like lowerUTF8('b AND c')")]
#[case::single_quotes_doubled("a:'b'", "lowerUTF8(strings.value[indexOf(strings.name,'a')]) like lowerUTF8('''b''')")]
#[case::greater("a:>22", "numbers.value[indexOf(numbers.name,'a')] > 22")]
#[case::greater_eq("a:>=22", "numbers.value[indexOf(numbers.name,'a')] >= 22")]
#[case::less("a:<22", "numbers.value[indexOf(numbers.name,'a')] < 22")]
#[case::less_eq("a:<=22", "numbers.value[indexOf(numbers.name,'a')] <= 22")]
#[case::comparisons_joined(
    "a:<22 AND b:>33",
    "(numbers.value[indexOf(numbers.name,'a')] < 22) AND (numbers.value[indexOf(numbers.name,'b')] > 33)"
)]
#[case::wildcard_star("a:b*", "lowerUTF8(strings.value[indexOf(strings.name,'a')]) like lowerUTF8('b%')")]
#[case::wildcard_question("a:b?z", "lowerUTF8(strings.value[indexOf(strings.name,'a')]) like lowerUTF8('b_z')")]
#[case::escaped_star_is_not_a_wildcard(r"a:b\*", "lowerUTF8(strings.value[indexOf(strings.name,'a')]) like lowerUTF8('b*')")]
#[case::regexp("a:/b [c]/", "match(lowerUTF8(strings.value[indexOf(strings.name,'a')]),lowerUTF8('b [c]'))")]
#[case::regexp_with_quote(r#"a:/b "[c]/"#, r#"match(lowerUTF8(strings.value[indexOf(strings.name,'a')]),lowerUTF8('b "[c]'))"#)]
#[case::regexp_escaped_slash(
    r"url:/example.com\/foo\/bar\/.*/",
    r"match(lowerUTF8(strings.value[indexOf(strings.name,'url')]),lowerUTF8('example.com\\/foo\\/bar\\/.*'))"
)]
#[case::range_inclusive(
    "a:[1 TO 5]",
    "numbers.value[indexOf(numbers.name,'a')] >= 1 AND numbers.value[indexOf(numbers.name,'a')] <= 5"
)]
#[case::range_open_min_inclusive("a:[* TO 5]", "numbers.value[indexOf(numbers.name,'a')] <= 5")]
#[case::range_open_min_exclusive("a:{* TO 5}", "numbers.value[indexOf(numbers.name,'a')] < 5")]
#[case::range_open_max_exclusive("a:{2 TO *}", "numbers.value[indexOf(numbers.name,'a')] > 2")]
#[case::range_float(
    "a:[0.5 TO 2]",
    "numbers.value[indexOf(numbers.name,'a')] >= 0.50 AND numbers.value[indexOf(numbers.name,'a')] <= 2.00"
)]
#[case::range_strings("a:{foo TO bar}", "strings.value[indexOf(strings.name,'a')] BETWEEN 'foo' AND 'bar'")]
#[case::range_quoted_strings(r#"a:{"ab" TO "az"}"#, "strings.value[indexOf(strings.name,'a')] BETWEEN 'ab' AND 'az'")]
#[case::value_list("a:(foo OR baz OR bar)", "strings.value[indexOf(strings.name,'a')] IN ('foo', 'baz', 'bar')")]
#[case::numeric_list("a:(1 OR 2)", "numbers.value[indexOf(numbers.name,'a')] IN (1, 2)")]
#[case::source_field("_source:error", "match(lowerUTF8(_source), lowerUTF8('error'))")]
#[case::source_field_question("_source:a?c", "match(lowerUTF8(_source), lowerUTF8('a.c'))")]
#[case::source_field_star("_source:err*", "match(lowerUTF8(_source), lowerUTF8('err.*'))")]
#[case::source_field_dot_is_literal("_source:v1.*", r"match(lowerUTF8(_source), lowerUTF8('v1\\..*'))")]
#[case::source_field_regexp("_source:/err.*/", "match(lowerUTF8(_source), lowerUTF8('err.*'))")]
#[case::implicit_and("a b", "'a' AND 'b'")]
#[case::explicit_and("a AND b", "'a' AND 'b'")]
#[case::or("a OR b", "'a' OR 'b'")]
#[case::not("NOT b", "NOT('b')")]
#[case::fields_implicit_and(
    "a:b c:d",
    "(lowerUTF8(strings.value[indexOf(strings.name,'a')]) like lowerUTF8('b')) AND (lowerUTF8(strings.value[indexOf(strings.name,'c')]) like lowerUTF8('d'))"
)]
#[case::nested_not(
    "a:foo OR NOT b:bar",
    "(lowerUTF8(strings.value[indexOf(strings.name,'a')]) like lowerUTF8('foo')) OR (NOT(lowerUTF8(strings.value[indexOf(strings.name,'b')]) like lowerUTF8('bar')))"
)]
#[case::group_and_field(
    "(a:foo OR b:bar) AND c:baz",
    "((lowerUTF8(strings.value[indexOf(strings.name,'a')]) like lowerUTF8('foo')) OR (lowerUTF8(strings.value[indexOf(strings.name,'b')]) like lowerUTF8('bar'))) AND (lowerUTF8(strings.value[indexOf(strings.name,'c')]) like lowerUTF8('baz'))"
)]
#[case::must("+a:b", "lowerUTF8(strings.value[indexOf(strings.name,'a')]) like lowerUTF8('b')")]
#[case::must_not("-a:b", "NOT(lowerUTF8(strings.value[indexOf(strings.name,'a')]) like lowerUTF8('b'))")]
#[case::must_not_locality(
    "d:e AND (-a:b AND +f:e)",
    "(lowerUTF8(strings.value[indexOf(strings.name,'d')]) like lowerUTF8('e')) AND ((NOT(lowerUTF8(strings.value[indexOf(strings.name,'a')]) like lowerUTF8('b'))) AND (lowerUTF8(strings.value[indexOf(strings.name,'f')]) like lowerUTF8('e')))"
)]
#[case::escaped_value(r"a:\(1\+1\)\:2", "lowerUTF8(strings.value[indexOf(strings.name,'a')]) like lowerUTF8('(1+1):2')")]
#[case::escaped_field(r"foo\ bar:b", "lowerUTF8(strings.value[indexOf(strings.name,'foo bar')]) like lowerUTF8('b')")]
#[case::digit_led_field("1a:b", "lowerUTF8(strings.value[indexOf(strings.name,'1a')]) like lowerUTF8('b')")]
#[case::must_not_digit_led_field("-1a:b", "NOT(lowerUTF8(strings.value[indexOf(strings.name,'1a')]) like lowerUTF8('b'))")]
#[case::must_numeric_field("+2024:x", "lowerUTF8(strings.value[indexOf(strings.name,'2024')]) like lowerUTF8('x')")]
#[case::negative_comparison("b:<=-20", "numbers.value[indexOf(numbers.name,'b')] <= -20")]
#[case::quoted_field(r#""a b":c"#, "lowerUTF8(strings.value[indexOf(strings.name,'a b')]) like lowerUTF8('c')")]
#[case::trailing_backslash(
    r"a:x\\ b:c",
    r"(lowerUTF8(strings.value[indexOf(strings.name,'a')]) like lowerUTF8('x\\\\')) AND (lowerUTF8(strings.value[indexOf(strings.name,'b')]) like lowerUTF8('c'))"
)]
#[case::quoted_backslash(r#"a:"x\\""#, r"lowerUTF8(strings.value[indexOf(strings.name,'a')]) like lowerUTF8('x\\\\')")]
#[case::backslash_in_wildcard(r"a:c\\*", r"lowerUTF8(strings.value[indexOf(strings.name,'a')]) like lowerUTF8('c\\\\%')")]
#[case::precedence("a OR b AND c OR d", "('a' OR ('b' AND 'c')) OR 'd'")]
#[case::precedence_with_not("NOT a OR b AND NOT c OR d", "((NOT('a')) OR ('b' AND (NOT('c')))) OR 'd'")]
#[case::precedence_fields(
    "a:b AND c:d OR e:f OR h:i AND j:k",
    "(((lowerUTF8(strings.value[indexOf(strings.name,'a')]) like lowerUTF8('b')) AND (lowerUTF8(strings.value[indexOf(strings.name,'c')]) like lowerUTF8('d'))) OR (lowerUTF8(strings.value[indexOf(strings.name,'e')]) like lowerUTF8('f'))) OR ((lowerUTF8(strings.value[indexOf(strings.name,'h')]) like lowerUTF8('i')) AND (lowerUTF8(strings.value[indexOf(strings.name,'j')]) like lowerUTF8('k')))"
)]
#[case::nested_groups(
    "((title:foo OR title:bar) AND (body:foo OR body:bar)) OR k:v",
    "(((lowerUTF8(strings.value[indexOf(strings.name,'title')]) like lowerUTF8('foo')) OR (lowerUTF8(strings.value[indexOf(strings.name,'title')]) like lowerUTF8('bar'))) AND ((lowerUTF8(strings.value[indexOf(strings.name,'body')]) like lowerUTF8('foo')) OR (lowerUTF8(strings.value[indexOf(strings.name,'body')]) like lowerUTF8('bar')))) OR (lowerUTF8(strings.value[indexOf(strings.name,'k')]) like lowerUTF8('v'))"
)]
#[case::group_on_right("a AND (c OR d)", "'a' AND ('c' OR 'd')")]
#[case::lowercase_to("c:[* to -1] OR d", "(numbers.value[indexOf(numbers.name,'c')] <= -1) OR 'd'")]
#[case::range_in_precedence(
    "a OR b AND c:[* to -1] OR d AND NOT +e:f",
    "('a' OR ('b' AND (numbers.value[indexOf(numbers.name,'c')] <= -1))) OR ('d' AND (NOT(lowerUTF8(strings.value[indexOf(strings.name,'e')]) like lowerUTF8('f'))))"
)]
#[case::signed_comparison(
    "a:>10 AND -b:<=-20",
    "(numbers.value[indexOf(numbers.name,'a')] > 10) AND (NOT(numbers.value[indexOf(numbers.name,'b')] <= -20))"
)]
#[case::distributed_group(
    "a:(b AND c*)",
    "(lowerUTF8(strings.value[indexOf(strings.name,'a')]) like lowerUTF8('b')) AND (lowerUTF8(strings.value[indexOf(strings.name,'a')]) like lowerUTF8('c%'))"
)]
fn renders(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(to_filter(input).as_deref(), Ok(expected), "input: {}", input);
}

#[rstest]
#[case::fuzzy("b AND a~", "unable to render operator [FUZZY]")]
#[case::fuzzy_distance("b AND a~10", "unable to render operator [FUZZY]")]
#[case::boost("b AND a^", "unable to render operator [BOOST]")]
#[case::boost_power("b AND a^10", "unable to render operator [BOOST]")]
#[case::boost_field("a:b^2 AND foo", "unable to render operator [BOOST]")]
#[case::fuzzy_field("a:b~2 AND foo", "unable to render operator [FUZZY]")]
fn rejects_unsupported_operators(#[case] input: &str, #[case] message: &str) {
    let error = to_filter(input).unwrap_err();
    assert_eq!(error.to_string(), message);
}

#[test]
fn rejects_null_byte() {
    let error = to_filter("a:\"b\0c\"").unwrap_err();
    assert_eq!(error, QueryError::Render(RenderError::NullByte("b\0c".to_string())));
}

#[test]
fn rejects_non_numeric_comparison() {
    let error = to_filter("a:>foo").unwrap_err();
    assert!(matches!(error, QueryError::Render(RenderError::NonNumericComparison { .. })));
}

#[test]
fn rejects_fully_open_range() {
    let error = to_filter("a:[* TO *]").unwrap_err();
    assert_eq!(error, QueryError::Render(RenderError::UnboundedRange("'a'".to_string())));
}

#[rstest]
#[case::open_paren("(a:b", StructureError::UnbalancedGroup { depth: 1 })]
#[case::nested_open_paren("((a:b)", StructureError::UnbalancedGroup { depth: 1 })]
#[case::empty_group("()", StructureError::EmptyGroup)]
#[case::stacked_modifiers("+-a:b", StructureError::NestedModifier { outer: Operator::Must, inner: Operator::MustNot })]
fn structural_errors(#[case] input: &str, #[case] expected: StructureError) {
    assert_eq!(to_filter(input), Err(QueryError::Structure(expected)));
}

#[rstest]
#[case::leading_separator(":b")]
#[case::dangling_and("a AND")]
#[case::dangling_or("a OR")]
#[case::incomplete_range("a:[1 TO")]
#[case::mismatched_bracket("a:[1 TO 5}")]
#[case::closing_paren("a)")]
#[case::zero_boost("a^0")]
fn syntax_errors(#[case] input: &str) {
    let error = to_filter(input).unwrap_err();
    assert!(matches!(error, QueryError::Syntax { .. }), "input: {}, got: {:?}", input, error);
}

#[rstest]
#[case::quote("a:\"open")]
#[case::regexp("a:/open")]
#[case::escape("a\\")]
fn lex_errors(#[case] input: &str) {
    let error = to_filter(input).unwrap_err();
    assert!(matches!(error, QueryError::Lex { .. }), "input: {}, got: {:?}", input, error);
}
