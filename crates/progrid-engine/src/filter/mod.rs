//! The predicate compiler.
//!
//! Turns a user-entered filter expression into a [`RowFilter`]: a callable
//! predicate over a single normalized field value, paired with the original
//! expression text for round-trip display.
//!
//! Three expression forms are supported, detected in this precedence order:
//!
//! 1. **Comparator form** — the expression begins with a comparison
//!    operator: `"> 14"`, `"!= 0"`, `"> 14 and <= 20"`. Numeric operands
//!    compare numerically, string operands compare verbatim against the
//!    normalized value.
//! 2. **Placeholder form** — the expression contains `$VAL`, which stands
//!    for the normalized value: `"$VAL.startswith('M')"`, `"'ar' in $VAL"`,
//!    `"$VAL == 'm' or $VAL == 'f'"`. Literals are normalized (trimmed,
//!    lowercased) to match.
//! 3. **Literal-match form** — anything else is a case-insensitive,
//!    whitespace-trimmed equality test: `"mario"` matches `"  Mario "`.
//!
//! Compilation is pure and performed once per save action; nothing is
//! cached beyond the returned filter.

mod eval;
mod parse;
mod types;

use indexmap::IndexMap;

pub use types::{FilterCompileError, ParseError, RowFilter, Span};

use crate::value::format_text;
use types::Predicate;

/// The operator prefixes that select the comparator form.
///
/// Detection is a plain prefix check on the trimmed expression; an
/// expression that *starts* like a comparator but does not parse as one
/// (`"=> 5"`, `"android"`, a leading `and`/`or`) is a compilation error,
/// not a fallback to the literal form.
const COMPARATOR_PREFIXES: &[&str] = &["<", "<=", "=>", ">", ">=", "==", "!=", "and", "or"];

/// Compile a single filter expression.
///
/// The expression must be non-empty after trimming. On success the returned
/// filter echoes the trimmed expression via [`RowFilter::source`].
pub fn compile_filter(expression: &str) -> Result<RowFilter, ParseError> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Err(ParseError::new(
            "filter expression is empty",
            Span::new(0, 0),
        ));
    }

    let predicate = if COMPARATOR_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
        parse::parse_comparator(trimmed)?
    } else if trimmed.contains("$VAL") {
        parse::parse_placeholder(trimmed)?
    } else {
        Predicate::Equals {
            text: format_text(trimmed),
        }
    };

    Ok(RowFilter::new(predicate, trimmed))
}

/// Compile a batch of per-column filter expressions.
///
/// Each column compiles independently: failures are reported per column and
/// do not prevent other columns from compiling. Blank expressions are
/// skipped (a blank entry clears a column's filter at the grid level).
/// Errors carry the column key; callers with access to header labels
/// substitute them before surfacing the error.
pub fn compile_filters<I, K, E>(entries: I) -> (IndexMap<String, RowFilter>, Vec<FilterCompileError>)
where
    I: IntoIterator<Item = (K, E)>,
    K: Into<String>,
    E: AsRef<str>,
{
    let mut filters = IndexMap::new();
    let mut errors = Vec::new();
    for (column, expression) in entries {
        let column = column.into();
        let expression = expression.as_ref();
        if expression.trim().is_empty() {
            continue;
        }
        match compile_filter(expression) {
            Ok(filter) => {
                filters.insert(column, filter);
            }
            Err(error) => errors.push(FilterCompileError { column, error }),
        }
    }
    (filters, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn matches(expression: &str, value: &str) -> bool {
        compile_filter(expression)
            .expect("expression should compile")
            .matches(&Value::from(value))
    }

    #[test]
    fn literal_form_is_case_and_whitespace_insensitive() {
        assert!(matches("Mario", "  mario  "));
        assert!(matches("  mario ", "Mario"));
        assert!(!matches("Mario", "mari"));
    }

    #[test]
    fn comparator_form_compares_numbers_numerically() {
        assert!(matches("> 14", "15"));
        assert!(!matches("> 14", "14"));
        // Lexicographically "9" > "14"; numerically it is not.
        assert!(!matches("> 14", "9"));
        assert!(!matches("> 14", "banana"));
        assert!(matches("== 0", " 0 "));
        assert!(matches("!= 0", "3"));
    }

    #[test]
    fn comparator_form_supports_and_or_chains() {
        let filter = compile_filter("> 14 and <= 20").unwrap();
        assert!(filter.matches(&Value::from(15.0)));
        assert!(!filter.matches(&Value::from(14.0)));
        assert!(!filter.matches(&Value::from(21.0)));

        let filter = compile_filter("== 1 or == 3").unwrap();
        assert!(filter.matches(&Value::from(1.0)));
        assert!(filter.matches(&Value::from(3.0)));
        assert!(!filter.matches(&Value::from(2.0)));
    }

    #[test]
    fn comparator_form_string_operands_are_verbatim() {
        // Only the value side is normalized, so a capitalized operand can
        // never match.
        assert!(!matches("== Rome", "Rome"));
        assert!(matches("== rome", "  Rome "));
        assert!(matches("== 'rome'", "Rome"));
    }

    #[test]
    fn placeholder_startswith_is_case_insensitive() {
        assert!(matches("$VAL.startswith('M')", "Mario"));
        assert!(matches("$VAL.startswith('M')", "Martin"));
        assert!(!matches("$VAL.startswith('M')", "Luigi"));
    }

    #[test]
    fn placeholder_endswith_and_membership() {
        assert!(matches("$VAL.endswith('io')", "Mario"));
        assert!(!matches("$VAL.endswith('io')", "Luigi"));
        assert!(matches("'ar' in $VAL", "Mario"));
        assert!(!matches("'ar' in $VAL", "Luigi"));
    }

    #[test]
    fn placeholder_comparisons_mirror_operand_order() {
        assert!(matches("$VAL == 'M'", "  m "));
        assert!(matches("14 < $VAL", "15"));
        assert!(!matches("14 < $VAL", "13"));
        assert!(matches("$VAL == 'a' or $VAL == 'b'", "B"));
    }

    #[test]
    fn compile_errors_name_the_offense() {
        let err = compile_filter("=> 5").unwrap_err();
        assert!(err.message.contains("=>"), "{}", err.message);

        let err = compile_filter("and > 5").unwrap_err();
        assert_eq!(err.message, "expected one of `<`, `<=`, `>`, `>=`, `==`, `!=`");

        // Looks like a comparator prefix, is not a comparator expression.
        assert!(compile_filter("android").is_err());

        let err = compile_filter("$VAL.upper() == 'M'").unwrap_err();
        assert!(err.message.contains("unsupported method"), "{}", err.message);

        assert!(compile_filter("   ").is_err());
        assert!(compile_filter("$VAL ==").is_err());
        assert!(compile_filter("> 14 15").is_err());
    }

    #[test]
    fn batch_compilation_scopes_errors_per_column() {
        let (filters, errors) = compile_filters([
            ("age", "> 14"),
            ("name", "=> oops"),
            ("city", "rome"),
            ("notes", "   "),
        ]);
        assert_eq!(
            filters.keys().collect::<Vec<_>>(),
            ["age", "city"],
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].column, "name");
    }

    #[test]
    fn source_echo_round_trips() {
        let filter = compile_filter("  > 14 ").unwrap();
        assert_eq!(filter.source(), "> 14");
    }
}
