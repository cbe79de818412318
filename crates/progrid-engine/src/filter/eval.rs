use crate::filter::types::{CompareOp, Operand, Predicate};

/// Evaluate a compiled predicate against an already-normalized value.
pub(super) fn matches(predicate: &Predicate, formatted: &str) -> bool {
    match predicate {
        Predicate::Equals { text } => formatted == text,
        Predicate::Compare { op, operand } => compare(formatted, *op, operand),
        Predicate::Contains { needle } => formatted.contains(needle.as_str()),
        Predicate::StartsWith { prefix } => formatted.starts_with(prefix.as_str()),
        Predicate::EndsWith { suffix } => formatted.ends_with(suffix.as_str()),
        Predicate::And(a, b) => matches(a, formatted) && matches(b, formatted),
        Predicate::Or(a, b) => matches(a, formatted) || matches(b, formatted),
    }
}

fn compare(formatted: &str, op: CompareOp, operand: &Operand) -> bool {
    match operand {
        // Numeric operands compare numerically; values that do not coerce
        // to a number fail the comparison.
        Operand::Number(rhs) => {
            let Ok(lhs) = formatted.parse::<f64>() else {
                return false;
            };
            match op {
                CompareOp::Lt => lhs < *rhs,
                CompareOp::Le => lhs <= *rhs,
                CompareOp::Gt => lhs > *rhs,
                CompareOp::Ge => lhs >= *rhs,
                CompareOp::Eq => lhs == *rhs,
                CompareOp::Ne => lhs != *rhs,
            }
        }
        Operand::Text(rhs) => {
            let rhs = rhs.as_str();
            match op {
                CompareOp::Lt => formatted < rhs,
                CompareOp::Le => formatted <= rhs,
                CompareOp::Gt => formatted > rhs,
                CompareOp::Ge => formatted >= rhs,
                CompareOp::Eq => formatted == rhs,
                CompareOp::Ne => formatted != rhs,
            }
        }
    }
}
