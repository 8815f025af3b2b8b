//! The logical-expression DSL and its typed grammar.
//!
//! Filters are written as nested BSON arrays, in the style of a small Lisp:
//!
//! ```ignore
//! use bson::bson;
//!
//! let adults = bson!(["age", ">=", 18]);
//! let named_bob = bson!(["and", ["age", ">", 18], ["name", "==", "Bob"]]);
//! let negated = bson!(["not", ["status", "==", "active"]]);
//! ```
//!
//! [`parse`] turns that surface syntax into the closed [`Expr`] sum type. Parsing is
//! total: any value that does not match a grammar rule becomes [`Expr::Literal`] and is
//! carried through compilation unchanged. This fallback is deliberate - it lets
//! comparison values and leaf scalars flow through the same entry point used for
//! sub-expressions, and it means malformed input compiles to itself instead of failing.
//!
//! Compilation to a concrete query representation is done by implementing
//! [`ExprVisitor`]; the MongoDB translator lives in the `firemongo` crate.

use bson::Bson;

/// Surface token for unary negation.
const NOT_TOKEN: &str = "not";

/// Binary comparison operators of the expression grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal to (`==`).
    Eq,
    /// Not equal to (`!=`).
    Ne,
    /// Less than (`<`).
    Lt,
    /// Greater than (`>`).
    Gt,
    /// Less than or equal to (`<=`).
    Lte,
    /// Greater than or equal to (`>=`).
    Gte,
    /// Contained in a list of values (`in`).
    In,
    /// Not contained in a list of values (`not-in`).
    NotIn,
}

impl CompareOp {
    /// Parses a surface-syntax token into a comparison operator.
    ///
    /// Returns `None` for anything outside the closed operator set, which makes the
    /// enclosing list fall through to the combinator and literal rules.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "==" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Ne),
            "<" => Some(CompareOp::Lt),
            ">" => Some(CompareOp::Gt),
            "<=" => Some(CompareOp::Lte),
            ">=" => Some(CompareOp::Gte),
            "in" => Some(CompareOp::In),
            "not-in" => Some(CompareOp::NotIn),
            _ => None,
        }
    }

    /// Returns the surface-syntax token for this operator.
    pub fn token(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Lte => "<=",
            CompareOp::Gte => ">=",
            CompareOp::In => "in",
            CompareOp::NotIn => "not-in",
        }
    }
}

/// N-ary logical combinators of the expression grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// All operands must match.
    And,
    /// Any operand may match.
    Or,
    /// No operand may match.
    Nor,
}

impl LogicalOp {
    /// Parses a surface-syntax token into a logical combinator.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "and" => Some(LogicalOp::And),
            "or" => Some(LogicalOp::Or),
            "nor" => Some(LogicalOp::Nor),
            _ => None,
        }
    }

    /// Returns the surface-syntax token for this combinator.
    pub fn token(&self) -> &'static str {
        match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
            LogicalOp::Nor => "nor",
        }
    }
}

/// A parsed filter expression.
///
/// The grammar is closed: every shape the surface syntax can produce is one of these
/// four cases, and anything unrecognized is a [`Expr::Literal`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A value carried through compilation unchanged (scalars, value lists, and any
    /// array that matches no grammar rule).
    Literal(Bson),
    /// Unary negation of a sub-expression.
    Not(Box<Expr>),
    /// Binary comparison of a field against a value.
    Compare {
        /// The field name to compare.
        field: String,
        /// The comparison operator.
        op: CompareOp,
        /// The value operand, parsed recursively.
        value: Box<Expr>,
    },
    /// N-ary logical combination of sub-expressions.
    Logical {
        /// The combinator kind.
        op: LogicalOp,
        /// The operand expressions, in surface order.
        exprs: Vec<Expr>,
    },
}

/// Parses a surface-syntax value into an [`Expr`].
///
/// Total over all inputs; never fails. Dispatch order is significant because some
/// shapes are subsets of others: the 2-element `not` form is checked before the generic
/// shapes, and the fixed 3-element comparison form before the n-ary combinators, so
/// `["and", e1, e2]` is recognized as a combinator and never as a comparison.
pub fn parse(value: &Bson) -> Expr {
    let Bson::Array(items) = value else {
        return Expr::Literal(value.clone());
    };

    if let [Bson::String(token), operand] = items.as_slice()
        && token == NOT_TOKEN
    {
        return Expr::Not(Box::new(parse(operand)));
    }

    if let [Bson::String(field), Bson::String(token), operand] = items.as_slice()
        && let Some(op) = CompareOp::from_token(token)
    {
        return Expr::Compare {
            field: field.clone(),
            op,
            value: Box::new(parse(operand)),
        };
    }

    if let Some((Bson::String(token), rest)) = items.split_first()
        && let Some(op) = LogicalOp::from_token(token)
    {
        return Expr::Logical {
            op,
            exprs: rest.iter().map(parse).collect(),
        };
    }

    Expr::Literal(value.clone())
}

/// Visitor over the expression grammar.
///
/// Compilation targets implement this to translate an [`Expr`] tree into their native
/// filter representation. The walk is infallible by construction - unrecognized input
/// never reaches a visitor, it is already folded into [`Expr::Literal`] by [`parse`].
pub trait ExprVisitor {
    type Output;

    fn visit_literal(&mut self, value: &Bson) -> Self::Output;
    fn visit_not(&mut self, expr: &Expr) -> Self::Output;
    fn visit_compare(&mut self, field: &str, op: CompareOp, value: &Expr) -> Self::Output;
    fn visit_logical(&mut self, op: LogicalOp, exprs: &[Expr]) -> Self::Output;

    fn visit_expr(&mut self, expr: &Expr) -> Self::Output {
        match expr {
            Expr::Literal(value) => self.visit_literal(value),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Compare { field, op, value } => self.visit_compare(field, *op, value),
            Expr::Logical { op, exprs } => self.visit_logical(*op, exprs),
        }
    }
}

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

impl SortDirection {
    /// Returns the sign MongoDB expects in a `$sort` stage.
    pub fn sign(&self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::bson;

    #[test]
    fn parses_comparisons_for_every_operator() {
        for (token, op) in [
            ("==", CompareOp::Eq),
            ("!=", CompareOp::Ne),
            ("<", CompareOp::Lt),
            (">", CompareOp::Gt),
            ("<=", CompareOp::Lte),
            (">=", CompareOp::Gte),
            ("in", CompareOp::In),
            ("not-in", CompareOp::NotIn),
        ] {
            let expr = parse(&bson!(["age", token, 18]));
            assert_eq!(
                expr,
                Expr::Compare {
                    field: "age".to_string(),
                    op,
                    value: Box::new(Expr::Literal(bson!(18))),
                }
            );
        }
    }

    #[test]
    fn parses_not_as_unary_negation() {
        let expr = parse(&bson!(["not", ["age", ">", 18]]));
        assert_eq!(
            expr,
            Expr::Not(Box::new(Expr::Compare {
                field: "age".to_string(),
                op: CompareOp::Gt,
                value: Box::new(Expr::Literal(bson!(18))),
            }))
        );
    }

    #[test]
    fn parses_combinators_over_their_operands() {
        let expr = parse(&bson!(["or", ["a", "==", 1], ["b", "==", 2]]));
        let Expr::Logical { op, exprs } = expr else {
            panic!("expected a logical expression");
        };
        assert_eq!(op, LogicalOp::Or);
        assert_eq!(exprs.len(), 2);
    }

    #[test]
    fn three_element_combinator_is_not_a_comparison() {
        // "and" is not a comparison token, so the list length alone must not make
        // ["and", e1, e2] parse as a comparison.
        let expr = parse(&bson!(["and", ["a", "==", 1], ["b", "==", 2]]));
        assert!(matches!(expr, Expr::Logical { op: LogicalOp::And, .. }));
    }

    #[test]
    fn comparison_values_are_parsed_recursively() {
        let expr = parse(&bson!(["flag", "==", ["not", ["a", "==", 1]]]));
        let Expr::Compare { value, .. } = expr else {
            panic!("expected a comparison");
        };
        assert!(matches!(*value, Expr::Not(_)));
    }

    #[test]
    fn unrecognized_shapes_become_literals() {
        let scalar = bson!("plain");
        assert_eq!(parse(&scalar), Expr::Literal(scalar.clone()));

        let values = bson!([1, 2, 3]);
        assert_eq!(parse(&values), Expr::Literal(values.clone()));

        let four_wide = bson!(["a", "==", 1, "trailing"]);
        assert_eq!(parse(&four_wide), Expr::Literal(four_wide.clone()));

        let unknown_op = bson!(["a", "~=", 1]);
        assert_eq!(parse(&unknown_op), Expr::Literal(unknown_op.clone()));
    }

    #[test]
    fn operator_tokens_round_trip() {
        for op in [
            CompareOp::Eq,
            CompareOp::Ne,
            CompareOp::Lt,
            CompareOp::Gt,
            CompareOp::Lte,
            CompareOp::Gte,
            CompareOp::In,
            CompareOp::NotIn,
        ] {
            assert_eq!(CompareOp::from_token(op.token()), Some(op));
        }
        for op in [LogicalOp::And, LogicalOp::Or, LogicalOp::Nor] {
            assert_eq!(LogicalOp::from_token(op.token()), Some(op));
        }
    }
}
