//! Compilation of the expression DSL into MongoDB filter documents.
//!
//! This module translates the typed expression grammar from `firemongo-core` into
//! MongoDB's native BSON filter syntax. The surface entry point is [`compile`], which
//! parses a nested-array expression and translates it in one step:
//!
//! ```ignore
//! use bson::{bson, doc};
//! use firemongo::filter::compile;
//!
//! assert_eq!(
//!     compile(&bson!(["age", ">=", 18])),
//!     bson::Bson::Document(doc! { "age": { "$gte": 18 } }),
//! );
//! ```
//!
//! Compilation is pure and total: values that match no grammar rule are returned
//! unchanged, so malformed input compiles to itself and is left for the server to
//! reject. This layer performs no rewriting, validation, or planning of its own.

use bson::{Bson, doc};

use firemongo_core::expr::{CompareOp, Expr, ExprVisitor, LogicalOp, parse};

/// Translates parsed filter expressions into MongoDB filter documents.
pub struct FilterTranslator;

impl FilterTranslator {
    /// Returns the MongoDB operator tag for a comparison, or `None` for equality,
    /// which MongoDB spells as a bare value with no operator wrapper.
    fn comparison_tag(op: CompareOp) -> Option<&'static str> {
        match op {
            CompareOp::Eq => None,
            CompareOp::Ne => Some("$ne"),
            CompareOp::Lt => Some("$lt"),
            CompareOp::Gt => Some("$gt"),
            CompareOp::Lte => Some("$lte"),
            CompareOp::Gte => Some("$gte"),
            CompareOp::In => Some("$in"),
            CompareOp::NotIn => Some("$nin"),
        }
    }

    /// Returns the MongoDB keyword for a logical combinator.
    fn combinator_tag(op: LogicalOp) -> &'static str {
        match op {
            LogicalOp::And => "$and",
            LogicalOp::Or => "$or",
            LogicalOp::Nor => "$nor",
        }
    }
}

impl ExprVisitor for FilterTranslator {
    type Output = Bson;

    fn visit_literal(&mut self, value: &Bson) -> Bson {
        value.clone()
    }

    fn visit_not(&mut self, expr: &Expr) -> Bson {
        Bson::Document(doc! { "$not": self.visit_expr(expr) })
    }

    fn visit_compare(&mut self, field: &str, op: CompareOp, value: &Expr) -> Bson {
        let value = self.visit_expr(value);
        let operand = match Self::comparison_tag(op) {
            // Equality stays a bare value; this asymmetry is MongoDB's own
            // bare-value-means-equality convention.
            None => value,
            Some(tag) => Bson::Document(doc! { tag: value }),
        };
        Bson::Document(doc! { field: operand })
    }

    fn visit_logical(&mut self, op: LogicalOp, exprs: &[Expr]) -> Bson {
        let operands = exprs
            .iter()
            .map(|expr| self.visit_expr(expr))
            .collect::<Vec<_>>();
        Bson::Document(doc! { Self::combinator_tag(op): operands })
    }
}

/// Compiles an already-parsed expression into a MongoDB filter value.
pub fn compile_expr(expr: &Expr) -> Bson {
    FilterTranslator.visit_expr(expr)
}

/// Compiles a surface-syntax expression into a MongoDB filter value.
///
/// Values that match no grammar rule are returned unchanged.
pub fn compile(value: &Bson) -> Bson {
    compile_expr(&parse(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::bson;

    #[test]
    fn equality_compiles_to_a_bare_value() {
        assert_eq!(
            compile(&bson!(["age", "==", 18])),
            Bson::Document(doc! { "age": 18 }),
        );
    }

    #[test]
    fn each_operator_compiles_to_its_tagged_document() {
        for (token, tag) in [
            ("!=", "$ne"),
            ("<", "$lt"),
            (">", "$gt"),
            ("<=", "$lte"),
            (">=", "$gte"),
        ] {
            assert_eq!(
                compile(&bson!(["age", token, 18])),
                Bson::Document(doc! { "age": { tag: 18 } }),
            );
        }
    }

    #[test]
    fn membership_operators_keep_their_value_lists() {
        assert_eq!(
            compile(&bson!(["tag", "in", ["a", "b"]])),
            Bson::Document(doc! { "tag": { "$in": ["a", "b"] } }),
        );
        assert_eq!(
            compile(&bson!(["tag", "not-in", ["a", "b"]])),
            Bson::Document(doc! { "tag": { "$nin": ["a", "b"] } }),
        );
    }

    #[test]
    fn combinators_compile_their_operands_in_order() {
        assert_eq!(
            compile(&bson!(["and", ["age", ">", 18], ["name", "==", "Bob"]])),
            Bson::Document(doc! {
                "$and": [
                    { "age": { "$gt": 18 } },
                    { "name": "Bob" },
                ],
            }),
        );
        assert_eq!(
            compile(&bson!(["nor", ["a", "==", 1]])),
            Bson::Document(doc! { "$nor": [{ "a": 1 }] }),
        );
    }

    #[test]
    fn negation_wraps_and_double_negation_double_wraps() {
        assert_eq!(
            compile(&bson!(["not", ["age", ">", 18]])),
            Bson::Document(doc! { "$not": { "age": { "$gt": 18 } } }),
        );
        assert_eq!(
            compile(&bson!(["not", ["not", ["age", ">", 18]]])),
            Bson::Document(doc! { "$not": { "$not": { "age": { "$gt": 18 } } } }),
        );
    }

    #[test]
    fn unrecognized_shapes_are_fixed_points() {
        for value in [
            bson!("bare"),
            bson!(42),
            bson!([1, 2, 3]),
            bson!(["a", "==", 1, "trailing"]),
            bson!(["a", "~=", 1]),
        ] {
            assert_eq!(compile(&value), value);
        }
    }
}
