//! Convenient re-exports of commonly used types from firemongo.
//!
//! Import this prelude module to quickly access the most frequently used types
//! without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use firemongo::prelude::*;
//! ```

pub use firemongo_core::{
    error::{MongoServiceError, MongoServiceResult},
    expr::{CompareOp, Expr, ExprVisitor, LogicalOp, SortDirection, parse},
};

pub use crate::{
    collection::MongoCollection,
    database::MongoDatabase,
    filter::{FilterTranslator, compile, compile_expr},
    reference::{MongoDocument, MongoReference},
    service::MongoService,
    watch::{ChangeMeta, Subscription, normalize},
};
