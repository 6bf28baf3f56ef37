//! List query compiler.
//!
//! Turns the flat query string of a list request into a typed request for a
//! [`DataAccessor`](accessor::DataAccessor):
//!
//! 1. [`params`] normalises the raw `key=value` pairs (`filter[a][like]` and
//!    `filter.a.like` are the same key).
//! 2. [`descriptor`] checks every key against the endpoint's [`ListOptions`]
//!    and builds a [`FilterExpr`], page request and ordering choice.
//! 3. [`filter`] compiles the expression into a [`Predicate`], [`merge`]
//!    folds in mandatory constraints and [`order`] builds the sort tree.
//! 4. [`engine`] drives the accessor and assembles the [`Page`].

pub mod accessor;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod filter;
pub mod memory;
pub mod merge;
pub mod order;
pub mod params;

pub use accessor::{DataAccessor, FieldTree, FindOptions, FindResult};
pub use descriptor::{ListOptions, ListRequest, PageRequest, ParameterKind, QueryParameter};
pub use engine::{ListQuery, Page, PageLimits, PaginationEngine};
pub use error::QueryError;
pub use filter::{
    Condition, FilterExpr, FilterTerm, OperatorSet, Predicate, PredicateNode, compile_filter,
};
pub use memory::MemoryAccessor;
pub use merge::merge_predicates;
pub use order::{OrderNode, OrderTree, SortDirection, compile_order};
pub use params::QueryParams;
