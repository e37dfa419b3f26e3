//! One-hot feature encoding.
//!
//! Turns [`RawRecord`](crate::data::RawRecord)s into numeric vectors with a
//! fixed column layout ([`FeatureSchema`]). Categorical fields expand into
//! one 0/1 indicator column per value; numeric fields pass through unchanged.

mod row;
mod schema;

pub use row::EncodedRow;
pub use schema::{
    indicator_for, indicator_name, ColumnKind, FeatureSchema, SchemaMismatch, INDICATOR_SEPARATOR,
};
