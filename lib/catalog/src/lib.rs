//! Schema-declared, immutable tables.
//!
//! [`Column`] and [`Schema`] describe the shape of a table, [`Table`] holds
//! its rows and guarantees they conform to that shape.

pub mod column;
pub mod schema;
pub mod table;

pub use column::*;
pub use schema::{Schema, SchemaError, SchemaRef};
pub use table::{Row, Table, TableError};
