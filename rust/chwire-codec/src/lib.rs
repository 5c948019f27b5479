//! Typed column codec for the ClickHouse native columnar wire format.
//!
//! The crate converts between the server's columnar wire encoding and immutable,
//! strongly-typed in-memory columns.
//!
//! # Main Components
//!
//! - [`types::ColumnType`]: a wire type descriptor, usually obtained from a server
//!   type name through [`types::TypeRegistry`]. Descriptors create readers and writers.
//! - [`reader::ColumnReader`]: an incremental decoder fed with byte chunks of arbitrary
//!   size. Once the declared row count has been decoded it yields an [`column::AnyColumn`].
//! - [`writer::ColumnWriter`]: the mirror encoder, filling output buffers of arbitrary
//!   capacity from a column of rows.
//! - [`column::Column`]: the typed, read-only column contract. Columns can be viewed
//!   as a different compatible value type through [`column::AnyColumn::try_reinterpret`]
//!   and handed to generic code through [`column::AnyColumn::try_dispatch`].

pub mod column;
pub mod decimal;
pub mod reader;
pub mod reinterpret;
pub mod types;
pub mod value;
pub mod writer;

pub use chwire_common::{Result, error::Error, error::ErrorKind};
pub use column::{AnyColumn, Column, ColumnDispatcher, ColumnRef};
pub use decimal::Decimal;
pub use reader::{ColumnReader, SequenceSize, SkippingColumnReader};
pub use types::{ColumnType, SerializationMode, TypeRegistry, TypeSettings};
pub use value::{ColumnValue, ScalarValue, Value, ValueKind};
pub use writer::ColumnWriter;
