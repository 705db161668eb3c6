//! Data source driver variants.
//!
//! | Driver                 | push sort | push limit | count |
//! |------------------------|-----------|------------|-------|
//! | [`ArraySource`]        | no        | no         | yes   |
//! | [`SqlSource`]          | yes       | yes        | yes   |
//! | [`XmlSource`]          | no        | no         | yes   |
//! | [`TableMapperSource`]  | yes       | yes        | yes   |

mod array;
mod mapper;
mod sql;
mod xml;

pub use array::ArraySource;
pub use mapper::{MappedQuery, MapperOptions, MemoryTable, TableMapper, TableMapperSource};
pub use sql::{SqlOptions, SqlSource};
pub use xml::{XmlOptions, XmlSource};
