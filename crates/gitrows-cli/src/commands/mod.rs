//! Command implementations

mod index;
mod partitions;
mod query;
mod stats;

pub use index::{cmd_index, IndexArgs};
pub use partitions::cmd_partitions;
pub use query::{cmd_query, OutputFormat, QueryArgs};
pub use stats::cmd_stats;
