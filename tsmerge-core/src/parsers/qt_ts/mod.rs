//! Qt Linguist `.ts` reading and writing.

mod filter;
mod writer;

pub use filter::{TsFilter, TsParameters};
pub use writer::{render_unit, TsWriter};
