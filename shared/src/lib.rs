mod imports;
mod macros;

pub mod keyword;
pub mod paging;
pub mod resolve;
pub mod types;
pub mod utils;

pub use crate::keyword::{keyword_variants, matches, matches_any, segments, KeywordFilter};
pub use crate::paging::{Page, Pages};
pub use crate::resolve::{resolve, LookupError, TieBreak};
pub use crate::types::*;
