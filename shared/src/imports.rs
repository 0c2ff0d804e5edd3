pub use ::anyhow::{ensure, Context, Result};
pub use ::itertools::Itertools;
pub use ::log::debug;
pub use ::once_cell::sync::OnceCell;
pub use ::regex::Regex;
pub use ::serde::{Deserialize, Serialize};
pub use ::std::cmp::{Ordering, Reverse};
pub use ::std::fmt::{self, Debug, Display};
pub use ::std::str::FromStr;
pub use ::strum_macros::{Display, EnumIter, EnumString};
pub use ::time::format_description::FormatItem as TimeFormat;
pub use ::time::macros::format_description;
pub use ::time::Date;
