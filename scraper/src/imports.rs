pub use ::anyhow::{anyhow, bail, ensure, Context, Result};
pub use ::const_format::concatcp;
pub use ::log::{debug, error, info, warn};
pub use ::once_cell::sync::OnceCell;
pub use ::racephoto_shared::utils::{clean_text, normalize_event_date, parse_count};
pub use ::racephoto_shared::{
    Category, Event, EventDetail, EventId, KeywordFilter, Page, Pages, Photo, SearchResult, TieBreak, Vendor,
};
pub use ::regex::Regex;
pub use ::scraper::{ElementRef, Html, Selector};
pub use ::serde::{Deserialize, Serialize};
pub use ::serde_json::Value;
pub use ::std::collections::HashSet;
pub use ::std::time::Duration;
