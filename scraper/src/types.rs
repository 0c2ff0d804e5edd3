use ::clap::Args;

use crate::constants::*;
use crate::imports::*;

#[derive(Args, Debug)]
pub struct Options {
    /// Vendor site to search (allsports, ctrun, goodshot, phomi, raceshot, soonnet, soonnet-org, sportag, zsport)
    #[clap(value_name = "VENDOR")]
    pub vendor: Vendor,

    /// Event name keyword used to find the event
    #[clap(short, long, value_name = "KEYWORD")]
    pub event: Option<String>,

    /// Bib number to search photos for
    #[clap(short, long, value_name = "BIB")]
    pub bib: Option<String>,

    /// Event ID (or code) on the vendor site, skips the keyword lookup
    #[clap(
        short = 'i',
        long,
        value_name = "ID",
        short_aliases = &['a', 'c'],
        aliases = &["competition-id", "act-code", "activity-id", "album-id"]
    )]
    pub event_id: Option<EventId>,

    /// List the vendor's events
    #[clap(short, long, aliases = &["scan", "list-albums"])]
    pub list_events: bool,

    /// Keyword filter for --list-events
    #[clap(short, long, value_name = "KEYWORD")]
    pub keyword: Option<String>,

    /// Show event details (needs --event-id)
    #[clap(short, long)]
    pub detail: bool,

    /// Print JSON instead of text
    #[clap(short, long)]
    pub json: bool,

    /// Fuzzy bib matching, where the vendor supports it
    #[clap(short, long)]
    pub fuzzy: bool,

    /// Maximum number of photos to fetch
    #[clap(short, long, value_name = "N", default_value_t = DEFAULT_MAX_PHOTOS)]
    pub max: usize,

    /// Maximum number of events to list (default depends on the vendor)
    #[clap(short = 'n', long, value_name = "N")]
    pub limit: Option<usize>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ListQuery {
    pub keyword: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchOptions {
    pub fuzzy: bool,
    pub max: usize,
}

impl ListQuery {
    pub fn keyword(keyword: &str) -> ListQuery {
        ListQuery { keyword: Some(keyword.to_string()), limit: None }
    }

    pub fn filter(&self) -> KeywordFilter {
        KeywordFilter::new(self.keyword.as_deref())
    }

    pub fn limit_or(&self, default: usize) -> usize {
        self.limit.unwrap_or(default)
    }
}

impl Default for SearchOptions {
    fn default() -> SearchOptions {
        SearchOptions { fuzzy: false, max: DEFAULT_MAX_PHOTOS }
    }
}

impl From<&Options> for ListQuery {
    fn from(options: &Options) -> ListQuery {
        ListQuery { keyword: options.keyword.clone(), limit: options.limit }
    }
}

impl From<&Options> for SearchOptions {
    fn from(options: &Options) -> SearchOptions {
        SearchOptions { fuzzy: options.fuzzy, max: options.max }
    }
}
