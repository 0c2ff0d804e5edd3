use crate::imports::*;
use crate::utils::*;

#[derive(
    Copy, Clone, Debug, Deserialize, Display, EnumIter, EnumString, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Vendor {
    Allsports,
    Ctrun,
    Goodshot,
    Phomi,
    Raceshot,
    Soonnet,
    SoonnetOrg,
    Sportag,
    Zsport,
}

/// Vendor-specific event identifier; numeric on most sites, an opaque code on others.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventId {
    Numeric(u64),
    Code(String),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photographers: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photographer: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_left: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Photo {
    pub id: String,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photographer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bib_numbers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchResult {
    pub vendor: Vendor,
    pub bib_number: String,
    pub event_id: EventId,
    pub event_name: Option<String>,
    pub event_date: Option<String>,
    pub search_url: String,
    pub total_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_event_photos: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub possible_matches: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub more_url: Option<String>,
    pub price: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzzy: Option<bool>,
    pub photos: Vec<Photo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Category {
    pub name: String,
    pub photo_count: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventDetail {
    pub id: EventId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bib_coverage: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photographer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identified: Option<u64>,
}

impl Vendor {
    pub fn display_name(&self) -> &'static str {
        match *self {
            Vendor::Allsports => "AllSports",
            Vendor::Ctrun => "全統運動 CTRun",
            Vendor::Goodshot => "好拍 GoodShot",
            Vendor::Phomi => "Phomi 瘋迷",
            Vendor::Raceshot => "RaceShot 運動拍檔",
            Vendor::Soonnet => "捷安 Soonnet",
            Vendor::SoonnetOrg => "尋寶網 Soonnet.org",
            Vendor::Sportag => "運動標籤 Sportag",
            Vendor::Zsport => "ZSport",
        }
    }
}

impl EventId {
    pub fn code(code: impl Into<String>) -> EventId {
        EventId::Code(code.into())
    }

    /// Numeric value of the id, also for codes made only of digits.
    pub fn numeric(&self) -> Option<u64> {
        match self {
            EventId::Numeric(n) => Some(*n),
            EventId::Code(code) => code.parse().ok(),
        }
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventId::Numeric(n) => write!(f, "{}", n),
            EventId::Code(code) => f.write_str(code),
        }
    }
}

impl FromStr for EventId {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<EventId> {
        let s = s.trim();
        ensure!(!s.is_empty(), "Event ID must not be empty");
        // Leading zeros are significant in some vendor codes
        let canonical = s == "0" || !s.starts_with('0');
        match s.parse::<u64>() {
            Ok(n) if canonical => Ok(EventId::Numeric(n)),
            _ => Ok(EventId::code(s)),
        }
    }
}

impl From<u64> for EventId {
    fn from(n: u64) -> EventId {
        EventId::Numeric(n)
    }
}

impl Event {
    pub fn new(id: EventId, name: impl Into<String>) -> Event {
        Event {
            id,
            name: name.into(),
            date: String::new(),
            location: None,
            photo_count: None,
            photographers: None,
            photographer: None,
            categories: Vec::new(),
            days_left: None,
            url: None,
        }
    }

    pub fn parsed_date(&self) -> Option<Date> {
        parse_event_date(&self.date)
    }
}

impl SearchResult {
    pub fn new(vendor: Vendor, event_id: EventId, bib_number: &str, search_url: impl Into<String>) -> SearchResult {
        SearchResult {
            vendor,
            bib_number: bib_number.to_string(),
            event_id,
            event_name: None,
            event_date: None,
            search_url: search_url.into(),
            total_count: 0,
            fetched_count: None,
            total_event_photos: None,
            possible_matches: None,
            more_url: None,
            price: None,
            fuzzy: None,
            photos: Vec::new(),
            image_urls: Vec::new(),
            notes: Vec::new(),
        }
    }
}

impl EventDetail {
    pub fn new(id: EventId, name: impl Into<String>) -> EventDetail {
        EventDetail {
            id,
            name: name.into(),
            date: None,
            url: None,
            locations: Vec::new(),
            bib_coverage: None,
            categories: Vec::new(),
            photographer: None,
            photo_count: None,
            identified: None,
        }
    }
}
