use crate::imports::*;

pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

pub const ALLSPORTS_BASE_URL: &str = "https://allsports.tw";

pub const CTRUN_BASE_URL: &str = "https://www.ctrun.com.tw";
pub const CTRUN_ALBUM_URL: &str = concatcp!(CTRUN_BASE_URL, "/Album");

pub const GOODSHOT_BASE_URL: &str = "https://goodshot.com.tw";
pub const GOODSHOT_API_URL: &str = concatcp!(GOODSHOT_BASE_URL, "/api/front/v1");

pub const PHOMI_BASE_URL: &str = "http://www.phomi.com.tw";

pub const RACESHOT_API_URL: &str = "https://api.raceshot.app/api/v1/public";
pub const RACESHOT_WEB_URL: &str = "https://raceshot.app";
/// Single-photo price; the public API doesn't expose prices.
pub const RACESHOT_PHOTO_PRICE: u32 = 169;

pub const SOONNET_MALL_URL: &str = "https://www.soonnetmall.com";
pub const SOONNET_MALL_API_URL: &str = "https://apimall.soonnetmall.com/api/services/app";
/// Activity ID ranges known to hold events, end exclusive (no listing endpoint exists).
pub const SOONNET_SCAN_RANGES: &[(u64, u64)] = &[(1320, 1420), (2600, 2780)];

pub const SOONNET_ORG_URL: &str = "https://www.soonnet.org";
pub const SOONNET_ORG_API_URL: &str = "https://api.soonnet.org/api/services/app";
pub const SOONNET_ORG_RUNNING_CATEGORY: u64 = 10217;

pub const SPORTAG_BASE_URL: &str = "https://www.sportag.net/web";
pub const SPORTAG_MAX_LIST_PAGES: u32 = 3;

pub const ZSPORT_BASE_URL: &str = "https://www.zsport.com.tw";

pub const DEFAULT_MAX_PHOTOS: usize = 100;
