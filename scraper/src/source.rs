//! Uniform access to a vendor site: listing events and searching photos by bib.
//!
//! Each vendor module hides its own markup or API shape behind [`EventSource`].

use async_trait::async_trait;
use racephoto_shared::resolve;

use crate::fetcher::*;
use crate::imports::*;
use crate::types::*;
use crate::vendors::*;

#[async_trait(?Send)]
pub trait EventSource {
    fn vendor(&self) -> Vendor;

    /// How the best event is picked when a keyword matches several.
    fn tie_break(&self) -> TieBreak;

    async fn list_events(&self, fetcher: &Fetcher, query: &ListQuery) -> Result<Vec<Event>>;

    async fn search_by_bib(
        &self,
        fetcher: &Fetcher,
        event_id: &EventId,
        bib: &str,
        options: &SearchOptions,
    ) -> Result<SearchResult>;

    async fn event_detail(&self, _fetcher: &Fetcher, _event_id: &EventId) -> Result<EventDetail> {
        bail!("{} does not provide event details", self.vendor().display_name())
    }

    /// Events considered when resolving a keyword to a single event.
    async fn candidates(&self, fetcher: &Fetcher, keyword: &str) -> Result<Vec<Event>> {
        self.list_events(fetcher, &ListQuery::keyword(keyword)).await
    }
}

pub fn event_source(vendor: Vendor) -> Box<dyn EventSource> {
    match vendor {
        Vendor::Allsports => Box::new(AllSports),
        Vendor::Ctrun => Box::new(CtRun),
        Vendor::Goodshot => Box::new(GoodShot),
        Vendor::Phomi => Box::new(Phomi),
        Vendor::Raceshot => Box::new(RaceShot),
        Vendor::Soonnet => Box::new(Soonnet),
        Vendor::SoonnetOrg => Box::new(SoonnetOrg),
        Vendor::Sportag => Box::new(Sportag),
        Vendor::Zsport => Box::new(ZSport),
    }
}

/// Listing that degrades to no events when the vendor can't be reached or parsed.
pub async fn list_events_or_empty(source: &dyn EventSource, fetcher: &Fetcher, query: &ListQuery) -> Vec<Event> {
    match source.list_events(fetcher, query).await {
        Ok(events) => events,
        Err(err) => {
            error!("Failed to list {} events: {:?}", source.vendor().display_name(), err);
            Vec::new()
        }
    }
}

pub async fn find_event(source: &dyn EventSource, fetcher: &Fetcher, keyword: &str) -> Result<Event> {
    let candidates = match source.candidates(fetcher, keyword).await {
        Ok(candidates) => candidates,
        Err(err) => {
            error!("Failed to list {} events: {:?}", source.vendor().display_name(), err);
            Vec::new()
        }
    };
    info!("{} candidate event(s) match {:?}", candidates.len(), keyword);
    let vendor = source.vendor().display_name();
    let event = resolve(candidates, source.tie_break(), keyword)
        .with_context(|| format!("Failed to find {} event for keyword: {:?}", vendor, keyword))?;
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_every_vendor_has_a_source() {
        for vendor in Vendor::iter() {
            assert_eq!(event_source(vendor).vendor(), vendor);
        }
    }

    #[test]
    fn test_tie_breaks() {
        assert_eq!(event_source(Vendor::Allsports).tie_break(), TieBreak::MostRecentDate);
        assert_eq!(event_source(Vendor::Ctrun).tie_break(), TieBreak::HighestId);
        assert_eq!(event_source(Vendor::Goodshot).tie_break(), TieBreak::MostPhotos);
        assert_eq!(event_source(Vendor::Sportag).tie_break(), TieBreak::MostRecentDate);
        assert_eq!(event_source(Vendor::Zsport).tie_break(), TieBreak::HighestId);
    }
}
