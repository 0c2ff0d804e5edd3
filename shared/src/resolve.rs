use thiserror::Error;

use crate::imports::*;
use crate::types::*;

/// Order used to pick one event out of several keyword matches.
#[derive(Copy, Clone, Debug, Display, EnumIter, EnumString, Eq, Hash, PartialEq, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum TieBreak {
    MostRecentDate,
    MostPhotos,
    HighestId,
}

#[derive(Debug, Error, PartialEq)]
pub enum LookupError {
    #[error("No event matches {0:?}")]
    NotFound(String),
}

impl TieBreak {
    /// Descending order under this tie-break; events lacking the sort key come last.
    pub fn compare(&self, a: &Event, b: &Event) -> Ordering {
        match self {
            TieBreak::MostRecentDate => Reverse(a.parsed_date()).cmp(&Reverse(b.parsed_date())),
            TieBreak::MostPhotos => Reverse(a.photo_count.unwrap_or(0)).cmp(&Reverse(b.photo_count.unwrap_or(0))),
            TieBreak::HighestId => Reverse(a.id.numeric()).cmp(&Reverse(b.id.numeric())),
        }
    }

    pub fn sort(&self, events: &mut [Event]) {
        events.sort_by(|a, b| self.compare(a, b));
    }
}

/// Picks the best of `candidates`; ties keep their listing order.
pub fn resolve(candidates: Vec<Event>, tie_break: TieBreak, keyword: &str) -> Result<Event, LookupError> {
    let mut candidates = candidates;
    tie_break.sort(&mut candidates);
    let best = candidates.into_iter().next().ok_or_else(|| LookupError::NotFound(keyword.to_string()))?;
    debug!("Resolved {:?} to event {} ({}) by {}", keyword, best.id, best.name, tie_break);
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: u64, name: &str, date: &str, photo_count: Option<u64>) -> Event {
        Event { date: date.to_string(), photo_count, ..Event::new(EventId::Numeric(id), name) }
    }

    #[test]
    fn test_highest_id() -> Result<()> {
        let candidates = vec![event(5, "A", "", None), event(12, "B", "", None), event(3, "C", "", None)];
        assert_eq!(resolve(candidates, TieBreak::HighestId, "x")?.id, EventId::Numeric(12));
        Ok(())
    }

    #[test]
    fn test_highest_id_ranks_codes_by_value() -> Result<()> {
        let candidates = vec![
            Event::new(EventId::code("R9"), "A"),
            Event::new(EventId::code("83058571"), "B"),
            Event::new(EventId::code("1200"), "C"),
        ];
        assert_eq!(resolve(candidates, TieBreak::HighestId, "x")?.id, EventId::code("83058571"));
        Ok(())
    }

    #[test]
    fn test_empty_candidates_not_found() {
        assert_eq!(
            resolve(Vec::new(), TieBreak::MostPhotos, "高雄馬"),
            Err(LookupError::NotFound("高雄馬".to_string()))
        );
    }

    #[test]
    fn test_most_recent_date() -> Result<()> {
        let candidates = vec![
            event(1, "2025馬拉松A", "2025-01-01", None),
            event(2, "2026馬拉松B", "2026-01-01", None),
            event(3, "馬拉松C", "", None),
        ];
        let candidates = crate::KeywordFilter::new(Some("馬拉松")).retain(candidates);
        assert_eq!(resolve(candidates, TieBreak::MostRecentDate, "馬拉松")?.id, EventId::Numeric(2));
        Ok(())
    }

    #[test]
    fn test_undated_events_rank_last() -> Result<()> {
        let candidates = vec![event(1, "A", "", None), event(2, "B", "2024年3月9日", None)];
        assert_eq!(resolve(candidates, TieBreak::MostRecentDate, "x")?.id, EventId::Numeric(2));
        Ok(())
    }

    #[test]
    fn test_most_photos_ties_keep_order() -> Result<()> {
        let candidates = vec![
            event(1, "A", "", Some(10)),
            event(2, "B", "", Some(30)),
            event(3, "C", "", Some(30)),
            event(4, "D", "", None),
        ];
        assert_eq!(resolve(candidates, TieBreak::MostPhotos, "x")?.id, EventId::Numeric(2));
        Ok(())
    }

    #[test]
    fn test_sort_is_repeatable() {
        let mut a = vec![event(1, "A", "", Some(5)), event(2, "B", "", Some(5)), event(3, "C", "", Some(9))];
        let mut b = a.clone();
        TieBreak::MostPhotos.sort(&mut a);
        TieBreak::MostPhotos.sort(&mut b);
        assert_eq!(a, b);
        assert_eq!(a.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(), vec!["C", "A", "B"]);
    }
}
