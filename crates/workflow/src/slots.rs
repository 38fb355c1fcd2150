//! The slot availability board with last-request-wins race guarding.
//!
//! Availability responses can arrive out of order: a slow fetch for an old
//! (date, services) pair must never overwrite the list for the current one.
//! Every new fetch takes a [`RequestTag`] from the board; only the response
//! carrying the latest tag is applied, everything else is discarded.

use domain::{DraftError, SlotList, TimeSlot};

/// Identifies one availability request. Tags are monotonically increasing
/// within a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTag(u64);

/// What the board did with a delivered response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotApply {
    /// The response carried the latest tag and is now the visible list.
    Applied,
    /// A newer request had started; the response was discarded.
    Stale,
}

/// Holds the currently visible slot list and the chosen slot.
#[derive(Debug, Default)]
pub struct SlotBoard {
    next_tag: u64,
    current: Option<RequestTag>,
    slots: Option<SlotList>,
    selected: Option<TimeSlot>,
}

impl SlotBoard {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new availability request, superseding any in flight.
    pub fn begin(&mut self) -> RequestTag {
        self.next_tag += 1;
        let tag = RequestTag(self.next_tag);
        self.current = Some(tag);
        tag
    }

    /// Returns true if `tag` is still the latest request.
    pub fn is_current(&self, tag: RequestTag) -> bool {
        self.current == Some(tag)
    }

    /// Returns true if a request is in flight.
    pub fn is_loading(&self) -> bool {
        self.current.is_some()
    }

    /// Delivers a successful response.
    ///
    /// A previously chosen slot absent from the fresh list is cleared so the
    /// actor is re-prompted.
    pub fn apply(&mut self, tag: RequestTag, list: SlotList) -> SlotApply {
        if !self.is_current(tag) {
            self.discarded(tag);
            return SlotApply::Stale;
        }

        if let Some(selected) = self.selected {
            if !list.contains(selected) {
                tracing::debug!(slot = %selected, "chosen slot missing from fresh list, clearing");
                self.selected = None;
            }
        }

        self.slots = Some(list);
        self.current = None;
        SlotApply::Applied
    }

    /// Delivers a failed response. The stale list is dropped rather than
    /// shown as if it were current.
    pub fn fail(&mut self, tag: RequestTag) -> SlotApply {
        if !self.is_current(tag) {
            self.discarded(tag);
            return SlotApply::Stale;
        }

        self.slots = None;
        self.selected = None;
        self.current = None;
        SlotApply::Applied
    }

    /// Chooses a slot from the visible list.
    pub fn select(&mut self, slot: TimeSlot) -> Result<(), DraftError> {
        match &self.slots {
            Some(list) if list.contains(slot) => {
                self.selected = Some(slot);
                Ok(())
            }
            _ => Err(DraftError::SlotNotAvailable { slot }),
        }
    }

    /// Returns the chosen slot, when one is chosen and still valid.
    pub fn selected(&self) -> Option<TimeSlot> {
        self.selected
    }

    /// Returns the visible slot list.
    pub fn available(&self) -> Option<&SlotList> {
        self.slots.as_ref()
    }

    /// Drops the list, the chosen slot, and any in-flight request.
    ///
    /// Responses for requests begun before the clear are discarded when they
    /// eventually land.
    pub fn clear(&mut self) {
        self.slots = None;
        self.selected = None;
        self.current = None;
    }

    fn discarded(&self, tag: RequestTag) {
        metrics::counter!("slot_responses_discarded_total").increment(1);
        tracing::debug!(tag = tag.0, "discarding superseded availability response");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_for(date: &str, times: &[&str]) -> SlotList {
        let times: Vec<String> = times.iter().map(|s| s.to_string()).collect();
        SlotList::from_times(
            date.parse().unwrap(),
            &times,
            "2025-06-01T08:00:00".parse().unwrap(),
            0,
        )
        .unwrap()
    }

    fn slot(raw: &str) -> TimeSlot {
        TimeSlot::parse(raw).unwrap()
    }

    #[test]
    fn test_single_request_applies() {
        let mut board = SlotBoard::new();
        let tag = board.begin();
        assert!(board.is_loading());

        assert_eq!(board.apply(tag, list_for("2025-06-10", &["09:00"])), SlotApply::Applied);
        assert!(!board.is_loading());
        assert_eq!(board.available().unwrap().len(), 1);
    }

    #[test]
    fn test_out_of_order_responses_keep_latest_request() {
        // request #1 for 2025-06-10, then #2 for 2025-06-11; the slow
        // response for #1 arrives last and must not win
        let mut board = SlotBoard::new();
        let first = board.begin();
        let second = board.begin();

        assert_eq!(
            board.apply(second, list_for("2025-06-11", &["10:00"])),
            SlotApply::Applied
        );
        assert_eq!(
            board.apply(first, list_for("2025-06-10", &["09:00"])),
            SlotApply::Stale
        );

        assert_eq!(
            board.available().unwrap().date(),
            "2025-06-11".parse().unwrap()
        );
    }

    #[test]
    fn test_stale_failure_is_discarded_too() {
        let mut board = SlotBoard::new();
        let first = board.begin();
        let second = board.begin();

        assert_eq!(board.apply(second, list_for("2025-06-11", &["10:00"])), SlotApply::Applied);
        assert_eq!(board.fail(first), SlotApply::Stale);
        assert!(board.available().is_some());
    }

    #[test]
    fn test_current_failure_drops_the_list() {
        let mut board = SlotBoard::new();
        let tag = board.begin();
        board.apply(tag, list_for("2025-06-10", &["09:00"]));
        board.select(slot("09:00")).unwrap();

        let retry = board.begin();
        assert_eq!(board.fail(retry), SlotApply::Applied);
        assert!(board.available().is_none());
        assert!(board.selected().is_none());
    }

    #[test]
    fn test_select_requires_listed_slot() {
        let mut board = SlotBoard::new();
        let tag = board.begin();
        board.apply(tag, list_for("2025-06-10", &["09:00", "10:00"]));

        assert!(board.select(slot("09:00")).is_ok());
        assert_eq!(board.selected(), Some(slot("09:00")));
        assert!(matches!(
            board.select(slot("11:00")),
            Err(DraftError::SlotNotAvailable { .. })
        ));
    }

    #[test]
    fn test_selection_cleared_when_absent_from_fresh_list() {
        let mut board = SlotBoard::new();
        let tag = board.begin();
        board.apply(tag, list_for("2025-06-10", &["09:00", "10:00"]));
        board.select(slot("09:00")).unwrap();

        let refresh = board.begin();
        board.apply(refresh, list_for("2025-06-10", &["10:00"]));
        assert!(board.selected().is_none());
    }

    #[test]
    fn test_selection_survives_when_still_listed() {
        let mut board = SlotBoard::new();
        let tag = board.begin();
        board.apply(tag, list_for("2025-06-10", &["09:00", "10:00"]));
        board.select(slot("10:00")).unwrap();

        let refresh = board.begin();
        board.apply(refresh, list_for("2025-06-10", &["10:00", "11:00"]));
        assert_eq!(board.selected(), Some(slot("10:00")));
    }

    #[test]
    fn test_clear_invalidates_in_flight_request() {
        let mut board = SlotBoard::new();
        let tag = board.begin();
        board.clear();

        assert_eq!(
            board.apply(tag, list_for("2025-06-10", &["09:00"])),
            SlotApply::Stale
        );
        assert!(board.available().is_none());
    }

    #[test]
    fn test_select_without_list_fails() {
        let mut board = SlotBoard::new();
        assert!(board.select(slot("09:00")).is_err());
    }
}
