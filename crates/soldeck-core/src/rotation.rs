// ── Page rotation state machine ──
//
// Pure state transition logic: no I/O, no clock access. The caller
// passes `now` so every transition is reproducible in tests.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::{PAGE_SLOTS, SwitchMode};

// ── PageSet ─────────────────────────────────────────────────────────

/// Ordered set of enabled page numbers (1-based).
///
/// Never empty: when every flag is off, page 1 stands in so the display
/// always has something to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSet(Vec<u8>);

impl PageSet {
    pub fn from_flags(enabled: &[bool; PAGE_SLOTS]) -> Self {
        let pages: Vec<u8> = enabled
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .map(|(i, _)| u8::try_from(i + 1).unwrap_or(1))
            .collect();
        if pages.is_empty() {
            Self(vec![1])
        } else {
            Self(pages)
        }
    }

    pub fn first(&self) -> u8 {
        self.0.first().copied().unwrap_or(1)
    }

    pub fn contains(&self, page: u8) -> bool {
        self.0.contains(&page)
    }

    /// 0-based position of a page within the set.
    pub fn position(&self, page: u8) -> Option<usize> {
        self.0.iter().position(|p| *p == page)
    }

    /// The page after `page`, wrapping around.
    pub fn next_after(&self, page: u8) -> u8 {
        match self.position(page) {
            Some(idx) => self.0[(idx + 1) % self.0.len()],
            None => self.first(),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        // Never empty by construction.
        false
    }
}

// ── Rotation state ──────────────────────────────────────────────────

/// When the page last rotated.
///
/// `Never` marks a freshly created coordinator: the first tick only
/// establishes the rotation baseline, it must not advance the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LastSwitch {
    #[default]
    Never,
    At(DateTime<Utc>),
}

/// Where the rotation landed this tick, for the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PagePosition {
    /// The page number shown (1-5).
    pub page: u8,
    /// 1-based position of `page` within the enabled set.
    pub index: u8,
    /// Size of the enabled set.
    pub count: u8,
}

/// The persistent rotation state, owned by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationState {
    current_page: u8,
    last_switch: LastSwitch,
}

impl Default for RotationState {
    fn default() -> Self {
        Self {
            current_page: 1,
            last_switch: LastSwitch::Never,
        }
    }
}

impl RotationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_page(&self) -> u8 {
        self.current_page
    }

    pub fn last_switch(&self) -> LastSwitch {
        self.last_switch
    }

    /// Run one tick of the rotation state machine.
    ///
    /// Order matters: membership repair first (a page may have been
    /// disabled while selected), then the mode-specific transition.
    pub fn advance(
        &mut self,
        pages: &PageSet,
        mode: SwitchMode,
        rotation_interval: Duration,
        now: DateTime<Utc>,
    ) -> PagePosition {
        if !pages.contains(self.current_page) {
            self.current_page = pages.first();
        }

        match mode {
            SwitchMode::Touch => {
                // Navigation belongs entirely to the display's touch input;
                // we pin the first page and keep the timer reset.
                self.current_page = pages.first();
                self.last_switch = LastSwitch::At(now);
            }
            SwitchMode::Auto | SwitchMode::Both => match self.last_switch {
                LastSwitch::Never => {
                    // First tick after creation: baseline only, no advance.
                    self.last_switch = LastSwitch::At(now);
                }
                LastSwitch::At(then) => {
                    // A negative elapsed (clock moved backwards) fails the
                    // `to_std` conversion and reads as "not due yet".
                    let due = now
                        .signed_duration_since(then)
                        .to_std()
                        .is_ok_and(|elapsed| elapsed >= rotation_interval);
                    if due {
                        self.current_page = pages.next_after(self.current_page);
                        self.last_switch = LastSwitch::At(now);
                    }
                }
            },
        }

        let index = pages.position(self.current_page).unwrap_or(0);
        PagePosition {
            page: self.current_page,
            index: u8::try_from(index + 1).unwrap_or(1),
            count: u8::try_from(pages.len()).unwrap_or(1),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const INTERVAL: Duration = Duration::from_secs(10);

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn pages(enabled: [bool; PAGE_SLOTS]) -> PageSet {
        PageSet::from_flags(&enabled)
    }

    fn established(page: u8, switched_at: DateTime<Utc>) -> RotationState {
        RotationState {
            current_page: page,
            last_switch: LastSwitch::At(switched_at),
        }
    }

    #[test]
    fn all_flags_off_falls_back_to_page_one() {
        let set = pages([false; 5]);
        assert_eq!(set.first(), 1);
        assert_eq!(set.len(), 1);

        let mut state = established(4, t(0));
        let pos = state.advance(&set, SwitchMode::Auto, INTERVAL, t(5));
        assert_eq!(pos.page, 1);
    }

    #[test]
    fn membership_repair_runs_before_mode_logic() {
        // Scenario 2: pages {2} enabled, current_page = 1.
        let set = pages([false, true, false, false, false]);
        let mut state = established(1, t(0));

        let pos = state.advance(&set, SwitchMode::Auto, INTERVAL, t(1));
        assert_eq!(pos.page, 2);
        assert_eq!(pos.index, 1);
        assert_eq!(pos.count, 1);
    }

    #[test]
    fn auto_advances_when_interval_elapsed() {
        // Scenario 1: pages {1,3}, last switch 15s ago.
        let set = pages([true, false, true, false, false]);
        let mut state = established(1, t(0));

        let pos = state.advance(&set, SwitchMode::Auto, INTERVAL, t(15));
        assert_eq!(pos.page, 3);
        assert_eq!(pos.index, 2);
        assert_eq!(pos.count, 2);
        assert_eq!(state.last_switch(), LastSwitch::At(t(15)));
    }

    #[test]
    fn auto_holds_within_interval() {
        let set = pages([true, true, false, false, false]);
        let mut state = established(1, t(0));

        let pos = state.advance(&set, SwitchMode::Auto, INTERVAL, t(9));
        assert_eq!(pos.page, 1);
        assert_eq!(state.last_switch(), LastSwitch::At(t(0)));
    }

    #[test]
    fn rotation_wraps_to_first_page() {
        let set = pages([true, true, true, false, false]);
        let mut state = established(3, t(0));

        let pos = state.advance(&set, SwitchMode::Both, INTERVAL, t(10));
        assert_eq!(pos.page, 1);
    }

    #[test]
    fn touch_pins_first_enabled_page_and_resets_timer() {
        // Scenario 3: mode TOUCH, pages {1,2,4}, current_page = 2.
        let set = pages([true, true, false, true, false]);
        let mut state = established(2, t(0));

        let pos = state.advance(&set, SwitchMode::Touch, INTERVAL, t(3));
        assert_eq!(pos.page, 1);
        assert_eq!(pos.count, 3);
        assert_eq!(state.last_switch(), LastSwitch::At(t(3)));

        // Further ticks never move the page.
        let pos = state.advance(&set, SwitchMode::Touch, INTERVAL, t(60));
        assert_eq!(pos.page, 1);
        assert_eq!(state.last_switch(), LastSwitch::At(t(60)));
    }

    #[test]
    fn first_tick_establishes_baseline_without_advancing() {
        // Scenario 4: fresh state, mode AUTO, pages {1,2}.
        let set = pages([true, true, false, false, false]);
        let mut state = RotationState::new();
        assert_eq!(state.last_switch(), LastSwitch::Never);

        let pos = state.advance(&set, SwitchMode::Auto, INTERVAL, t(0));
        assert_eq!(pos.page, 1);
        assert_eq!(state.last_switch(), LastSwitch::At(t(0)));

        // Second tick, a full interval later: now it rotates.
        let pos = state.advance(&set, SwitchMode::Auto, INTERVAL, t(10));
        assert_eq!(pos.page, 2);
    }

    #[test]
    fn exactly_one_rotation_per_interval_window() {
        let set = pages([true, true, true, false, false]);
        let mut state = RotationState::new();
        state.advance(&set, SwitchMode::Auto, INTERVAL, t(0));

        let mut switches = 0;
        let mut previous = state.current_page();
        // 5s sample cadence over two rotation windows.
        for secs in [5, 10, 15, 20] {
            state.advance(&set, SwitchMode::Auto, INTERVAL, t(secs));
            if state.current_page() != previous {
                switches += 1;
                previous = state.current_page();
            }
        }
        assert_eq!(switches, 2);
    }

    #[test]
    fn clock_moving_backwards_does_not_rotate() {
        let set = pages([true, true, false, false, false]);
        let mut state = established(1, t(100));

        let pos = state.advance(&set, SwitchMode::Auto, INTERVAL, t(50));
        assert_eq!(pos.page, 1);
        assert_eq!(state.last_switch(), LastSwitch::At(t(100)));
    }

    #[test]
    fn current_page_always_member_of_enabled_set() {
        let set = pages([false, true, false, true, true]);
        let mut state = established(3, t(0));

        for (i, mode) in [SwitchMode::Auto, SwitchMode::Touch, SwitchMode::Both]
            .into_iter()
            .enumerate()
        {
            state.advance(&set, mode, INTERVAL, t(20 * (i64::try_from(i).unwrap() + 1)));
            assert!(set.contains(state.current_page()));
        }
    }
}
