//! Lore reader state machine
//!
//! The reader shows content as spreads (left + right page). Turning
//! forward animates a leaf that flips over the right page: its front face
//! carries the current right page, its back face the next left page. The
//! flip takes `FLIP_DURATION_MS`; while it runs, further turns are
//! refused. Turning back is an instant jump. All timing lives in the
//! host; this module only tracks state.

use serde::{Deserialize, Serialize};

/// One page face: title, body, footer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub title: String,
    pub body: String,
    pub footer: String,
}

impl Page {
    pub fn new(title: &str, body: &str, footer: &str) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            footer: footer.into(),
        }
    }
}

/// A two-page spread
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spread {
    pub left: Page,
    pub right: Page,
}

/// The two faces of the flipping leaf during a forward turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlipFaces {
    /// What is being turned away: the current right page
    pub front: Page,
    /// What the turn reveals: the next left page
    pub back: Page,
}

/// Built-in lore content (placeholder copy from the landing page)
pub fn default_spreads() -> Vec<Spread> {
    vec![
        Spread {
            left: Page::new(
                "The Desk in the Attic",
                "A place to set the weight of memory.\n\nThe wood remembers every candle.\nThe room remembers every oath.",
                "— Stag Lore",
            ),
            right: Page::new(
                "The Sigil",
                "The stag is not decoration.\n\nIt is a claim.\nA boundary.\nA witness.",
                "Page One",
            ),
        },
        Spread {
            left: Page::new(
                "House Rule",
                "Nothing in this book is hurried.\n\nIf you feel it rushing, you are reading it wrong.",
                "—",
            ),
            right: Page::new(
                "Ember Oath",
                "We do not burn to destroy.\nWe burn to reveal.",
                "—",
            ),
        },
        Spread {
            left: Page::new(
                "Threshold Notes",
                "Guests arrive with stories.\nSome are theirs.\nSome are older than they are.",
                "—",
            ),
            right: Page::new(
                "A Quiet Charge",
                "Speak the room's name once.\nThen let the silence finish the spell.",
                "—",
            ),
        },
    ]
}

/// Reader state: which spread is showing, whether the modal is open,
/// whether a page turn is mid-flight.
#[derive(Debug, Clone)]
pub struct Reader {
    spreads: Vec<Spread>,
    index: usize,
    open: bool,
    flipping: bool,
}

impl Default for Reader {
    fn default() -> Self {
        Self::new(default_spreads())
    }
}

impl Reader {
    /// Content is overridable data; an empty table falls back to the
    /// built-in spreads so `current()` always has a spread to show.
    pub fn new(spreads: Vec<Spread>) -> Self {
        let spreads = if spreads.is_empty() {
            default_spreads()
        } else {
            spreads
        };
        Self {
            spreads,
            index: 0,
            open: false,
            flipping: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_flipping(&self) -> bool {
        self.flipping
    }

    pub fn spread_count(&self) -> usize {
        self.spreads.len()
    }

    /// The spread currently on display
    pub fn current(&self) -> &Spread {
        &self.spreads[self.index]
    }

    /// "Spread N of M" indicator text
    pub fn indicator(&self) -> String {
        format!("Spread {} of {}", self.index + 1, self.spreads.len())
    }

    /// Open the reader at the last-read spread. No-op when already open.
    pub fn open(&mut self) -> bool {
        if self.open {
            return false;
        }
        self.open = true;
        log::info!("reader opened at {}", self.indicator());
        true
    }

    /// Close the reader. Also abandons any flip in progress so the leaf
    /// never lingers into the next open. No-op when already closed.
    pub fn close(&mut self) -> bool {
        if !self.open {
            return false;
        }
        self.open = false;
        self.flipping = false;
        true
    }

    /// Start a forward page turn. Refused while closed, mid-flip, or on
    /// the last spread. Returns the leaf faces for the host to paint; the
    /// host calls [`Self::finish_flip`] when the animation ends.
    pub fn begin_flip(&mut self) -> Option<FlipFaces> {
        if !self.open || self.flipping || self.index + 1 >= self.spreads.len() {
            return None;
        }
        self.flipping = true;
        let current = &self.spreads[self.index];
        let next = &self.spreads[self.index + 1];
        Some(FlipFaces {
            front: current.right.clone(),
            back: next.left.clone(),
        })
    }

    /// Commit a finished page turn. No-op unless a flip is in flight
    /// (close() may have cancelled it mid-animation).
    pub fn finish_flip(&mut self) -> bool {
        if !self.flipping {
            return false;
        }
        self.flipping = false;
        self.index += 1;
        true
    }

    /// Instant jump to the previous spread. Blocked while flipping or on
    /// the first spread.
    pub fn page_back(&mut self) -> bool {
        if !self.open || self.flipping || self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_override_falls_back_to_builtin_spreads() {
        let mut reader = Reader::new(vec![]);
        assert_eq!(reader.spread_count(), 3);
        assert_eq!(reader.current().left.title, "The Desk in the Attic");
        reader.open();
        assert_eq!(reader.indicator(), "Spread 1 of 3");
    }

    #[test]
    fn test_open_close_idempotent() {
        let mut reader = Reader::default();
        assert!(reader.open());
        assert!(!reader.open());
        assert!(reader.is_open());
        assert!(reader.close());
        assert!(!reader.close());
        assert!(!reader.is_open());
    }

    #[test]
    fn test_flip_advances_after_finish() {
        let mut reader = Reader::default();
        reader.open();
        assert_eq!(reader.indicator(), "Spread 1 of 3");

        let faces = reader.begin_flip().expect("flip allowed");
        assert_eq!(faces.front.title, "The Sigil");
        assert_eq!(faces.back.title, "House Rule");

        // Index only moves once the animation commits
        assert_eq!(reader.indicator(), "Spread 1 of 3");
        assert!(reader.finish_flip());
        assert_eq!(reader.indicator(), "Spread 2 of 3");
    }

    #[test]
    fn test_flip_locked_while_flipping() {
        let mut reader = Reader::default();
        reader.open();
        assert!(reader.begin_flip().is_some());
        assert!(reader.begin_flip().is_none());
        assert!(!reader.page_back());
        reader.finish_flip();
        assert!(reader.begin_flip().is_some());
    }

    #[test]
    fn test_flip_refused_on_last_spread() {
        let mut reader = Reader::default();
        reader.open();
        for _ in 0..2 {
            reader.begin_flip().unwrap();
            reader.finish_flip();
        }
        assert_eq!(reader.indicator(), "Spread 3 of 3");
        assert!(reader.begin_flip().is_none());
    }

    #[test]
    fn test_page_back_bounds() {
        let mut reader = Reader::default();
        reader.open();
        assert!(!reader.page_back(), "already at the first spread");
        reader.begin_flip().unwrap();
        reader.finish_flip();
        assert!(reader.page_back());
        assert_eq!(reader.indicator(), "Spread 1 of 3");
    }

    #[test]
    fn test_close_cancels_flip() {
        let mut reader = Reader::default();
        reader.open();
        reader.begin_flip().unwrap();
        reader.close();
        assert!(!reader.is_flipping());
        // The stale animation-end callback arrives after close: ignored
        assert!(!reader.finish_flip());
        reader.open();
        assert_eq!(reader.indicator(), "Spread 1 of 3");
    }

    #[test]
    fn test_flip_refused_while_closed() {
        let mut reader = Reader::default();
        assert!(reader.begin_flip().is_none());
        assert!(!reader.page_back());
    }

    #[test]
    fn test_reader_remembers_spread_across_close() {
        let mut reader = Reader::default();
        reader.open();
        reader.begin_flip().unwrap();
        reader.finish_flip();
        reader.close();
        reader.open();
        assert_eq!(reader.indicator(), "Spread 2 of 3");
    }
}
