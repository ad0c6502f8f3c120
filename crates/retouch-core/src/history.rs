//! Linear undo/redo history of edit snapshots.
//!
//! The history is a bounded list with a cursor pointing at the state currently
//! shown. Adding a state discards everything after the cursor; once the
//! capacity is exceeded the oldest state falls off the front.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::adjustments::AdjustmentParams;
use crate::filter::FilterType;
use crate::pixels::PixelVersion;
use crate::transform::{SourceCropRect, ViewTransform};

/// Default number of snapshots kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Full editor state at one point in time.
///
/// Every field is a value, so a stored snapshot never aliases live state.
#[derive(Debug, Clone, PartialEq)]
pub struct EditState {
    pub adjustments: AdjustmentParams,
    /// Zoom, pan and rotation.
    pub view: ViewTransform,
    /// Crop applied so far, relative to the decoded original. `None` when uncropped.
    pub crop_rect: Option<SourceCropRect>,
    pub grayscale: bool,
    pub filter: FilterType,
    /// Which baked pixel buffer this state shows.
    pub pixel_version: PixelVersion,
    pub image_width: u32,
    pub image_height: u32,
    pub captured_at: DateTime<Utc>,
}

impl EditState {
    /// State of a freshly opened, unedited image.
    pub fn initial(image_width: u32, image_height: u32) -> Self {
        Self {
            adjustments: AdjustmentParams::default(),
            view: ViewTransform::default(),
            crop_rect: None,
            grayscale: false,
            filter: FilterType::None,
            pixel_version: PixelVersion::ROOT,
            image_width,
            image_height,
            captured_at: Utc::now(),
        }
    }

    /// Equal in everything but the capture time.
    pub fn same_edit(&self, other: &EditState) -> bool {
        let mut other = other.clone();
        other.captured_at = self.captured_at;
        *self == other
    }
}

/// Bounded linear undo/redo stack.
#[derive(Debug)]
pub struct EditHistory {
    states: VecDeque<EditState>,
    cursor: Option<usize>,
    capacity: usize,
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl EditHistory {
    /// `capacity` is raised to at least 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            states: VecDeque::new(),
            cursor: None,
            capacity: capacity.max(1),
        }
    }

    /// Record `state` after the cursor and move the cursor onto it.
    ///
    /// Every state after the cursor is discarded first. If the stack then
    /// exceeds its capacity, the oldest state is dropped.
    pub fn add_state(&mut self, state: EditState) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.states.truncate(keep);
        self.states.push_back(state);

        while self.states.len() > self.capacity {
            self.states.pop_front();
        }
        self.cursor = Some(self.states.len() - 1);
    }

    /// Step back one state. Returns `None` at the oldest state.
    pub fn undo(&mut self) -> Option<&EditState> {
        match self.cursor {
            Some(c) if c > 0 => {
                self.cursor = Some(c - 1);
                self.states.get(c - 1)
            }
            _ => None,
        }
    }

    /// Step forward one state. Returns `None` at the newest state.
    pub fn redo(&mut self) -> Option<&EditState> {
        match self.cursor {
            Some(c) if c + 1 < self.states.len() => {
                self.cursor = Some(c + 1);
                self.states.get(c + 1)
            }
            _ => None,
        }
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(c) if c + 1 < self.states.len())
    }

    pub fn current(&self) -> Option<&EditState> {
        self.cursor.and_then(|c| self.states.get(c))
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.cursor = None;
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Position of the current state, `None` when empty.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate over every stored state, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &EditState> {
        self.states.iter()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Add,
        Undo,
        Redo,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![3 => Just(Op::Add), 2 => Just(Op::Undo), 2 => Just(Op::Redo)]
    }

    proptest! {
        /// Property: size never exceeds capacity and the cursor stays in range.
        #[test]
        fn prop_bounded_and_cursor_valid(
            capacity in 1usize..10,
            ops in prop::collection::vec(op(), 0..80),
        ) {
            let mut history = EditHistory::new(capacity);
            for (i, op) in ops.iter().enumerate() {
                match op {
                    Op::Add => history.add_state(EditState::initial(i as u32 + 1, 1)),
                    Op::Undo => { history.undo(); }
                    Op::Redo => { history.redo(); }
                }
                prop_assert!(history.len() <= capacity);
                match history.cursor() {
                    None => prop_assert!(history.is_empty()),
                    Some(c) => prop_assert!(c < history.len()),
                }
            }
        }

        /// Property: undo then redo returns to the same state.
        #[test]
        fn prop_undo_redo_round_trip(count in 2usize..20, back in 1usize..20) {
            let mut history = EditHistory::default();
            for i in 0..count {
                history.add_state(EditState::initial(i as u32 + 1, 1));
            }
            let start = history.current().cloned();
            let steps = back.min(count - 1);
            for _ in 0..steps {
                prop_assert!(history.undo().is_some());
            }
            for _ in 0..steps {
                prop_assert!(history.redo().is_some());
            }
            prop_assert_eq!(history.current().cloned(), start);
        }

        /// Property: adding after any number of undos leaves nothing to redo.
        #[test]
        fn prop_add_truncates_redo(count in 1usize..15, back in 0usize..15) {
            let mut history = EditHistory::default();
            for i in 0..count {
                history.add_state(EditState::initial(i as u32 + 1, 1));
            }
            for _ in 0..back {
                history.undo();
            }
            history.add_state(EditState::initial(999, 1));
            prop_assert!(!history.can_redo());
            prop_assert_eq!(history.current().map(|s| s.image_width), Some(999));
        }
    }
}
