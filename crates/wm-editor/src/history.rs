//! Undo/redo history for one raster layer.
//!
//! Each completed stroke commits a full snapshot of the tracked layer.
//! `cursor` names the entry that matches what is on screen; `None` means
//! the layer is at its pristine (empty) state. Committing past capacity
//! evicts the oldest entry and shifts the cursor down with it.

use std::collections::VecDeque;
use wm_core::LayerId;
use wm_render::{LayerError, LayerStack, SurfaceSnapshot};

/// A stored layer state.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    snapshot: SurfaceSnapshot,
    /// Logical commit counter, monotonic per log.
    stamp: u64,
}

impl HistoryEntry {
    pub fn stamp(&self) -> u64 {
        self.stamp
    }
}

/// Bounded snapshot log with a cursor.
#[derive(Debug)]
pub struct HistoryLog {
    layer: LayerId,
    entries: VecDeque<HistoryEntry>,
    cursor: Option<usize>,
    capacity: usize,
    clock: u64,
    /// What undoing past the first entry returns to; an empty layer if unset.
    baseline: Option<SurfaceSnapshot>,
}

impl HistoryLog {
    pub fn new(layer: LayerId, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            layer,
            entries: VecDeque::with_capacity(capacity),
            cursor: None,
            capacity,
            clock: 0,
            baseline: None,
        }
    }

    pub fn layer(&self) -> LayerId {
        self.layer
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Index of the entry shown on screen, `None` when pristine.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.entries.len() > self.next_index()
    }

    fn next_index(&self) -> usize {
        self.cursor.map_or(0, |c| c + 1)
    }

    /// Record the layer's current pixels. Drops any redo branch.
    pub fn commit(&mut self, stack: &LayerStack) -> Result<(), LayerError> {
        let snapshot = stack.snapshot(self.layer)?;
        self.entries.truncate(self.next_index());
        self.clock += 1;
        self.entries.push_back(HistoryEntry {
            snapshot,
            stamp: self.clock,
        });
        let mut cursor = self.entries.len() - 1;
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            cursor -= 1;
        }
        self.cursor = Some(cursor);
        log::debug!("history {}: commit #{} (cursor {cursor}, {} entries)", self.layer, self.clock, self.entries.len());
        Ok(())
    }

    /// Step back one entry, or to the empty layer from the first entry.
    /// Returns `false` when there is nothing to undo.
    pub fn undo(&mut self, stack: &mut LayerStack) -> Result<bool, LayerError> {
        let Some(cursor) = self.cursor else {
            return Ok(false);
        };
        match cursor.checked_sub(1) {
            Some(prev) => stack.restore(self.layer, &self.entries[prev].snapshot)?,
            None => match &self.baseline {
                Some(baseline) => stack.restore(self.layer, baseline)?,
                None => stack.clear_layer(self.layer)?,
            },
        }
        self.cursor = cursor.checked_sub(1);
        log::debug!("history {}: undo (cursor {:?})", self.layer, self.cursor);
        Ok(true)
    }

    /// Step forward one entry. Returns `false` at the newest entry.
    pub fn redo(&mut self, stack: &mut LayerStack) -> Result<bool, LayerError> {
        let next = self.next_index();
        let Some(entry) = self.entries.get(next) else {
            return Ok(false);
        };
        stack.restore(self.layer, &entry.snapshot)?;
        self.cursor = Some(next);
        log::debug!("history {}: redo (cursor {next})", self.layer);
        Ok(true)
    }

    /// Use `snapshot` instead of an empty layer as the pristine state,
    /// e.g. for a drawing restored from a saved session.
    pub fn set_baseline(&mut self, snapshot: SurfaceSnapshot) {
        self.baseline = Some(snapshot);
    }

    /// Forget every entry and any baseline. The layer itself is not touched.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.cursor = None;
        self.baseline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wm_core::Color;

    fn setup() -> (LayerStack, HistoryLog) {
        let mut stack = LayerStack::new(4, 1, Color::WHITE).unwrap();
        stack.create_layer(LayerId::drawing(), 20).unwrap();
        (stack, HistoryLog::new(LayerId::drawing(), 3))
    }

    /// Paint pixel `x` black and commit.
    fn stroke(stack: &mut LayerStack, log: &mut HistoryLog, x: u32) {
        stack
            .surface_mut(LayerId::drawing())
            .unwrap()
            .put_pixel(x, 0, Color::BLACK);
        log.commit(stack).unwrap();
    }

    fn painted(stack: &LayerStack) -> Vec<u32> {
        let surface = stack.layer(LayerId::drawing()).unwrap().surface();
        (0..4).filter(|&x| surface.pixel(x, 0) == Some(Color::BLACK)).collect()
    }

    #[test]
    fn cursor_tracks_commits() {
        let (mut stack, mut log) = setup();
        assert_eq!(log.cursor(), None);
        stroke(&mut stack, &mut log, 0);
        stroke(&mut stack, &mut log, 1);
        assert_eq!(log.cursor(), Some(1));
        assert_eq!(log.len(), 2);
        assert!(!log.can_redo());
    }

    #[test]
    fn undo_to_pristine_and_back() {
        let (mut stack, mut log) = setup();
        stroke(&mut stack, &mut log, 0);
        stroke(&mut stack, &mut log, 1);

        assert!(log.undo(&mut stack).unwrap());
        assert_eq!(painted(&stack), vec![0]);
        assert!(log.undo(&mut stack).unwrap());
        assert_eq!(painted(&stack), Vec::<u32>::new());
        assert!(!log.undo(&mut stack).unwrap());

        assert!(log.redo(&mut stack).unwrap());
        assert_eq!(painted(&stack), vec![0]);
        assert_eq!(log.cursor(), Some(0));
    }

    #[test]
    fn commit_after_undo_drops_redo_branch() {
        let (mut stack, mut log) = setup();
        stroke(&mut stack, &mut log, 0);
        stroke(&mut stack, &mut log, 1);
        log.undo(&mut stack).unwrap();
        stroke(&mut stack, &mut log, 3);

        assert_eq!(log.len(), 2);
        assert_eq!(log.cursor(), Some(1));
        assert!(!log.redo(&mut stack).unwrap());
        assert_eq!(painted(&stack), vec![0, 3]);
    }

    #[test]
    fn eviction_keeps_cursor_on_screen_state() {
        let (mut stack, mut log) = setup();
        for x in 0..4 {
            stroke(&mut stack, &mut log, x);
        }
        // capacity 3: the entry for {0} is gone
        assert_eq!(log.len(), 3);
        assert_eq!(log.cursor(), Some(2));
        let stamps: Vec<u64> = log.entries().map(HistoryEntry::stamp).collect();
        assert_eq!(stamps, vec![2, 3, 4]);

        log.undo(&mut stack).unwrap();
        assert_eq!(painted(&stack), vec![0, 1, 2]);
        log.undo(&mut stack).unwrap();
        assert_eq!(painted(&stack), vec![0, 1]);
        assert_eq!(log.cursor(), Some(0));
    }

    #[test]
    fn snapshots_are_copies() {
        let (mut stack, mut log) = setup();
        stroke(&mut stack, &mut log, 0);
        // mutate after commit without committing
        stack
            .surface_mut(LayerId::drawing())
            .unwrap()
            .put_pixel(2, 0, Color::BLACK);
        stroke(&mut stack, &mut log, 3);
        log.undo(&mut stack).unwrap();
        assert_eq!(painted(&stack), vec![0]);
    }

    #[test]
    fn undo_keeps_visibility() {
        let (mut stack, mut log) = setup();
        stroke(&mut stack, &mut log, 0);
        stack.set_visibility(LayerId::drawing(), false).unwrap();
        log.undo(&mut stack).unwrap();
        assert!(!stack.is_visible(LayerId::drawing()));
    }

    #[test]
    fn baseline_replaces_pristine_state() {
        let (mut stack, mut log) = setup();
        stack
            .surface_mut(LayerId::drawing())
            .unwrap()
            .put_pixel(2, 0, Color::BLACK);
        log.set_baseline(stack.snapshot(LayerId::drawing()).unwrap());
        stroke(&mut stack, &mut log, 0);
        log.undo(&mut stack).unwrap();
        assert_eq!(painted(&stack), vec![2]);
    }

    #[test]
    fn reset_forgets_everything() {
        let (mut stack, mut log) = setup();
        stroke(&mut stack, &mut log, 0);
        log.reset();
        assert!(log.is_empty());
        assert!(!log.can_undo());
        assert!(!log.undo(&mut stack).unwrap());
        assert_eq!(painted(&stack), vec![0]);
    }
}
