//! Cursor + scroll arithmetic over a list of `len` rows shown `height` rows
//! at a time.
//!
//! Invariants after every operation, for non-empty lists:
//!
//! ```text
//! scroll <= len - height            (or 0 when len < height)
//! cursor <  min(height, len - scroll)
//! cursor + scroll < len             (the selected absolute index)
//! ```
//!
//! An empty list always sits at `(0, 0)`. A height of zero is treated as one
//! row so a selection always exists when there is something to select.
//!
//! The viewport never redraws; callers request a frame after mutating it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub cursor: usize,
    pub scroll: usize,
}

fn effective(height: usize) -> usize {
    height.max(1)
}

impl Viewport {
    pub fn new(cursor: usize, scroll: usize) -> Self {
        Self { cursor, scroll }
    }

    /// Absolute index of the selected row, if any.
    pub fn selected(&self, len: usize) -> Option<usize> {
        let idx = self.cursor + self.scroll;
        (idx < len).then_some(idx)
    }

    /// Move by `delta` single steps. Each step moves the cursor inside the
    /// window and only scrolls when the cursor is pinned to an edge.
    pub fn move_cursor(&mut self, delta: isize, len: usize, height: usize) {
        self.clamp(len, height);
        if len == 0 {
            return;
        }
        let h = effective(height);
        for _ in 0..delta.unsigned_abs() {
            if delta > 0 {
                if self.cursor + 1 < h && self.scroll + self.cursor + 1 < len {
                    self.cursor += 1;
                } else if self.scroll + h < len {
                    self.scroll += 1;
                } else {
                    break;
                }
            } else if self.cursor > 0 {
                self.cursor -= 1;
            } else if self.scroll > 0 {
                self.scroll -= 1;
            } else {
                break;
            }
        }
    }

    /// A page is `page_size - 1` single steps so one row of context stays
    /// on screen.
    pub fn page_move(&mut self, direction: isize, page_size: usize, len: usize, height: usize) {
        let steps = page_size.saturating_sub(1) as isize;
        self.move_cursor(direction.signum() * steps, len, height);
    }

    /// Terminal resize: keep the same row selected and pull the window back
    /// when the tail no longer fills it.
    pub fn on_resize(&mut self, len: usize, new_height: usize) {
        if len == 0 {
            *self = Self::default();
            return;
        }
        let h = effective(new_height);
        let idx = (self.cursor + self.scroll).min(len - 1);
        if idx >= self.scroll + h {
            self.scroll = idx + 1 - h;
        }
        self.scroll = self.scroll.min(len.saturating_sub(h)).min(idx);
        self.cursor = idx - self.scroll;
    }

    /// The row sequence was swapped out. A genuine reload starts from the
    /// top; a background refresh keeps the position where it still fits.
    pub fn on_rows_replaced(&mut self, preserve: bool, len: usize, height: usize) {
        if !preserve {
            *self = Self::default();
            return;
        }
        self.clamp(len, height);
    }

    /// Row `index` was removed; `len` is the new length. The selection stays
    /// on the same item when it survives, otherwise on the row that took the
    /// deleted row's place.
    pub fn on_row_deleted(&mut self, index: usize, len: usize, height: usize) {
        if len == 0 {
            *self = Self::default();
            return;
        }
        let h = effective(height);
        let mut idx = self.cursor + self.scroll;
        if index < idx {
            idx -= 1;
        }
        let idx = idx.min(len - 1);
        if self.scroll + h > len {
            self.scroll = len.saturating_sub(h);
        }
        if idx < self.scroll {
            self.scroll = idx;
        }
        self.cursor = idx - self.scroll;
        if self.cursor >= h {
            self.scroll += self.cursor + 1 - h;
            self.cursor = h - 1;
        }
    }

    /// Re-establish the invariants without trying to keep the selection.
    pub fn clamp(&mut self, len: usize, height: usize) {
        if len == 0 {
            *self = Self::default();
            return;
        }
        let h = effective(height);
        self.scroll = self.scroll.min(len.saturating_sub(h));
        let visible = h.min(len - self.scroll);
        self.cursor = self.cursor.min(visible - 1);
    }

    pub fn holds_invariants(&self, len: usize, height: usize) -> bool {
        if len == 0 {
            return self.cursor == 0 && self.scroll == 0;
        }
        let h = effective(height);
        self.scroll <= len.saturating_sub(h)
            && self.cursor < h.min(len - self.scroll)
            && self.cursor + self.scroll < len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrolls_only_after_cursor_reaches_bottom() {
        let mut vp = Viewport::default();
        for _ in 0..25 {
            vp.move_cursor(1, 50, 20);
        }
        assert_eq!(vp, Viewport::new(19, 6));
        assert_eq!(vp.selected(50), Some(25));
    }

    #[test]
    fn test_up_at_top_scrolls_back() {
        let mut vp = Viewport::new(0, 3);
        vp.move_cursor(-1, 50, 20);
        assert_eq!(vp, Viewport::new(0, 2));
        vp.move_cursor(-10, 50, 20);
        assert_eq!(vp, Viewport::default());
    }

    #[test]
    fn test_stops_at_last_row_of_short_list() {
        let mut vp = Viewport::default();
        vp.move_cursor(10, 3, 20);
        assert_eq!(vp, Viewport::new(2, 0));
    }

    #[test]
    fn test_page_move_is_page_minus_one_steps() {
        let mut vp = Viewport::default();
        vp.page_move(1, 20, 100, 20);
        assert_eq!(vp, Viewport::new(19, 0));
        vp.page_move(1, 20, 100, 20);
        assert_eq!(vp, Viewport::new(19, 19));
        vp.page_move(-1, 20, 100, 20);
        assert_eq!(vp, Viewport::new(0, 19));
    }

    #[test]
    fn test_shrinking_window_keeps_selection_visible() {
        let mut vp = Viewport::new(15, 0);
        vp.on_resize(50, 10);
        assert_eq!(vp, Viewport::new(9, 6));
        assert_eq!(vp.selected(50), Some(15));
    }

    #[test]
    fn test_growing_window_pulls_scroll_back() {
        let mut vp = Viewport::new(9, 40);
        vp.on_resize(50, 20);
        assert_eq!(vp.selected(50), Some(49));
        assert_eq!(vp, Viewport::new(19, 30));
    }

    #[test]
    fn test_delete_last_row_with_scroll_refills_window() {
        // 21 rows, window of 20 scrolled by one, cursor on top row
        let mut vp = Viewport::new(0, 1);
        vp.on_row_deleted(20, 20, 20);
        assert_eq!(vp.scroll, 0);
        assert_eq!(vp.selected(20), Some(1));
        assert!(vp.holds_invariants(20, 20));
    }

    #[test]
    fn test_delete_selected_last_row_moves_up() {
        let mut vp = Viewport::new(19, 5);
        vp.on_row_deleted(24, 24, 20);
        assert_eq!(vp, Viewport::new(19, 4));
        assert_eq!(vp.selected(24), Some(23));
    }

    #[test]
    fn test_delete_only_row_resets() {
        let mut vp = Viewport::new(0, 0);
        vp.on_row_deleted(0, 0, 20);
        assert_eq!(vp, Viewport::default());
        assert_eq!(vp.selected(0), None);
    }

    #[test]
    fn test_rows_replaced() {
        let mut vp = Viewport::new(10, 30);
        vp.on_rows_replaced(true, 35, 20);
        assert_eq!(vp, Viewport::new(10, 15));
        vp.on_rows_replaced(false, 35, 20);
        assert_eq!(vp, Viewport::default());
    }

    #[test]
    fn test_zero_height_acts_as_single_row() {
        let mut vp = Viewport::default();
        vp.move_cursor(3, 10, 0);
        assert_eq!(vp, Viewport::new(0, 3));
        assert!(vp.holds_invariants(10, 0));
    }
}
