//! Property tests: the viewport invariants survive any sequence of
//! navigation, resize, reload and deletion operations.

use deck_proto::viewport::Viewport;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Move(isize),
    Page(isize, usize),
    Resize(usize),
    Replace(usize, bool),
    Delete(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-30isize..30).prop_map(Op::Move),
        (prop_oneof![Just(-1isize), Just(1isize)], 0usize..40).prop_map(|(d, p)| Op::Page(d, p)),
        (0usize..60).prop_map(Op::Resize),
        (0usize..120, any::<bool>()).prop_map(|(n, keep)| Op::Replace(n, keep)),
        (0usize..120).prop_map(Op::Delete),
    ]
}

proptest! {
    #[test]
    fn invariants_hold_after_every_operation(
        start_len in 0usize..120,
        start_height in 0usize..60,
        ops in proptest::collection::vec(op(), 0..64),
    ) {
        let mut len = start_len;
        let mut height = start_height;
        let mut vp = Viewport::default();

        for op in ops {
            match op {
                Op::Move(d) => vp.move_cursor(d, len, height),
                Op::Page(d, p) => vp.page_move(d, p, len, height),
                Op::Resize(h) => {
                    height = h;
                    vp.on_resize(len, height);
                }
                Op::Replace(n, keep) => {
                    len = n;
                    vp.on_rows_replaced(keep, len, height);
                }
                Op::Delete(i) => {
                    if len > 0 {
                        let index = i % len;
                        len -= 1;
                        vp.on_row_deleted(index, len, height);
                    }
                }
            }
            prop_assert!(
                vp.holds_invariants(len, height),
                "broken: {:?} len={} height={}", vp, len, height
            );
        }
    }

    #[test]
    fn single_steps_never_jump_scroll(
        len in 1usize..200,
        height in 1usize..50,
        steps in proptest::collection::vec(prop_oneof![Just(-1isize), Just(1isize)], 1..300),
    ) {
        let mut vp = Viewport::default();
        for step in steps {
            let before = vp;
            vp.move_cursor(step, len, height);
            let scroll_delta = vp.scroll.abs_diff(before.scroll);
            prop_assert!(scroll_delta <= 1);
            // the window only moves when the cursor is pinned to an edge
            if scroll_delta == 1 {
                prop_assert_eq!(vp.cursor, before.cursor);
            }
        }
    }

    #[test]
    fn resize_keeps_the_selected_row(
        len in 1usize..200,
        height in 1usize..50,
        moves in 0isize..200,
        new_height in 1usize..50,
    ) {
        let mut vp = Viewport::default();
        vp.move_cursor(moves, len, height);
        let selected = vp.selected(len);
        vp.on_resize(len, new_height);
        prop_assert_eq!(vp.selected(len), selected);
    }
}

#[test]
fn twenty_five_steps_over_fifty_rows() {
    let mut vp = Viewport::default();
    for _ in 0..25 {
        vp.move_cursor(1, 50, 20);
    }
    assert_eq!((vp.cursor, vp.scroll), (19, 6));
}
