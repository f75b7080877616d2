// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use proptest::prelude::*;
use proptest::sample::Index;

use crate::tests::utils::TestEnv;
use crate::SelectionMode;

/// Short ASCII documents mixing both line break styles.
fn document() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(vec!["a", "b", " ", "\n", "\r\n"]), 0..16)
        .prop_map(|pieces| pieces.concat())
}

fn tall_env(text: &str) -> TestEnv {
    TestEnv::builder(text).viewport(400.0, 1000.0).build()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn selection_endpoints_are_ordered(text in document(), a in any::<Index>(), b in any::<Index>()) {
        let (a, b) = (a.index(text.len() + 1), b.index(text.len() + 1));
        let mut env = tall_env(&text);
        env.select(a, b);
        let selection = env.view.selection();
        let (start, end) = (selection.start().position(), selection.end().position());
        prop_assert!(start <= end);
        if selection.is_empty() {
            prop_assert_eq!(start, end);
        } else {
            prop_assert_eq!(selection.is_reversed(), a > b);
            prop_assert_eq!(env.selected_ranges(), vec![start..end]);
        }
    }

    #[test]
    fn selecting_a_point_leaves_the_selection_empty(text in document(), p in any::<Index>()) {
        let p = p.index(text.len() + 1);
        let mut env = tall_env(&text);
        env.select(p, p);
        prop_assert!(env.view.selection().is_empty());
    }

    #[test]
    fn caret_steps_backward_retrace_the_steps_forward(text in document()) {
        let mut env = tall_env(&text);
        let mut forward = vec![env.caret_position()];
        loop {
            env.view.move_caret_to_next_caret_position().unwrap();
            let position = env.caret_position();
            if Some(&position) == forward.last() {
                break;
            }
            forward.push(position);
        }
        prop_assert_eq!(forward.last().copied(), Some(text.len()));

        let mut backward = vec![env.caret_position()];
        loop {
            env.view.move_caret_to_previous_caret_position().unwrap();
            let position = env.caret_position();
            if Some(&position) == backward.last() {
                break;
            }
            backward.push(position);
        }
        backward.reverse();
        prop_assert_eq!(backward, forward);
    }

    #[test]
    fn box_selection_ignores_which_corner_is_the_anchor(
        text in document(),
        a in any::<Index>(),
        b in any::<Index>(),
    ) {
        let (a, b) = (a.index(text.len() + 1), b.index(text.len() + 1));
        let mut env = tall_env(&text);
        env.view.set_selection_mode(SelectionMode::Box).unwrap();
        env.select(a, b);
        let forward = env.selected_ranges();
        env.select(b, a);
        prop_assert_eq!(env.selected_ranges(), forward);
    }
}
