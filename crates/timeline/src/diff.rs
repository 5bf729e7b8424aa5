use similar::{capture_diff_slices, Algorithm, DiffOp};
use std::collections::BTreeSet;

/// 0-based indices of `new` lines that an LCS line alignment against `old`
/// does not carry over
pub fn changed_lines(old: &str, new: &str) -> BTreeSet<usize> {
    let old_lines: Vec<&str> = old.split('\n').collect();
    let new_lines: Vec<&str> = new.split('\n').collect();

    let mut changed = BTreeSet::new();
    for op in capture_diff_slices(Algorithm::Lcs, &old_lines, &new_lines) {
        match op {
            DiffOp::Insert {
                new_index, new_len, ..
            }
            | DiffOp::Replace {
                new_index, new_len, ..
            } => changed.extend(new_index..new_index + new_len),
            DiffOp::Equal { .. } | DiffOp::Delete { .. } => {}
        }
    }
    changed
}

/// Every line index of `text`; what a newly created entity reports
pub fn all_lines(text: &str) -> BTreeSet<usize> {
    (0..text.split('\n').count()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_signature_change_marks_one_line() {
        let old = "def add(a, b):\n    return a + b";
        let new = "def add(a, b, c):\n    return a + b";
        assert_eq!(changed_lines(old, new), BTreeSet::from([0]));
    }

    #[test]
    fn test_insertions_and_deletions() {
        let old = "a\nb\nc";
        assert_eq!(changed_lines(old, "a\nx\nb\nc"), BTreeSet::from([1]));
        assert_eq!(changed_lines(old, "a\nc"), BTreeSet::new());
        assert_eq!(changed_lines(old, old), BTreeSet::new());
        assert_eq!(changed_lines("", "a\nb"), BTreeSet::from([0, 1]));
    }

    #[test]
    fn test_all_lines() {
        assert_eq!(all_lines("one"), BTreeSet::from([0]));
        assert_eq!(all_lines("a\n\nc"), BTreeSet::from([0, 1, 2]));
    }

    fn lcs_len(a: &[&str], b: &[&str]) -> usize {
        let mut table = vec![vec![0usize; b.len() + 1]; a.len() + 1];
        for i in 1..=a.len() {
            for j in 1..=b.len() {
                table[i][j] = if a[i - 1] == b[j - 1] {
                    table[i - 1][j - 1] + 1
                } else {
                    table[i - 1][j].max(table[i][j - 1])
                };
            }
        }
        table[a.len()][b.len()]
    }

    fn is_subsequence(needle: &[&str], haystack: &[&str]) -> bool {
        let mut rest = haystack.iter();
        needle.iter().all(|line| rest.any(|candidate| candidate == line))
    }

    proptest! {
        #[test]
        fn unchanged_lines_form_a_longest_common_subsequence(
            old in prop::collection::vec("[abc]{0,2}", 1..10),
            new in prop::collection::vec("[abc]{0,2}", 1..10),
        ) {
            let old_text = old.join("\n");
            let new_text = new.join("\n");
            let old_lines: Vec<&str> = old_text.split('\n').collect();
            let new_lines: Vec<&str> = new_text.split('\n').collect();

            let changed = changed_lines(&old_text, &new_text);
            prop_assert!(changed.iter().all(|&idx| idx < new_lines.len()));

            let kept: Vec<&str> = new_lines
                .iter()
                .enumerate()
                .filter(|(idx, _)| !changed.contains(idx))
                .map(|(_, line)| *line)
                .collect();
            prop_assert!(is_subsequence(&kept, &old_lines));
            prop_assert_eq!(kept.len(), lcs_len(&old_lines, &new_lines));
        }
    }
}
