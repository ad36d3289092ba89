//! "Did you mean" hints for unknown member names.

/// Largest edit distance still offered as a suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Edit distance (insertions, deletions, substitutions) between two names.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let target: Vec<char> = b.chars().collect();
    // previous[j]: distance between the prefix of `a` seen so far and target[..j]
    let mut previous: Vec<usize> = (0..=target.len()).collect();
    let mut current = vec![0; target.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in target.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[target.len()]
}

/// The known name closest to `unknown`, if any is within a few edits.
///
/// Ties go to the name listed first.
pub fn find_closest<'a>(unknown: &str, known: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for name in known {
        let distance = levenshtein_distance(unknown, name);
        if distance > MAX_SUGGESTION_DISTANCE {
            continue;
        }
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((name, distance));
        }
    }
    best.map(|(name, _)| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distances() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("count", ""), 5);
        assert_eq!(levenshtein_distance("", "label"), 5);
        assert_eq!(levenshtein_distance("count", "count"), 0);
        assert_eq!(levenshtein_distance("count", "mount"), 1);
        assert_eq!(levenshtein_distance("count", "coun"), 1);
        assert_eq!(levenshtein_distance("count", "counts"), 1);
        assert_eq!(levenshtein_distance("coutn", "count"), 2);
    }

    #[test]
    fn suggests_closest_member() {
        let members = ["count", "label", "disabled"];
        assert_eq!(find_closest("conut", members), Some("count".into()));
        assert_eq!(find_closest("lable", members), Some("label".into()));
        assert_eq!(find_closest("xyzzyx", members), None);
    }

    #[test]
    fn ties_prefer_first_listed() {
        assert_eq!(find_closest("cat", ["bat", "hat"]), Some("bat".into()));
    }
}
