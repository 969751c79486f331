use std::cmp::Ordering;

pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Order document ids by the number at the end of the id (`d2` < `d9` < `d15`), then
/// truncate to `max_results`.
///
/// Ids without a trailing digit run cannot be ordered numerically; they sort after all
/// numbered ids, in plain lexicographic order. Ties on the number (`d2`, `x2`) fall back
/// to lexicographic order too. Duplicates are dropped.
pub fn format_results<I, S>(results: I, max_results: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut ids: Vec<String> = results.into_iter().map(Into::into).collect();
    ids.sort_by(|a, b| compare_ids(a, b));
    ids.dedup();
    ids.truncate(max_results);
    ids
}

pub fn compare_ids(a: &str, b: &str) -> Ordering {
    match (numeric_suffix(a), numeric_suffix(b)) {
        (Some(x), Some(y)) => compare_digits(x, y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn numeric_suffix(id: &str) -> Option<&str> {
    let start = id.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if start == id.len() { None } else { Some(&id[start..]) }
}

// Compares digit strings by value without parsing, so arbitrarily long numbers work.
fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_not_lexicographic() {
        assert_eq!(format_results(["d2", "d15", "d9"], 100), vec!["d2", "d9", "d15"]);
    }

    #[test]
    fn truncates_after_sorting() {
        let ids: Vec<String> = (1..=150).rev().map(|i| format!("d{i}")).collect();
        let out = format_results(ids, 100);
        assert_eq!(out.len(), 100);
        assert_eq!(out.first().map(String::as_str), Some("d1"));
        assert_eq!(out.last().map(String::as_str), Some("d100"));
    }

    #[test]
    fn ids_without_numbers_fall_back_to_lexicographic() {
        assert_eq!(format_results(["beta", "d10", "alpha", "d3"], 10), vec!["d3", "d10", "alpha", "beta"]);
    }

    #[test]
    fn leading_zeros_and_long_numbers() {
        assert_eq!(
            format_results(["d007", "d8", "d123456789012345678901234567890", "d6"], 10),
            vec!["d6", "d007", "d8", "d123456789012345678901234567890"]
        );
    }

    #[test]
    fn zero_max_results_is_empty() {
        assert!(format_results(["d1"], 0).is_empty());
    }
}
