//! Fuzzy string similarity for address matching.

use std::collections::BTreeSet;

/// Lowercase and turn every non-alphanumeric character into a space.
pub fn full_process(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Indel similarity scaled to 0–100 and rounded. Empty input scores 0.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let total = (a.len() + b.len()) as f64;
    (200.0 * lcs_len(&a, &b) as f64 / total).round() as u8
}

/// Token-set similarity: compares the shared tokens against each side's
/// shared-plus-remaining tokens, so word order and duplicated words do not
/// matter and a subset of tokens scores 100.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let a = full_process(a);
    let b = full_process(b);
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    let join = |set: Vec<&str>| set.join(" ");
    let intersection = join(tokens_a.intersection(&tokens_b).copied().collect());
    let diff_ab = join(tokens_a.difference(&tokens_b).copied().collect());
    let diff_ba = join(tokens_b.difference(&tokens_a).copied().collect());

    let combined_ab = format!("{} {}", intersection, diff_ab).trim().to_string();
    let combined_ba = format!("{} {}", intersection, diff_ba).trim().to_string();

    ratio(&intersection, &combined_ab)
        .max(ratio(&intersection, &combined_ba))
        .max(ratio(&combined_ab, &combined_ba))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_basics() {
        assert_eq!(ratio("abc", "abc"), 100);
        assert_eq!(ratio("abc", "xyz"), 0);
        assert_eq!(ratio("", "abc"), 0);
        // LCS "abd" of 4 + 3 chars.
        assert_eq!(ratio("abcd", "abd"), 86);
    }

    #[test]
    fn token_set_ignores_order_and_subsets() {
        assert_eq!(token_set_ratio("1801 S Michigan Ave", "michigan ave 1801 s"), 100);
        assert_eq!(token_set_ratio("1801 S Michigan", "1801 S MICHIGAN CHICAGO IL 60616 AVE S"), 100);
        assert_eq!(token_set_ratio("!!!", "abc"), 0);
    }

    #[test]
    fn closer_addresses_score_higher() {
        let query = "1801 s michigan ave chicago";
        let right = token_set_ratio(query, "1801 S MICHIGAN AVE CHICAGO IL 60616");
        let wrong = token_set_ratio(query, "200 W MADISON ST CHICAGO IL 60606");
        assert!(right > wrong);
    }
}
