/// Strips spaces, hyphens and plus signs and lowercases, so `DX51D+Z` and
/// `dx 51d z` compare equal.
pub fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '+'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Like [`normalize`] but keeps hyphens; used for coating and treatment codes.
pub fn normalize_keep_hyphen(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ' ' | '+'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Length and value of the longest common substring of `a` and `b`, counted
/// in characters. Ties keep the first maximum found while scanning `a`.
pub fn longest_common_substring(a: &str, b: &str) -> (usize, String) {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    let mut max_length = 0;
    let mut end_in_a = 0;

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            current[j] = if a[i - 1] == b[j - 1] {
                previous[j - 1] + 1
            } else {
                0
            };
            if current[j] > max_length {
                max_length = current[j];
                end_in_a = i;
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }

    let substring = a[end_in_a - max_length..end_in_a].iter().collect();
    (max_length, substring)
}

/// True when the trimmed value is a plain number such as `1250`, `-3` or `1,5`.
pub fn is_numeric(value: &str) -> bool {
    let trimmed = value.trim();
    let unsigned = trimmed.strip_prefix(['-', '+']).unwrap_or(trimmed);
    unsigned.chars().any(|c| c.is_ascii_digit())
        && unsigned.replace(',', ".").parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("DX51D + Z"), "dx51dz");
        assert_eq!(normalize("S-350 GD"), "s350gd");
        assert_eq!(normalize_keep_hyphen("S-350 GD+Z"), "s-350gdz");
    }

    #[test]
    fn test_longest_common_substring() {
        assert_eq!(longest_common_substring("dx51dz100", "dx51d"), (5, "dx51d".to_string()));
        assert_eq!(longest_common_substring("abc", "xyz"), (0, String::new()));
        assert_eq!(longest_common_substring("", "abc"), (0, String::new()));
        // "ab" and "cd" tie; the first one found wins
        assert_eq!(longest_common_substring("abxcd", "abcd"), (2, "ab".to_string()));
    }

    #[test]
    fn test_longest_common_substring_unicode() {
        assert_eq!(longest_common_substring("ungehärtet", "härte"), (5, "härte".to_string()));
    }

    #[test]
    fn test_is_numeric() {
        assert!(is_numeric("1250"));
        assert!(is_numeric(" 1,5 "));
        assert!(!is_numeric("DX51D"));
        assert!(!is_numeric(""));
        assert!(!is_numeric("inf"));
    }
}
