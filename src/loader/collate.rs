// Locale-aware natural filename ordering.

/// Collation key for sorting filenames the way a file manager would:
/// case-insensitive per the current locale, with embedded numbers compared
/// by value so "page2" sorts before "page10".
pub fn filename_sort_key(name: &str) -> glib::FilenameCollationKey {
    glib::FilenameCollationKey::from(name)
}

/// Sorts filenames ascending by their collation key.
pub fn sort_filenames(names: &mut [String]) {
    names.sort_by_cached_key(|name| filename_sort_key(name));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        sort_filenames(&mut names);
        names
    }

    #[test]
    fn numbers_compare_by_value_not_bytes() {
        assert_eq!(
            sorted(&["page10", "page2", "page1"]),
            vec!["page1", "page2", "page10"]
        );
    }

    #[test]
    fn plain_names_sort_ascending() {
        assert_eq!(sorted(&["b.png", "c.png", "a.jpg"]), vec!["a.jpg", "b.png", "c.png"]);
    }

    #[test]
    fn numeric_suffixes_mix_with_plain_names() {
        assert_eq!(
            sorted(&["b.png", "a.jpg", "c10.png", "c2.png"]),
            vec!["a.jpg", "b.png", "c2.png", "c10.png"]
        );
    }

    #[test]
    fn already_sorted_input_is_stable() {
        assert_eq!(
            sorted(&["001.png", "002.png", "010.png"]),
            vec!["001.png", "002.png", "010.png"]
        );
    }
}
