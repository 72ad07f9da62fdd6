//! Derive a tab title from buffer content.
//!
//! The title is the trimmed text of the first row (or, when scanning is
//! enabled, the first non-blank row), cut to the configured length with a
//! trailing ellipsis. Buffers with nothing to show get the default label.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::TitleConfig;
use crate::host::{BufferLines, ScanControl};

/// Appended to titles cut at the maximum length.
pub const ELLIPSIS: char = '…';

// Blank means Unicode White_Space plus the byte-order mark, minus NEL.
static NON_BLANK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x{85}[^\s\x{FEFF}]]").expect("non-blank pattern is valid")
});

/// Whether `c` counts as blank when trimming or scanning rows.
pub fn is_blank(c: char) -> bool {
    (c.is_whitespace() && c != '\u{85}') || c == '\u{FEFF}'
}

/// The row whose text becomes the title, or `None` when the buffer has no
/// non-blank row to offer.
pub fn title_row<L: BufferLines + ?Sized>(lines: &L, config: &TitleConfig) -> Option<usize> {
    let first_has_text = lines
        .line_for_row(0)
        .is_some_and(|line| NON_BLANK.is_match(&line));
    if !config.scan_for_first_row || first_has_text {
        return Some(0);
    }
    let mut found = None;
    lines.scan(&NON_BLANK, &mut |hit| {
        found = Some(hit.row);
        ScanControl::Stop
    });
    found
}

/// Compute the display title for a buffer. Never fails.
pub fn compute_title<L: BufferLines + ?Sized>(lines: &L, config: &TitleConfig) -> String {
    let Some(row) = title_row(lines, config) else {
        return config.default_label.clone();
    };
    let Some(line) = lines.line_for_row(row) else {
        return config.default_label.clone();
    };
    let title = line.trim_matches(is_blank);
    if title.is_empty() {
        return config.default_label.clone();
    }
    truncate_title(title, config.max_length)
}

/// Cut `title` to `max_length` characters, the last being [`ELLIPSIS`].
///
/// `None` means unlimited. A limit of 0 or 1 leaves only the ellipsis.
pub fn truncate_title(title: &str, max_length: Option<usize>) -> String {
    let Some(max) = max_length else {
        return title.to_string();
    };
    if title.chars().count() <= max {
        return title.to_string();
    }
    let mut truncated: String = title.chars().take(max.saturating_sub(1)).collect();
    truncated.push(ELLIPSIS);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ScanMatch;

    /// Plain line list standing in for a host buffer.
    struct Lines(Vec<String>);

    impl Lines {
        fn from_text(text: &str) -> Self {
            Self(text.split('\n').map(ToOwned::to_owned).collect())
        }

        fn empty() -> Self {
            Self(Vec::new())
        }
    }

    impl BufferLines for Lines {
        fn line_for_row(&self, row: usize) -> Option<String> {
            self.0.get(row).cloned()
        }

        fn scan(&self, pattern: &Regex, on_match: &mut dyn FnMut(ScanMatch) -> ScanControl) {
            for (row, line) in self.0.iter().enumerate() {
                for m in pattern.find_iter(line) {
                    let hit = ScanMatch {
                        row,
                        start: m.start(),
                        end: m.end(),
                    };
                    if on_match(hit) == ScanControl::Stop {
                        return;
                    }
                }
            }
        }
    }

    fn config() -> TitleConfig {
        TitleConfig::default()
    }

    fn scanning() -> TitleConfig {
        TitleConfig {
            scan_for_first_row: true,
            ..TitleConfig::default()
        }
    }

    #[test]
    fn test_first_line_becomes_title() {
        let lines = Lines::from_text("lorem ipsum dolor");
        assert_eq!(compute_title(&lines, &config()), "lorem ipsum dolor");
    }

    #[test]
    fn test_empty_buffer_uses_default_label() {
        assert_eq!(compute_title(&Lines::from_text(""), &config()), "untitled");
        assert_eq!(compute_title(&Lines::empty(), &config()), "untitled");
        assert_eq!(compute_title(&Lines::empty(), &scanning()), "untitled");
    }

    #[test]
    fn test_title_is_trimmed() {
        let lines = Lines::from_text("   spaced out \t\nsecond");
        assert_eq!(compute_title(&lines, &config()), "spaced out");
    }

    #[test]
    fn test_blank_first_row_without_scan_uses_default() {
        let lines = Lines::from_text("   \nhello");
        assert_eq!(title_row(&lines, &config()), Some(0));
        assert_eq!(compute_title(&lines, &config()), "untitled");
    }

    #[test]
    fn test_scan_finds_first_non_blank_row() {
        let lines = Lines::from_text("\n  \nhello\nworld");
        assert_eq!(title_row(&lines, &scanning()), Some(2));
        assert_eq!(compute_title(&lines, &scanning()), "hello");
    }

    #[test]
    fn test_scan_with_only_whitespace_is_not_found() {
        let lines = Lines::from_text("\n \t\n\n");
        assert_eq!(title_row(&lines, &scanning()), None);
        assert_eq!(compute_title(&lines, &scanning()), "untitled");
    }

    #[test]
    fn test_scan_keeps_row_zero_when_it_has_text() {
        let lines = Lines::from_text("first\n\nsecond");
        assert_eq!(title_row(&lines, &scanning()), Some(0));
    }

    #[test]
    fn test_byte_order_mark_is_blank() {
        let lines = Lines::from_text("\u{FEFF}\nhello");
        assert_eq!(title_row(&lines, &scanning()), Some(1));
        assert_eq!(compute_title(&lines, &scanning()), "hello");
        assert_eq!(compute_title(&lines, &config()), "untitled");

        let lines = Lines::from_text("\u{FEFF}abcdef");
        let config = TitleConfig {
            max_length: Some(6),
            ..TitleConfig::default()
        };
        assert_eq!(compute_title(&lines, &config), "abcdef");
    }

    #[test]
    fn test_next_line_character_is_content() {
        let lines = Lines::from_text("\u{85}\nhello");
        assert_eq!(title_row(&lines, &scanning()), Some(0));
        assert_eq!(compute_title(&lines, &scanning()), "\u{85}");
        assert!(!is_blank('\u{85}'));
        assert!(is_blank('\u{A0}'));
        assert!(is_blank('\u{3000}'));
    }

    #[test]
    fn test_truncates_with_ellipsis() {
        let lines = Lines::from_text("abcdefghij");
        let config = TitleConfig {
            max_length: Some(5),
            ..TitleConfig::default()
        };
        assert_eq!(compute_title(&lines, &config), "abcd…");
    }

    #[test]
    fn test_exact_length_is_not_truncated() {
        assert_eq!(truncate_title("abcde", Some(5)), "abcde");
    }

    #[test]
    fn test_tiny_limits_leave_only_ellipsis() {
        assert_eq!(truncate_title("abc", Some(1)), "…");
        assert_eq!(truncate_title("abc", Some(0)), "…");
        assert_eq!(truncate_title("a", Some(1)), "a");
    }

    #[test]
    fn test_no_limit_never_truncates() {
        let long = "x".repeat(500);
        assert_eq!(truncate_title(&long, None), long);
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        assert_eq!(truncate_title("éééééé", Some(4)), "ééé…");
        assert_eq!(truncate_title("日本語", Some(3)), "日本語");
    }

    #[test]
    fn test_empty_default_label_is_returned_as_is() {
        let config = TitleConfig {
            default_label: String::new(),
            ..TitleConfig::default()
        };
        assert_eq!(compute_title(&Lines::empty(), &config), "");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn any_config() -> impl Strategy<Value = TitleConfig> {
            ("[a-z]{1,12}", proptest::option::of(0..80usize), any::<bool>()).prop_map(
                |(default_label, max_length, scan_for_first_row)| TitleConfig {
                    default_label,
                    max_length,
                    scan_for_first_row,
                },
            )
        }

        proptest! {
            #[test]
            fn title_is_never_empty(text in "[ a-z\t\n]{0,200}", config in any_config()) {
                let lines = Lines::from_text(&text);
                prop_assert!(!compute_title(&lines, &config).is_empty());
            }

            #[test]
            fn title_has_no_blank_edges(text in "[ a-z\t\n\u{FEFF}\u{A0}]{0,200}", config in any_config()) {
                let lines = Lines::from_text(&text);
                let title = compute_title(&lines, &config);
                prop_assert!(!title.is_empty());
                prop_assert!(!title.starts_with(is_blank));
                prop_assert!(!title.ends_with(is_blank));
            }

            #[test]
            fn title_is_stable(text in "[ a-zé\n]{0,200}", config in any_config()) {
                let lines = Lines::from_text(&text);
                prop_assert_eq!(compute_title(&lines, &config), compute_title(&lines, &config));
            }

            #[test]
            fn long_titles_are_cut_to_the_limit(line in "[a-zé]{1,120}", max in 1..60usize) {
                let lines = Lines::from_text(&line);
                let config = TitleConfig { max_length: Some(max), ..TitleConfig::default() };
                let title = compute_title(&lines, &config);
                if line.chars().count() > max {
                    prop_assert_eq!(title.chars().count(), max);
                    prop_assert!(title.ends_with(ELLIPSIS));
                } else {
                    prop_assert_eq!(title, line);
                }
            }
        }
    }
}
