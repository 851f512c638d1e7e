//! Splitting oversized reports into transport-sized messages.
//!
//! Cuts fall on natural boundaries where possible: the last line break
//! inside the budget, falling back to the last space when the line break
//! would waste more than half the budget, and finally a hard cut so even
//! unbroken text terminates. Whitespace at a cut point is collapsed.

use super::text::char_boundary;

/// Split `text` into chunks of at most `max_chars` characters each.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    assert!(max_chars >= 1, "chunk limit must be at least one character");

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        let limit = char_boundary(remaining, max_chars);
        if limit == remaining.len() {
            chunks.push(remaining.to_string());
            break;
        }

        // The separator search window runs one character past the budget:
        // a break sitting right after a full chunk still cuts there, and
        // the break itself is consumed by the trim below.
        let window = &remaining[..char_boundary(remaining, max_chars + 1)];
        let half = char_boundary(remaining, max_chars.div_ceil(2));

        // A line break in the first half of the window is discarded in
        // favor of the last space; a separator at index 0 counts as none,
        // which guarantees forward progress.
        let mut cut = window.rfind('\n').filter(|&i| i >= half);
        if cut.is_none() {
            cut = window.rfind(' ');
        }
        let cut = match cut {
            Some(i) if i > 0 => i,
            _ => limit,
        };

        chunks.push(remaining[..cut].to_string());
        remaining = remaining[cut..].trim_start();
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        assert_eq!(split_message("oi", 10), vec!["oi"]);
        assert_eq!(split_message("", 10), Vec::<String>::new());
    }

    #[test]
    fn test_prefers_line_breaks() {
        let text = "primeira linha\nsegunda linha\nterceira";
        let chunks = split_message(text, 20);
        assert_eq!(chunks[0], "primeira linha");
        assert!(chunks.iter().all(|c| c.chars().count() <= 20));
    }

    #[test]
    fn test_falls_back_to_space_when_break_is_early() {
        // The only line break sits in the first half of the budget, so the
        // cut moves to the last space instead.
        let text = "ab\ncd palavra palavra palavra palavra";
        let chunks = split_message(text, 20);
        assert!(chunks[0].len() > 10, "early line break should not win: {:?}", chunks);
        assert!(chunks[0].ends_with("palavra") || chunks[0].ends_with("cd"));
        assert!(chunks.iter().all(|c| c.chars().count() <= 20));
    }

    #[test]
    fn test_break_just_past_a_full_chunk_still_wins() {
        // "abcde fghi" is exactly ten characters; the line break right
        // after it cuts a full chunk instead of retreating to the space.
        let text = "abcde fghi\nresto";
        let chunks = split_message(text, 10);
        assert_eq!(chunks, vec!["abcde fghi", "resto"]);
    }

    #[test]
    fn test_hard_cut_on_unbroken_text() {
        let text = "x".repeat(25);
        let chunks = split_message(&text, 10);
        assert_eq!(chunks, vec!["x".repeat(10), "x".repeat(10), "x".repeat(5)]);
    }

    #[test]
    fn test_no_chunk_exceeds_limit() {
        let text = "palavra ".repeat(500) + &"\n".to_string() + &"y".repeat(100);
        for max in [1usize, 2, 7, 39, 100] {
            let chunks = split_message(&text, max);
            for chunk in &chunks {
                assert!(chunk.chars().count() <= max, "limit {} violated", max);
            }
        }
    }

    #[test]
    fn test_round_trip_preserves_words() {
        let text = "Relatório de análise.\n\nSeção um com várias palavras.\nSeção dois.";
        let chunks = split_message(text, 16);
        let rejoined = chunks.join(" ");
        let original: Vec<&str> = text.split_whitespace().collect();
        let restored: Vec<&str> = rejoined.split_whitespace().collect();
        assert_eq!(original, restored);
    }

    #[test]
    fn test_multibyte_text_cuts_on_char_boundaries() {
        let text = "ç".repeat(30);
        let chunks = split_message(&text, 8);
        assert!(chunks.iter().all(|c| c.chars().count() <= 8));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_terminates_at_limit_one() {
        let chunks = split_message("abc def", 1);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.chars().count() == 1));
        // Whitespace collapses at cut points; letters survive.
        assert_eq!(chunks.concat(), "abcdef");
    }
}
