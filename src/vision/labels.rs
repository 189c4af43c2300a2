// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Parsing of free-text vision model replies into ranked labels

use super::LabelScore;

/// Parse a model reply into at most `top_k` ranked labels (0 = no limit)
///
/// Accepts one label per line or a single comma-separated line. Each label
/// may carry a trailing score such as `: 0.8`, `0.8`, `(80%)` or `80%`.
/// Labels without a score get a descending score by rank. Lead-in lines
/// ending in `:` are skipped, and in a bulleted or numbered list so are
/// unmarked lines that read as sentences.
pub fn parse_labels(text: &str, top_k: usize) -> Vec<LabelScore> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let pieces: Vec<&str> = if lines.len() == 1 {
        lines[0].split(',').map(strip_marker).collect()
    } else {
        list_items(&lines)
    };

    let limit = if top_k == 0 { usize::MAX } else { top_k };

    pieces
        .into_iter()
        .filter_map(|piece| {
            let (label, score) = split_score(piece);
            let label = clean_label(label);
            (!label.is_empty()).then(|| (label, score))
        })
        .take(limit)
        .enumerate()
        .map(|(rank, (label, score))| LabelScore {
            label,
            score: score.unwrap_or(1.0 / (rank + 1) as f64),
        })
        .collect()
}

/// Item lines of a multi-line reply, markers removed
fn list_items<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    let is_list = lines.iter().any(|line| split_marker(line).is_some());
    let last = lines.len().saturating_sub(1);

    lines
        .iter()
        .enumerate()
        .filter_map(|(idx, &line)| match split_marker(line) {
            Some(item) => Some(item),
            None if idx < last && line.ends_with(':') => None,
            None if is_list && reads_as_sentence(line) => None,
            None => Some(line),
        })
        .collect()
}

fn reads_as_sentence(line: &str) -> bool {
    line.ends_with(['.', '!', '?', ':']) || line.split_whitespace().count() > 4
}

fn strip_marker(piece: &str) -> &str {
    split_marker(piece).unwrap_or_else(|| piece.trim())
}

/// Text after a list bullet or `N.` / `N)` numbering, if the piece has one
fn split_marker(piece: &str) -> Option<&str> {
    let piece = piece.trim();

    if piece.starts_with(['-', '*', '•']) {
        return Some(piece.trim_start_matches(['-', '*', '•']).trim_start());
    }

    let digits = piece.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = piece[digits..].strip_prefix(['.', ')'])?;
    (rest.is_empty() || rest.starts_with(char::is_whitespace)).then(|| rest.trim_start())
}

fn split_score(piece: &str) -> (&str, Option<f64>) {
    let piece = piece.trim().trim_end_matches('.');

    if let Some(inner) = piece.strip_suffix(')') {
        if let Some((label, score)) = inner.rsplit_once('(') {
            if let Some(score) = parse_score(score) {
                return (label, Some(score));
            }
        }
    }

    for separator in [':', ' '] {
        if let Some((label, score)) = piece.rsplit_once(separator) {
            if let Some(score) = parse_score(score) {
                if !label.trim().is_empty() {
                    return (label, Some(score));
                }
            }
        }
    }

    (piece, None)
}

/// Scores are fractions in [0, 1] or percentages with a `%` sign
fn parse_score(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let (number, scale) = match raw.strip_suffix('%') {
        Some(number) => (number.trim(), 100.0),
        None => (raw, 1.0),
    };

    let value = number.parse::<f64>().ok()? / scale;
    (value.is_finite() && (0.0..=1.0).contains(&value)).then_some(value)
}

fn clean_label(label: &str) -> String {
    label
        .trim()
        .trim_end_matches([':', '-', '.'])
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve_ranked;
    use crate::taxonomy::Preset;

    #[test]
    fn test_comma_separated() {
        let labels = parse_labels("plastic bottle, water bottle, cup", 0);
        let names: Vec<_> = labels.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(names, vec!["plastic bottle", "water bottle", "cup"]);
        assert_eq!(labels[0].score, 1.0);
        assert_eq!(labels[1].score, 0.5);
    }

    #[test]
    fn test_numbered_lines_with_scores() {
        let reply = "1. banana: 0.91\n2. lemon (6%)\n3) \"orange\" 0.02\n";
        let labels = parse_labels(reply, 5);
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[0], LabelScore::new("banana", 0.91));
        assert_eq!(labels[1].label, "lemon");
        assert!((labels[1].score - 0.06).abs() < 1e-9);
        assert_eq!(labels[2], LabelScore::new("orange", 0.02));
    }

    #[test]
    fn test_bullets_and_top_k() {
        let labels = parse_labels("- laptop\n* notebook\n• keyboard", 2);
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[1].label, "notebook");
    }

    #[test]
    fn test_numbers_in_labels_are_not_scores() {
        let labels = parse_labels("model 3 car", 0);
        assert_eq!(labels[0].label, "model 3 car");

        let labels = parse_labels("unknown_object_123", 0);
        assert_eq!(labels[0].label, "unknown_object_123");
        assert_eq!(labels[0].score, 1.0);
    }

    #[test]
    fn test_out_of_range_score_stays_in_label() {
        let labels = parse_labels("cup 150%", 0);
        assert_eq!(labels[0].label, "cup 150%");
    }

    #[test]
    fn test_lead_in_line_is_dropped() {
        let labels = parse_labels("Here is what I can see:\nbanana peel: 0.9\napple core: 0.5", 5);
        assert_eq!(
            labels,
            vec![LabelScore::new("banana peel", 0.9), LabelScore::new("apple core", 0.5)]
        );

        let names: Vec<&str> = labels.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(resolve_ranked(&names, &Preset::Materials.table()), "others");
        assert_eq!(resolve_ranked(&names, &Preset::Disposal.table()), "biodegradable");
    }

    #[test]
    fn test_chatter_around_a_list_is_dropped() {
        let reply = "Sure! Here are the items in the photo\n1. plastic bottle (90%)\n2. cup\nLet me know if you need more.";
        let labels = parse_labels(reply, 5);
        let names: Vec<_> = labels.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(names, vec!["plastic bottle", "cup"]);
        assert!((labels[0].score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_decimal_is_not_a_list_marker() {
        let labels = parse_labels("1.5L bottle\n2. cup", 5);
        let names: Vec<_> = labels.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(names, vec!["1.5L bottle", "cup"]);

        let labels = parse_labels("2.5 kg bag of flour, 3) jar", 0);
        assert_eq!(labels[0].label, "2.5 kg bag of flour");
        assert_eq!(labels[1].label, "jar");
    }

    #[test]
    fn test_empty_reply() {
        assert!(parse_labels("", 5).is_empty());
        assert!(parse_labels(" \n , ,\n", 5).is_empty());
    }
}
