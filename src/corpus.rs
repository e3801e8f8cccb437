use crate::error::{HavenError, Result};
use crate::types::CorpusEntry;
use std::fs;
use std::path::Path;

/// Built-in corpus of mood categories and coping tips. Used when no
/// corpus file is configured. Order is fixed and load order is preserved
/// everywhere downstream.
const BUILTIN: &[(&str, &str)] = &[
    ("loneliness", "Call a friend or family member for a quick chat."),
    ("loneliness", "Join a community group or club that aligns with your interests."),
    ("anxiety", "Practice deep breathing exercises for 5 minutes."),
    ("anxiety", "Write down what's making you anxious and challenge the thoughts."),
    ("depression", "Go for a short walk in natural surroundings."),
    ("depression", "Maintain a gratitude journal to track things you're thankful for."),
    ("stress", "Step away from the screen and stretch for ten minutes."),
    ("stress", "Break the task in front of you into one small next step."),
    ("anger", "Count slowly to ten before responding to what upset you."),
    ("anger", "Channel the energy into a brisk walk or quick workout."),
    ("sadness", "Let yourself feel it, then do one small kind thing for yourself."),
    ("sadness", "Put on music you loved at a happier time."),
    ("sleep", "Keep screens out of reach for the hour before bed."),
    ("sleep", "Try a body-scan relaxation from your toes upward."),
    ("self-doubt", "Write down three things you handled well this week."),
    ("self-doubt", "Talk to yourself the way you would to a good friend."),
];

/// Load the built-in corpus.
pub fn builtin() -> Vec<CorpusEntry> {
    BUILTIN
        .iter()
        .map(|(label, tip)| CorpusEntry::new(*label, *tip))
        .collect()
}

/// Load a corpus from a delimited file.
///
/// Expected format: a header row followed by data rows with at least two
/// comma-separated columns, label first and tip second. Fields may be
/// double-quoted to contain commas; doubled quotes escape a quote.
pub fn load_file(path: &Path) -> Result<Vec<CorpusEntry>> {
    let raw = fs::read_to_string(path).map_err(|e| {
        HavenError::DataSource(format!("cannot read {}: {}", path.display(), e))
    })?;
    parse_csv(&raw)
}

/// Parse delimited corpus text (header row + label,tip rows).
pub fn parse_csv(raw: &str) -> Result<Vec<CorpusEntry>> {
    let mut entries = Vec::new();
    let mut header_seen = false;

    for (line_no, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        // First non-empty line is the header
        if !header_seen {
            header_seen = true;
            continue;
        }

        let fields = split_fields(line)
            .map_err(|e| HavenError::DataSource(format!("line {}: {}", line_no + 1, e)))?;

        if fields.len() < 2 {
            return Err(HavenError::DataSource(format!(
                "line {}: expected at least 2 columns (label, tip), got {}",
                line_no + 1,
                fields.len()
            )));
        }

        let label = fields[0].trim();
        let tip = fields[1].trim();
        if label.is_empty() || tip.is_empty() {
            return Err(HavenError::DataSource(format!(
                "line {}: empty label or tip",
                line_no + 1
            )));
        }

        entries.push(CorpusEntry::new(label, tip));
    }

    Ok(entries)
}

/// Split one CSV line into fields, honoring double quotes.
fn split_fields(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                // Doubled quote inside a quoted field is a literal quote
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.is_empty() => in_quotes = true,
            '"' => return Err("unexpected quote inside unquoted field".to_string()),
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }

    fields.push(current);
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_ordered_and_nonempty() {
        let corpus = builtin();
        assert!(!corpus.is_empty());
        assert_eq!(corpus[0].label, "loneliness");
        assert_eq!(corpus[2].label, "anxiety");
    }

    #[test]
    fn test_parse_csv_basic() {
        let raw = "label,tip\nanxious,breathe deeply\nsad,call a friend\n";
        let corpus = parse_csv(raw).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus[0].label, "anxious");
        assert_eq!(corpus[0].tip, "breathe deeply");
        assert_eq!(corpus[1].label, "sad");
    }

    #[test]
    fn test_parse_csv_quoted_fields() {
        let raw = "label,tip\nstress,\"Pause, breathe, and step outside.\"\n";
        let corpus = parse_csv(raw).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus[0].tip, "Pause, breathe, and step outside.");
    }

    #[test]
    fn test_parse_csv_escaped_quote() {
        let raw = "label,tip\ncalm,\"Say \"\"I can handle this\"\" out loud.\"\n";
        let corpus = parse_csv(raw).unwrap();
        assert_eq!(corpus[0].tip, "Say \"I can handle this\" out loud.");
    }

    #[test]
    fn test_parse_csv_missing_column() {
        let raw = "label,tip\nonlyonefield\n";
        let err = parse_csv(raw).unwrap_err();
        assert!(matches!(err, HavenError::DataSource(_)));
    }

    #[test]
    fn test_parse_csv_empty_field() {
        let raw = "label,tip\nanxious,\n";
        let err = parse_csv(raw).unwrap_err();
        assert!(matches!(err, HavenError::DataSource(_)));
    }

    #[test]
    fn test_parse_csv_header_only_is_empty() {
        let corpus = parse_csv("label,tip\n").unwrap();
        assert!(corpus.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let err = load_file(Path::new("/nonexistent/corpus.csv")).unwrap_err();
        assert!(matches!(err, HavenError::DataSource(_)));
    }
}
