use serde::{Deserialize, Serialize};

const FRONT_MATTER_DELIMITER: &str = "---";

/// Settings a template may declare in its YAML front matter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrontMatter {
    pub model: Option<String>,
    pub max_tokens: Option<usize>,
    /// Command to run after files are written.
    pub exec: Option<String>,
    /// Single target file for responses without markers.
    pub output: Option<String>,
}

/// Split a template into its front matter and body.
///
/// Front matter is a YAML block between two `---` lines at the very start of
/// the text. Without a complete block the text is returned unchanged with
/// default settings.
pub fn split_front_matter(text: &str) -> Result<(FrontMatter, String), serde_yaml::Error> {
    let mut lines = text.split_inclusive('\n');

    let Some(first) = lines.next() else {
        return Ok((FrontMatter::default(), text.to_string()));
    };
    if first.trim_end() != FRONT_MATTER_DELIMITER {
        return Ok((FrontMatter::default(), text.to_string()));
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;

    for line in lines {
        if line.trim_end() == FRONT_MATTER_DELIMITER {
            let yaml = &text[yaml_start..offset];
            let front_matter = if yaml.trim().is_empty() {
                FrontMatter::default()
            } else {
                serde_yaml::from_str(yaml)?
            };

            return Ok((front_matter, text[offset + line.len()..].to_string()));
        }
        offset += line.len();
    }

    Ok((FrontMatter::default(), text.to_string()))
}

/// Prefix each line with its 1-based number, right-aligned.
///
/// ```text
///  9: fn main() {
/// 10:     run();
/// ```
pub fn number_lines(text: &str) -> String {
    let count = text.lines().count();
    let width = count.to_string().len();

    text.lines()
        .enumerate()
        .map(|(i, line)| format!("{:>width$}: {}", i + 1, line, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================
    // split_front_matter tests
    // ============================================================================

    #[test]
    fn test_no_front_matter() {
        let (front, body) = split_front_matter("Write a function.\n").unwrap();
        assert_eq!(front, FrontMatter::default());
        assert_eq!(body, "Write a function.\n");
    }

    #[test]
    fn test_front_matter_parsed_and_removed() {
        let text = "---\nmodel: gpt-4\nmax_tokens: 1200\noutput: src/lib.rs\n---\nBody line\n";
        let (front, body) = split_front_matter(text).unwrap();

        assert_eq!(front.model.as_deref(), Some("gpt-4"));
        assert_eq!(front.max_tokens, Some(1200));
        assert_eq!(front.output.as_deref(), Some("src/lib.rs"));
        assert_eq!(front.exec, None);
        assert_eq!(body, "Body line\n");
    }

    #[test]
    fn test_empty_front_matter() {
        let (front, body) = split_front_matter("---\n---\nBody").unwrap();
        assert_eq!(front, FrontMatter::default());
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_unterminated_front_matter_is_body() {
        let text = "---\nmodel: gpt-4\nno closing line";
        let (front, body) = split_front_matter(text).unwrap();
        assert_eq!(front, FrontMatter::default());
        assert_eq!(body, text);
    }

    #[test]
    fn test_unknown_front_matter_key_is_error() {
        assert!(split_front_matter("---\ntemperature: 1\n---\nBody").is_err());
    }

    #[test]
    fn test_horizontal_rule_later_in_text_is_not_front_matter() {
        let text = "Intro\n---\nmore\n---\n";
        let (_, body) = split_front_matter(text).unwrap();
        assert_eq!(body, text);
    }

    // ============================================================================
    // number_lines tests
    // ============================================================================

    #[test]
    fn test_number_lines_pads_to_widest() {
        let text = (1..=10).map(|i| format!("l{i}")).collect::<Vec<_>>().join("\n");
        let numbered = number_lines(&text);
        let lines: Vec<_> = numbered.lines().collect();

        assert_eq!(lines[0], " 1: l1");
        assert_eq!(lines[9], "10: l10");
    }

    #[test]
    fn test_number_lines_keeps_blank_lines() {
        assert_eq!(number_lines("a\n\nb"), "1: a\n2: \n3: b");
    }

    #[test]
    fn test_number_lines_empty() {
        assert_eq!(number_lines(""), "");
    }
}
