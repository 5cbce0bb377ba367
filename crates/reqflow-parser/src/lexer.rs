//! Lexer/segmenter: splits raw text into the frontmatter block and
//! indentation-tagged body lines.
//!
//! No semantic interpretation happens here; this stage is purely
//! structural.

use reqflow_core::{Issue, IssueKind, Issues};

/// Frontmatter delimiter line.
const DELIMITER: &str = "---";

/// One body line, tagged with its indentation depth in spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based line number in the source document.
    pub number: usize,
    /// Leading-space count. Blank lines are depth 0.
    pub indent: usize,
    /// Line content with the indentation stripped.
    pub text: String,
}

impl Line {
    /// Whether the line is blank (empty or whitespace-only).
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Result of segmentation: the raw frontmatter block plus tokenized
/// body lines.
#[derive(Debug, Clone)]
pub struct Segments {
    /// Raw YAML between the two `---` delimiters.
    pub frontmatter: String,
    /// 1-based line number of the first frontmatter line.
    pub frontmatter_start: usize,
    /// Body lines after the closing delimiter.
    pub body: Vec<Line>,
}

/// Split raw document text into frontmatter and body tokens.
///
/// Fails (by recording fatal issues) on a leading byte-order mark or
/// on missing frontmatter delimiters. Invalid UTF-8 never reaches this
/// function; file loaders map decode failures to an encoding issue
/// before parsing.
pub fn segment(raw: &str, issues: &mut Issues) -> Option<Segments> {
    if raw.starts_with('\u{feff}') {
        issues.push(
            Issue::new(IssueKind::Encoding, "byte-order mark at start of document; the format forbids BOM")
                .at_line(1),
        );
        return None;
    }

    let lines: Vec<&str> = raw.lines().collect();

    // The document must open with a `---` delimiter line, optionally
    // preceded by blank lines.
    let mut idx = 0;
    while idx < lines.len() && lines[idx].trim().is_empty() {
        idx += 1;
    }
    if idx >= lines.len() || lines[idx].trim_end() != DELIMITER {
        issues.push(
            Issue::new(
                IssueKind::Structural,
                "expected opening `---` frontmatter delimiter",
            )
            .at_line(idx + 1),
        );
        return None;
    }
    let open = idx;

    // Find the closing delimiter.
    let close = match lines
        .iter()
        .enumerate()
        .skip(open + 1)
        .find(|(_, l)| l.trim_end() == DELIMITER)
    {
        Some((i, _)) => i,
        None => {
            issues.push(
                Issue::new(
                    IssueKind::Structural,
                    "missing closing `---` frontmatter delimiter",
                )
                .at_line(open + 1),
            );
            return None;
        }
    };

    let frontmatter = lines[open + 1..close].join("\n");

    let mut body = Vec::with_capacity(lines.len().saturating_sub(close));
    for (i, raw_line) in lines.iter().enumerate().skip(close + 1) {
        let number = i + 1;
        if raw_line.trim().is_empty() {
            // Blank lines are preserved as depth-0 separators.
            body.push(Line {
                number,
                indent: 0,
                text: String::new(),
            });
            continue;
        }
        let stripped = raw_line.trim_start_matches(' ');
        let indent = raw_line.len() - stripped.len();
        if stripped.starts_with('\t') {
            issues.push(
                Issue::new(IssueKind::Schema, "tab character in indentation; use spaces")
                    .at_line(number),
            );
            continue;
        }
        body.push(Line {
            number,
            indent,
            text: stripped.to_string(),
        });
    }

    Some(Segments {
        frontmatter,
        frontmatter_start: open + 2,
        body,
    })
}
