use std::sync::Arc;

/// Characters of context kept on each side of the offending column in an excerpt.
pub const EXCERPT_RADIUS: usize = 25;

const ELLIPSIS: &str = "...";

/// A [`SourceInfo`] maintains the text a lexer is reading from.
/// Maintains the filename (if from a file) and the source split into lines,
/// so that diagnostics can quote the line an error was found on.
#[derive(Clone, Debug)]
pub struct SourceInfo {
    source: Source,
    lines: Arc<Vec<String>>,
}

impl SourceInfo {
    pub fn unknown() -> SourceInfo {
        SourceInfo {
            source: Source::Unknown,
            lines: Arc::new(vec![]),
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn from_file(filepath: &std::path::Path, contents: &str) -> SourceInfo {
        SourceInfo {
            source: Source::File(Arc::new(filepath.to_owned())),
            lines: Arc::new(split_lines(contents)),
        }
    }

    pub fn from_string(contents: &str) -> SourceInfo {
        SourceInfo {
            source: Source::String,
            lines: Arc::new(split_lines(contents)),
        }
    }

    /// The text of a zero-based line, without its line terminator.
    /// Lines past the end of the source (where EOF tokens live) are empty.
    pub fn line(&self, line: usize) -> &str {
        self.lines.get(line).map(|line| line.as_str()).unwrap_or("")
    }

    /// The offending line cut down to [`EXCERPT_RADIUS`] characters either side of `linecol`,
    /// together with a caret line pointing at the offending character.
    pub fn excerpt(&self, linecol: &LineCol) -> (String, String) {
        let chars: Vec<char> = self.line(linecol.line_index()).chars().collect();
        let col = linecol.col_index();

        let mut excerpt = String::new();
        let start = if col > EXCERPT_RADIUS {
            excerpt.push_str(ELLIPSIS);
            col - EXCERPT_RADIUS
        } else {
            0
        };
        let end = if chars.len() > col + EXCERPT_RADIUS + 1 {
            col + EXCERPT_RADIUS + 1
        } else {
            chars.len()
        };

        let caret_offset = excerpt.len() + col - start;
        excerpt.extend(&chars[start.min(end)..end]);
        if end < chars.len() {
            excerpt.push_str(ELLIPSIS);
        }

        let caret = format!("{}^", " ".repeat(caret_offset));
        (excerpt, caret)
    }
}

#[derive(Clone, Debug)]
pub enum Source {
    File(Arc<std::path::PathBuf>),
    String,
    Unknown,
}

/// A [`LineCol`] is a container for a zero-based line and column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineCol(usize, usize);

impl LineCol {
    pub fn new(line: usize, col: usize) -> LineCol {
        LineCol(line, col)
    }

    /// The line number. Starts with line 1.
    pub fn line(&self) -> usize {
        self.0 + 1
    }

    /// The column. Starts with column 1.
    pub fn col(&self) -> usize {
        self.1 + 1
    }

    pub fn line_index(&self) -> usize {
        self.0
    }

    pub fn col_index(&self) -> usize {
        self.1
    }
}

impl std::fmt::Display for LineCol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}:{}", self.line(), self.col())
    }
}

/// Many objects have location information.
/// [`HasLoc`] allows you to call [`HasLoc::loc`] to get where they start.
pub trait HasLoc {
    fn loc(&self) -> LineCol;
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}
