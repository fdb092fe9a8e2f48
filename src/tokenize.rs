use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Result;

/// Literal that closes the OpenITI metadata header.
pub const HEADER_END: &str = "#META#Header#End";

lazy_static! {
    // Closes the page it follows: everything before the marker belongs to it
    static ref PAGE_MARKER: Regex = Regex::new(r"PageV\d+P\d+").unwrap();
}

/// Compiled token pattern.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    pattern: Regex,
}

impl Tokenizer {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn tokens<'t>(&self, text: &'t str) -> impl Iterator<Item = &'t str> {
        self.pattern.find_iter(text).map(|m| m.as_str())
    }
}

/// One element of a book split on page markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'t> {
    Marker(&'t str),
    Text(&'t str),
}

/// Split `text` on page markers, keeping each marker as its own segment.
/// Empty stretches between adjacent markers are dropped.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut last = 0;
    for m in PAGE_MARKER.find_iter(text) {
        if m.start() > last {
            out.push(Segment::Text(&text[last..m.start()]));
        }
        out.push(Segment::Marker(m.as_str()));
        last = m.end();
    }
    if last < text.len() {
        out.push(Segment::Text(&text[last..]));
    }
    out
}

/// Everything after the last metadata header end marker, or the whole
/// text when there is no header.
pub fn strip_header(text: &str) -> &str {
    match text.rfind(HEADER_END) {
        Some(idx) => &text[idx + HEADER_END.len()..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_keep_markers() {
        let segs = segments("PageV01P001hello world PageV01P002foo");
        assert_eq!(
            segs,
            vec![
                Segment::Marker("PageV01P001"),
                Segment::Text("hello world "),
                Segment::Marker("PageV01P002"),
                Segment::Text("foo"),
            ]
        );
    }

    #[test]
    fn test_segments_without_markers() {
        assert_eq!(segments("no pages here"), vec![Segment::Text("no pages here")]);
        assert!(segments("").is_empty());
    }

    #[test]
    fn test_adjacent_markers() {
        assert_eq!(
            segments("PageV01P001PageV01P002"),
            vec![Segment::Marker("PageV01P001"), Segment::Marker("PageV01P002")]
        );
    }

    #[test]
    fn test_strip_header() {
        let text = "######OpenITI#\n#META# x\n#META#Header#End#\nbody PageV01P001";
        assert_eq!(strip_header(text), "#\nbody PageV01P001");
        assert_eq!(strip_header("body"), "body");
        assert_eq!(strip_header("a#META#Header#Endb#META#Header#Endc"), "c");
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(Tokenizer::new("[unclosed").is_err());
    }
}
