//! Splitting of a post into its YAML header and Markdown body.

use serde_yaml::{Mapping, Value};

use crate::error::ParseErrorKind;

const BOM: char = '\u{feff}';
const OPEN_DELIMITER: &str = "---";
const CLOSE_DELIMITERS: [&str; 2] = ["---", "..."];

/// Raw header text and untouched body text of a post.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrontMatterSplit<'a> {
    pub header: &'a str,
    pub body: &'a str,
}

#[derive(Debug)]
struct LineRecord<'a> {
    text: &'a str,
    start: usize,
    end: usize,
}

/// Split `contents` at the front matter delimiters.
///
/// The first line must be `---`; the header runs until the next `---` or `...`
/// line. Everything after the closing line is returned verbatim as the body.
pub fn split_front_matter(contents: &str) -> Result<FrontMatterSplit<'_>, ParseErrorKind> {
    let contents = contents.strip_prefix(BOM).unwrap_or(contents);
    let mut lines = line_records(contents);

    match lines.next() {
        Some(first) if first.text.trim_end() == OPEN_DELIMITER => {
            let header_start = first.end;
            for line in lines {
                if CLOSE_DELIMITERS.contains(&line.text.trim_end()) {
                    return Ok(FrontMatterSplit {
                        header: &contents[header_start..line.start],
                        body: &contents[line.end..],
                    });
                }
            }
            Err(ParseErrorKind::MissingClosingDelimiter)
        }
        _ => Err(ParseErrorKind::MissingOpeningDelimiter),
    }
}

/// Parse header text into an ordered key/value mapping.
///
/// A blank header is an empty mapping; any other non-mapping document is rejected.
pub fn parse_header(header: &str) -> Result<Mapping, ParseErrorKind> {
    if header.trim().is_empty() {
        return Ok(Mapping::new());
    }

    let value: Value = serde_yaml::from_str(header)
        .map_err(|err| ParseErrorKind::InvalidYaml(err.to_string()))?;

    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err(ParseErrorKind::NotAMapping),
    }
}

/// Serialize a header mapping and body back into post source text.
pub fn render_source(front_matter: &Mapping, body: &str) -> Result<String, serde_yaml::Error> {
    let mut out = String::from("---\n");
    if !front_matter.is_empty() {
        out.push_str(&serde_yaml::to_string(front_matter)?);
    }
    out.push_str("---\n");
    out.push_str(body);
    Ok(out)
}

fn line_records(contents: &str) -> impl Iterator<Item = LineRecord<'_>> {
    let mut offset = 0usize;
    std::iter::from_fn(move || {
        if offset >= contents.len() {
            return None;
        }

        let start = offset;
        let rest = &contents[start..];
        let (line, consumed) = match rest.find('\n') {
            Some(idx) => (&rest[..idx], idx + 1),
            None => (rest, rest.len()),
        };
        offset += consumed;

        Some(LineRecord {
            text: line.strip_suffix('\r').unwrap_or(line),
            start,
            end: offset,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_header_and_body() {
        let split = split_front_matter("---\nlayout: post\ntitle: Example\n---\nHello").unwrap();
        assert_eq!(split.header, "layout: post\ntitle: Example\n");
        assert_eq!(split.body, "Hello");
    }

    #[test]
    fn accepts_crlf_bom_and_dot_terminator() {
        let split = split_front_matter("\u{feff}---\r\ntitle: A\r\n...\r\nBody\r\n").unwrap();
        assert_eq!(split.header, "title: A\r\n");
        assert_eq!(split.body, "Body\r\n");
    }

    #[test]
    fn closing_delimiter_on_last_line_leaves_empty_body() {
        let split = split_front_matter("---\ntitle: A\n---").unwrap();
        assert_eq!(split.body, "");
    }

    #[test]
    fn rejects_missing_delimiters() {
        assert_eq!(
            split_front_matter("title: A\n---\nBody"),
            Err(ParseErrorKind::MissingOpeningDelimiter)
        );
        assert_eq!(
            split_front_matter(""),
            Err(ParseErrorKind::MissingOpeningDelimiter)
        );
        assert_eq!(
            split_front_matter("---\ntitle: A\nBody\n"),
            Err(ParseErrorKind::MissingClosingDelimiter)
        );
    }

    #[test]
    fn indented_dashes_do_not_close_the_header() {
        assert_eq!(
            split_front_matter("---\ntitle: A\n  ---\n"),
            Err(ParseErrorKind::MissingClosingDelimiter)
        );
    }

    #[test]
    fn header_must_be_mapping() {
        assert!(parse_header("").unwrap().is_empty());
        assert!(parse_header("~\n").unwrap().is_empty());
        assert_eq!(parse_header("- a\n- b\n"), Err(ParseErrorKind::NotAMapping));
        assert!(matches!(
            parse_header("title: [unclosed\n"),
            Err(ParseErrorKind::InvalidYaml(_))
        ));
    }
}
