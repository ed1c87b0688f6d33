use std::ops::Range;

use crate::ast::Pos;
use crate::parser::error::ParseError;

/// A top-level piece of template source.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment {
    /// Literal text between delimiters, already whitespace-trimmed.
    Text { data: String, start: usize },
    /// `{{ … }}`: `inner` is the byte range of the expression source.
    Print { inner: Range<usize>, start: usize },
    /// `{% … %}`: `inner` is the byte range of the tag source.
    Tag { inner: Range<usize>, span: Range<usize> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Delimiter {
    Print,
    Tag,
    Comment,
}

impl Delimiter {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'{' => Some(Delimiter::Print),
            b'%' => Some(Delimiter::Tag),
            b'#' => Some(Delimiter::Comment),
            _ => None,
        }
    }

    fn open(self) -> &'static str {
        match self {
            Delimiter::Print => "{{",
            Delimiter::Tag => "{%",
            Delimiter::Comment => "{#",
        }
    }

    fn close(self) -> &'static str {
        match self {
            Delimiter::Print => "}}",
            Delimiter::Tag => "%}",
            Delimiter::Comment => "#}",
        }
    }
}

/// Split template source into text, print and tag segments. Comments are
/// dropped; `-` on either side of a delimiter trims the adjacent text.
pub(crate) fn segment(source: &str, file_id: usize) -> Result<Vec<Segment>, ParseError> {
    let bytes = source.as_bytes();
    let mut segments = Vec::new();
    let mut pos = 0;
    let mut trim_next = false;

    loop {
        let Some((open, delim)) = find_open(bytes, pos) else {
            push_text(&mut segments, source, pos, source.len(), trim_next, false);
            break;
        };

        let mut inner_start = open + 2;
        let trim_prev = bytes.get(inner_start) == Some(&b'-');
        if trim_prev {
            inner_start += 1;
        }
        push_text(&mut segments, source, pos, open, trim_next, trim_prev);

        let close = find_close(bytes, inner_start, delim).ok_or_else(|| {
            ParseError::error(
                format!("unclosed `{}`", delim.open()),
                open..open + 2,
                file_id,
            )
            .with_note(format!("expected a matching `{}`", delim.close()))
        })?;

        let mut inner_end = close;
        trim_next = inner_end > inner_start && bytes[inner_end - 1] == b'-';
        if trim_next {
            inner_end -= 1;
        }
        pos = close + 2;

        match delim {
            Delimiter::Print => segments.push(Segment::Print {
                inner: inner_start..inner_end,
                start: open,
            }),
            Delimiter::Tag => segments.push(Segment::Tag {
                inner: inner_start..inner_end,
                span: open..pos,
            }),
            Delimiter::Comment => {}
        }
    }

    Ok(segments)
}

fn push_text(
    segments: &mut Vec<Segment>,
    source: &str,
    from: usize,
    to: usize,
    trim_start: bool,
    trim_end: bool,
) {
    let mut text = &source[from..to];
    let mut start = from;
    if trim_start {
        let trimmed = text.trim_start();
        start += text.len() - trimmed.len();
        text = trimmed;
    }
    if trim_end {
        text = text.trim_end();
    }
    if !text.is_empty() {
        segments.push(Segment::Text {
            data: text.to_string(),
            start,
        });
    }
}

fn find_open(bytes: &[u8], from: usize) -> Option<(usize, Delimiter)> {
    let mut i = from;
    while i + 1 < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(delim) = Delimiter::from_byte(bytes[i + 1]) {
                return Some((i, delim));
            }
        }
        i += 1;
    }
    None
}

/// Find the closing delimiter, skipping over quoted strings in print and
/// tag bodies so that `{{ "}}" }}` closes at the right place.
fn find_close(bytes: &[u8], from: usize, delim: Delimiter) -> Option<usize> {
    let close = delim.close().as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = from;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => {
                if (b == b'"' || b == b'\'') && delim != Delimiter::Comment {
                    quote = Some(b);
                } else if bytes[i..].starts_with(close) {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

/// Maps byte offsets to line/offset positions.
pub(crate) struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        LineIndex { starts }
    }

    pub(crate) fn pos(&self, byte: usize) -> Pos {
        let line = match self.starts.binary_search(&byte) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        Pos::new(line + 1, byte - self.starts[line])
    }
}
