//! Bracket-depth check over the raw file, run before lopdf parses it.
//!
//! lopdf reads arrays and dictionaries recursively and only bounds the
//! nesting of literal strings, so a short run of `[` is enough to exhaust the
//! stack. The scan here tokenizes just enough of the syntax (comments,
//! strings, names, stream data) to count nesting the way the object parser
//! will see it.

use super::error::{Error, Result};
use flate2::read::ZlibDecoder;
use std::io::Read;
use tracing::debug;

/// Deepest array or dictionary nesting accepted anywhere in a document.
pub const MAX_NESTING_DEPTH: usize = 100;

/// Fails with `MalformedStructure` if any object nests arrays or
/// dictionaries deeper than [`MAX_NESTING_DEPTH`].
pub(crate) fn check(data: &[u8]) -> Result<()> {
    Scanner::new(data, Mode::File).run()
}

pub(crate) fn too_deep() -> Error {
    Error::malformed(format!(
        "objects nested deeper than {} levels",
        MAX_NESTING_DEPTH
    ))
}

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    /// Top level of the file.
    File,
    /// Decoded body of an object stream.
    ObjectStream,
    /// Raw stream data. Only what follows an `obj` keyword is read as
    /// syntax, since a cross-reference offset may point into it.
    StreamData,
}

struct Scanner<'a> {
    data: &'a [u8],
    pos: usize,
    depth: usize,
    mode: Mode,
    lexing: bool,
    /// End of the most recent `obj` keyword.
    object_start: usize,
}

impl<'a> Scanner<'a> {
    fn new(data: &'a [u8], mode: Mode) -> Self {
        Scanner {
            data,
            pos: 0,
            depth: 0,
            mode,
            lexing: mode != Mode::StreamData,
            object_start: 0,
        }
    }

    fn run(mut self) -> Result<()> {
        while let Some(&byte) = self.data.get(self.pos) {
            if !self.lexing {
                if is_regular(byte) {
                    self.keyword()?;
                } else {
                    self.pos += 1;
                }
                continue;
            }
            match byte {
                b'%' => self.skip_while(|b| b != b'\r' && b != b'\n'),
                b'(' => self.skip_literal_string(),
                b'/' => {
                    self.pos += 1;
                    self.skip_while(is_regular);
                }
                b'[' => self.open(1)?,
                b']' => self.close(1),
                b'<' if self.peek(1) == Some(b'<') => self.open(2)?,
                b'<' => {
                    self.skip_while(|b| b != b'>');
                    self.pos += 1;
                }
                b'>' if self.peek(1) == Some(b'>') => self.close(2),
                b if is_regular(b) => self.keyword()?,
                _ => self.pos += 1,
            }
        }
        Ok(())
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.data.get(self.pos + ahead).copied()
    }

    fn skip_while(&mut self, keep: impl Fn(u8) -> bool) {
        while self.data.get(self.pos).is_some_and(|&b| keep(b)) {
            self.pos += 1;
        }
    }

    fn open(&mut self, width: usize) -> Result<()> {
        self.pos += width;
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(too_deep());
        }
        Ok(())
    }

    fn close(&mut self, width: usize) {
        self.pos += width;
        self.depth = self.depth.saturating_sub(1);
    }

    fn skip_literal_string(&mut self) {
        self.pos += 1;
        let mut open = 1usize;
        while let Some(&b) = self.data.get(self.pos) {
            self.pos += 1;
            match b {
                b'\\' => self.pos += 1,
                b'(' => open += 1,
                b')' => {
                    open -= 1;
                    if open == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    fn keyword(&mut self) -> Result<()> {
        let start = self.pos;
        self.skip_while(is_regular);
        match &self.data[start..self.pos] {
            b"obj" => {
                self.depth = 0;
                self.lexing = true;
                self.object_start = self.pos;
            }
            b"endobj" => {
                self.depth = 0;
                self.lexing = self.mode != Mode::StreamData;
            }
            b"stream" if self.mode == Mode::File => self.skip_stream(start)?,
            _ => {}
        }
        Ok(())
    }

    /// Steps over the data of the stream whose `stream` keyword starts at
    /// `keyword_start`, checking it in the mode its contents call for.
    fn skip_stream(&mut self, keyword_start: usize) -> Result<()> {
        let dict = &self.data[self.object_start.min(keyword_start)..keyword_start];
        let mut start = self.pos;
        if self.data.get(start) == Some(&b'\r') {
            start += 1;
        }
        if self.data.get(start) == Some(&b'\n') {
            start += 1;
        }

        let end = declared_length(dict)
            .and_then(|length| start.checked_add(length))
            .filter(|&end| {
                self.data
                    .get(end..)
                    .map(|rest| trim_start(rest).starts_with(b"endstream"))
                    .unwrap_or(false)
            })
            .or_else(|| find(&self.data[start..], b"endstream").map(|at| start + at))
            .unwrap_or(self.data.len());
        let content = &self.data[start..end];

        if find(dict, b"/ObjStm").is_some() {
            let decoded = decode_object_stream(dict, content)?;
            Scanner::new(&decoded, Mode::ObjectStream).run()?;
        } else {
            Scanner::new(content, Mode::StreamData).run()?;
        }

        self.pos = end;
        self.skip_while(is_whitespace);
        if self.data[self.pos..].starts_with(b"endstream") {
            self.pos += b"endstream".len();
        }
        Ok(())
    }
}

fn decode_object_stream(dict: &[u8], content: &[u8]) -> Result<Vec<u8>> {
    if find(dict, b"/Filter").is_none() {
        return Ok(content.to_vec());
    }
    if find(dict, b"/FlateDecode").is_none() {
        return Err(Error::unsupported(
            "object stream filter other than FlateDecode",
        ));
    }
    let mut decoded = Vec::new();
    // Whatever inflates before the damage is what lopdf will parse too.
    if let Err(e) = ZlibDecoder::new(content).read_to_end(&mut decoded) {
        debug!(error = %e, "object stream inflates only partially");
    }
    Ok(decoded)
}

/// A direct `/Length N` in the raw dictionary text. Indirect lengths are
/// left to the `endstream` search.
fn declared_length(dict: &[u8]) -> Option<usize> {
    let at = find(dict, b"/Length")?;
    let rest = trim_start(&dict[at + b"/Length".len()..]);
    let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    let after = trim_start(&rest[digits..]);
    let indirect = after.first().is_some_and(u8::is_ascii_digit);
    if digits == 0 || indirect {
        return None;
    }
    std::str::from_utf8(&rest[..digits]).ok()?.parse().ok()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn trim_start(data: &[u8]) -> &[u8] {
    let skip = data.iter().take_while(|&&b| is_whitespace(b)).count();
    &data[skip..]
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\0' | b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

fn is_regular(b: u8) -> bool {
    !is_whitespace(b) && !b"()<>[]{}/%".contains(&b)
}
