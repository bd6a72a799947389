//! Line-oriented and delimiter-separated text readers.
//!
//! These sit beside the record codec rather than on top of it: list files store opaque
//! byte records, but the tooling around them frequently ingests plain text or CSV, and
//! these readers cover that without another dependency.

use std::fs::File;
use std::io::{BufRead, BufReader, Result as IoResult};
use std::path::Path;


/// Breaks a stream into lines ending with `\n` or `\r\n`.
///
/// Empty lines are returned like any other. The final line is returned whether or not it
/// is newline-terminated.
#[derive(Debug)]
pub struct LineReader<R> {
    source:   R,
    line_num: u64,
}

impl LineReader<BufReader<File>> {
    /// Open a buffered line reader over the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> IoResult<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> LineReader<R> {
    #[must_use]
    pub fn new(source: R) -> Self {
        Self {
            source,
            line_num: 0,
        }
    }

    /// The number of lines returned so far; after a successful [`next_line`], the
    /// one-based number of that line.
    ///
    /// [`next_line`]: LineReader::next_line
    #[inline]
    #[must_use]
    pub fn line_num(&self) -> u64 {
        self.line_num
    }

    /// Overwrite `line` with the next line, without its line ending. Returns `false` at
    /// end of stream.
    ///
    /// Lines must be valid UTF-8; a line that is not produces an
    /// [`ErrorKind::InvalidData`] error.
    ///
    /// [`ErrorKind::InvalidData`]: std::io::ErrorKind::InvalidData
    pub fn next_line(&mut self, line: &mut String) -> IoResult<bool> {
        line.clear();

        if self.source.read_line(line)? == 0 {
            return Ok(false);
        }

        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }

        self.line_num += 1;
        Ok(true)
    }
}


/// Reads delimiter-separated rows, handing each row's fields to a callback.
///
/// Built on [`LineReader`]; no quoting or escaping is interpreted, matching the simple
/// split most machine-written tables need.
#[derive(Debug)]
pub struct CsvReader<R> {
    reader:         LineReader<R>,
    delimiter:      char,
    skip_hash_mark: bool,
}

impl CsvReader<BufReader<File>> {
    /// Open a comma-delimited reader over the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> IoResult<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> CsvReader<R> {
    #[must_use]
    pub fn new(source: R) -> Self {
        Self {
            reader:         LineReader::new(source),
            delimiter:      ',',
            skip_hash_mark: false,
        }
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Skip lines starting with `#`.
    ///
    /// Applies to [`skip_header`] too, so enable this first if hash-marked lines may
    /// precede the header.
    ///
    /// [`skip_header`]: CsvReader::skip_header
    pub fn set_skip_hash_mark(&mut self) {
        self.skip_hash_mark = true;
    }

    /// Discard the next `rows` rows.
    pub fn skip_header(&mut self, rows: u32) -> IoResult<()> {
        let mut line = String::new();
        for _ in 0..rows {
            while self.reader.next_line(&mut line)? {
                if !self.skipped(&line) {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Feed every remaining row to `row_cb` as a slice of its fields.
    pub fn run(&mut self, mut row_cb: impl FnMut(&[&str])) -> IoResult<()> {
        let mut line = String::new();

        while self.reader.next_line(&mut line)? {
            if self.skipped(&line) {
                continue;
            }

            let fields: Vec<&str> = line.split(self.delimiter).collect();
            row_cb(&fields);
        }

        Ok(())
    }

    fn skipped(&self, line: &str) -> bool {
        self.skip_hash_mark && line.starts_with('#')
    }
}


#[cfg(test)]
mod tests {
    use super::*;


    #[test]
    fn lines_with_mixed_endings() {
        let text = b"first\nsecond\r\n\nlast without newline";
        let mut reader = LineReader::new(&text[..]);
        let mut line = String::new();

        for expected in ["first", "second", "", "last without newline"] {
            assert!(reader.next_line(&mut line).unwrap());
            assert_eq!(line, expected);
        }
        assert!(!reader.next_line(&mut line).unwrap());
        assert_eq!(reader.line_num(), 4);
    }

    #[test]
    fn csv_rows_and_comments() {
        let text = b"# generated\nname,count\nfoo,1\nbar,2\n";
        let mut reader = CsvReader::new(&text[..]);
        reader.set_skip_hash_mark();
        reader.skip_header(1).unwrap();

        let mut rows: Vec<Vec<String>> = Vec::new();
        reader.run(|fields| {
            rows.push(fields.iter().map(|&field| field.to_owned()).collect());
        }).unwrap();

        assert_eq!(rows, [["foo", "1"], ["bar", "2"]]);
    }

    #[test]
    fn csv_custom_delimiter() {
        let text = b"a|b|c\n||\n";
        let mut reader = CsvReader::new(&text[..]).with_delimiter('|');

        let mut rows: Vec<usize> = Vec::new();
        reader.run(|fields| rows.push(fields.len())).unwrap();

        assert_eq!(rows, [3, 3]);
    }
}
