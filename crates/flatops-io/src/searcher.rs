//! Prefix search over a file whose lines are sorted ascending.
//!
//! `find` binary-searches byte offsets for the first line that is not ordered
//! before the prefix, then scans forward collecting the contiguous run of lines
//! that start with it. Lines are compared as raw bytes, which for UTF-8 is the
//! same as code-point order.
//!
//! Precondition: the input is sorted. `find` does not check this; an unsorted
//! input silently yields incomplete results. [`SortedFileSearcher::verify_sorted`]
//! is available as an explicit linear pass.
//!
//! The handle is owned by the searcher and released when it is dropped, so a
//! single searcher can serve many queries without reopening the file. It keeps
//! one seek cursor and is not meant to be shared between threads.

use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{Error, Result};

/// How a line relates to a search prefix in sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrefixOrder {
    /// The line starts with the prefix.
    Match,
    /// The line sorts strictly before the prefix.
    Before,
    /// The line sorts after the prefix and does not start with it.
    After,
}

fn classify(line: &[u8], prefix: &[u8]) -> PrefixOrder {
    if line.starts_with(prefix) {
        PrefixOrder::Match
    } else if line < prefix {
        PrefixOrder::Before
    } else {
        PrefixOrder::After
    }
}

fn strip_eol(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
}

pub struct SortedFileSearcher<R = File> {
    reader: BufReader<R>,
    len: u64,
    line: Vec<u8>,
}

impl SortedFileSearcher<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path)?;
        Self::new(f)
    }
}

impl<R: Read + Seek> SortedFileSearcher<R> {
    pub fn new(inner: R) -> Result<Self> {
        let mut reader = BufReader::new(inner);
        let len = reader.seek(SeekFrom::End(0))?;
        Ok(Self {
            reader,
            len,
            line: Vec::new(),
        })
    }

    /// Byte length of the input as of the last query.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All lines starting with `prefix`, in file order.
    pub fn find(&mut self, prefix: &str) -> Result<Vec<String>> {
        self.len = self.reader.seek(SeekFrom::End(0))?;
        let prefix = prefix.as_bytes();

        let first = self.lower_bound(prefix)?;

        let mut matches = Vec::new();
        let mut pos = first;
        while let Some(next) = self.read_line_at(pos)? {
            if classify(&self.line, prefix) != PrefixOrder::Match {
                break;
            }
            matches.push(String::from_utf8_lossy(&self.line).into_owned());
            pos = next;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(first, matches = matches.len(), "prefix search done");

        Ok(matches)
    }

    /// Check that every line sorts at or after its predecessor.
    pub fn verify_sorted(&mut self) -> Result<()> {
        self.len = self.reader.seek(SeekFrom::End(0))?;
        let mut prev: Option<Vec<u8>> = None;
        let mut pos = 0;
        let mut line_no = 0u64;
        while let Some(next) = self.read_line_at(pos)? {
            line_no += 1;
            if let Some(p) = &prev {
                if p.as_slice().cmp(self.line.as_slice()) == Ordering::Greater {
                    return Err(Error::Unsorted { line: line_no });
                }
            }
            prev = Some(std::mem::take(&mut self.line));
            pos = next;
        }
        Ok(())
    }

    /// Byte offset of the first line that does not sort before `prefix`
    /// (or `len` when there is none).
    ///
    /// Invariant: every line starting below `lo` sorts before the prefix, and
    /// the first line starting at or after `hi` does not (or is EOF).
    fn lower_bound(&mut self, prefix: &[u8]) -> Result<u64> {
        let mut lo = 0u64;
        let mut hi = self.len;

        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let start = self.line_start_at_or_after(mid)?;

            #[cfg(feature = "tracing")]
            tracing::debug!(lo, hi, mid, start, "probe");

            // Same line as the one `hi` already resolves to.
            if start >= hi {
                hi = mid;
                continue;
            }

            match self.read_line_at(start)? {
                None => hi = mid,
                Some(next) => match classify(&self.line, prefix) {
                    // Skip the whole rejected line, measured in bytes.
                    PrefixOrder::Before => lo = next.min(hi),
                    // A match may still have an earlier duplicate; keep narrowing left.
                    PrefixOrder::Match | PrefixOrder::After => hi = mid,
                },
            }
        }

        self.line_start_at_or_after(lo)
    }

    /// Start of the line beginning at `pos`, or of the next line if `pos`
    /// falls inside one.
    fn line_start_at_or_after(&mut self, pos: u64) -> Result<u64> {
        if pos == 0 {
            return Ok(0);
        }
        self.reader.seek(SeekFrom::Start(pos - 1))?;
        self.line.clear();
        let n = self.reader.read_until(b'\n', &mut self.line)?;
        Ok(pos - 1 + n as u64)
    }

    /// Read the line starting at `start` into `self.line` without its line
    /// terminator. Returns the offset of the following line, or `None` at EOF.
    fn read_line_at(&mut self, start: u64) -> Result<Option<u64>> {
        if start >= self.len {
            return Ok(None);
        }
        self.reader.seek(SeekFrom::Start(start))?;
        self.line.clear();
        let n = self.reader.read_until(b'\n', &mut self.line)?;
        if n == 0 {
            return Ok(None);
        }
        strip_eol(&mut self.line);
        Ok(Some(start + n as u64))
    }
}
