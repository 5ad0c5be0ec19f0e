//! Windowed reader for a pooler log file.
//!
//! Unlike a follow-mode tailer, every call recomputes the window from the
//! end of the file: the last `height` lines are located by scanning
//! backward for newline bytes, then read forward to EOF.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Size of the backward scan buffer.
const SCAN_CHUNK: u64 = 4096;

/// An open log file plus the offset computed by the last `tail()`.
pub struct LogCursor {
    path: PathBuf,
    file: File,
    offset: u64,
}

impl LogCursor {
    /// Opens the log file for windowed reading.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = File::open(&path)?;
        Ok(Self {
            path,
            file,
            offset: 0,
        })
    }

    /// Returns the last `height` lines of the file, oldest first.
    pub fn tail(&mut self, height: usize) -> io::Result<Vec<String>> {
        if height == 0 {
            return Ok(Vec::new());
        }

        self.offset = window_start(&mut self.file, height)?;
        self.file.seek(SeekFrom::Start(self.offset))?;

        let reader = BufReader::new(&mut self.file);
        let mut lines = Vec::with_capacity(height);
        for line in reader.split(b'\n') {
            let line = line?;
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        Ok(lines)
    }

    /// Byte offset where the last computed window starts.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Finds the byte offset at which the last `height` lines begin.
///
/// The newline terminating the final line does not count, so a file that
/// ends in `\n` and one that does not give the same window.
fn window_start<R: Read + Seek>(reader: &mut R, height: usize) -> io::Result<u64> {
    let length = reader.seek(SeekFrom::End(0))?;
    if length == 0 {
        return Ok(0);
    }

    // Skip the terminating newline of the last line.
    let mut end = length;
    let mut last = [0u8; 1];
    reader.seek(SeekFrom::Start(length - 1))?;
    reader.read_exact(&mut last)?;
    if last[0] == b'\n' {
        end -= 1;
    }

    let mut newlines = 0usize;
    let mut buf = vec![0u8; SCAN_CHUNK as usize];
    while end > 0 {
        let start = end.saturating_sub(SCAN_CHUNK);
        let chunk = &mut buf[..(end - start) as usize];
        reader.seek(SeekFrom::Start(start))?;
        reader.read_exact(chunk)?;

        for (i, byte) in chunk.iter().enumerate().rev() {
            if *byte == b'\n' {
                newlines += 1;
                if newlines == height {
                    return Ok(start + i as u64 + 1);
                }
            }
        }
        end = start;
    }

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn numbered(n: usize) -> String {
        (1..=n).map(|i| format!("line {}\n", i)).collect()
    }

    #[test]
    fn test_tail_returns_last_lines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pgbouncer.log");
        std::fs::write(&path, numbered(50)).unwrap();

        let mut cursor = LogCursor::open(&path).unwrap();
        let lines = cursor.tail(3).unwrap();
        assert_eq!(lines, vec!["line 48", "line 49", "line 50"]);

        let direct: Vec<String> = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .rev()
            .take(3)
            .map(String::from)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        assert_eq!(lines, direct);
    }

    #[test]
    fn test_tail_short_file_returns_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pgbouncer.log");
        std::fs::write(&path, numbered(2)).unwrap();

        let mut cursor = LogCursor::open(&path).unwrap();
        assert_eq!(cursor.tail(10).unwrap(), vec!["line 1", "line 2"]);
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn test_tail_without_trailing_newline() {
        let mut data = Cursor::new(b"a\nb\nc".to_vec());
        assert_eq!(window_start(&mut data, 2).unwrap(), 2);
    }

    #[test]
    fn test_tail_spans_scan_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.log");
        let long = "x".repeat(3000);
        let content: String = (0..20).map(|i| format!("{} {}\n", i, long)).collect();
        std::fs::write(&path, &content).unwrap();

        let mut cursor = LogCursor::open(&path).unwrap();
        let lines = cursor.tail(4).unwrap();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("16 "));
        assert!(lines[3].starts_with("19 "));
    }

    #[test]
    fn test_tail_recomputes_after_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pgbouncer.log");
        std::fs::write(&path, numbered(5)).unwrap();

        let mut cursor = LogCursor::open(&path).unwrap();
        assert_eq!(cursor.tail(2).unwrap(), vec!["line 4", "line 5"]);

        let mut f = std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap();
        writeln!(f, "line 6").unwrap();
        drop(f);

        assert_eq!(cursor.tail(2).unwrap(), vec!["line 5", "line 6"]);
    }

    #[test]
    fn test_tail_empty_file_and_zero_height() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.log");
        std::fs::write(&path, "").unwrap();

        let mut cursor = LogCursor::open(&path).unwrap();
        assert!(cursor.tail(5).unwrap().is_empty());
        assert!(cursor.tail(0).unwrap().is_empty());
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(LogCursor::open(dir.path().join("absent.log")).is_err());
    }
}
