//! Line-oriented reads over log files.

use std::path::Path;
use tokio::fs::File;
use tokio::io::{self, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use wog_types::{EntryStats, Page};

const CHUNK_SIZE: usize = 64 * 1024;

/// Byte size and line count of a file.
///
/// Lines are newline-terminated segments; a trailing segment without a
/// newline counts as a line too.
pub async fn file_stats(path: impl AsRef<Path>) -> io::Result<EntryStats> {
    let mut file = File::open(path).await?;
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut size = 0u64;
    let mut lines = 0u64;
    let mut last = None;

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        size += n as u64;
        lines += count_newlines(&buf[..n]);
        last = Some(buf[n - 1]);
    }
    if matches!(last, Some(byte) if byte != b'\n') {
        lines += 1;
    }
    Ok(EntryStats { size, lines })
}

fn count_newlines(bytes: &[u8]) -> u64 {
    bytes.iter().filter(|&&b| b == b'\n').count() as u64
}

/// Copy one page of whole lines, or the entire file for [`Page::All`].
///
/// Bytes are copied unchanged, so the pages of a file concatenate to its
/// full content. Pages past the end write nothing. Returns the number of
/// bytes written.
pub async fn copy_page<W>(
    path: impl AsRef<Path>,
    page: Page,
    page_size: u64,
    destination: &mut W,
) -> io::Result<u64>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut reader = BufReader::new(File::open(path).await?);

    let Some((start, end)) = page.line_range(page_size) else {
        let copied = io::copy(&mut reader, destination).await?;
        destination.flush().await?;
        return Ok(copied);
    };

    let mut line = Vec::new();
    let mut index = 0u64;
    let mut written = 0u64;
    while index < end {
        line.clear();
        let n = reader.read_until(b'\n', &mut line).await?;
        if n == 0 {
            break;
        }
        if index >= start {
            destination.write_all(&line).await?;
            written += n as u64;
        }
        index += 1;
    }
    destination.flush().await?;
    Ok(written)
}

/// [`copy_page`] into memory.
pub async fn read_page(path: impl AsRef<Path>, page: Page, page_size: u64) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    copy_page(path, page, page_size, &mut out).await?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn log_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn page(n: i64) -> Page {
        Page::from_raw(n).unwrap()
    }

    #[tokio::test]
    async fn stats_count_terminated_and_trailing_lines() {
        let terminated = log_file("one\ntwo\n");
        assert_eq!(
            file_stats(terminated.path()).await.unwrap(),
            EntryStats { size: 8, lines: 2 }
        );

        let trailing = log_file("one\ntwo\nthree");
        assert_eq!(file_stats(trailing.path()).await.unwrap().lines, 3);

        let empty = log_file("");
        assert_eq!(
            file_stats(empty.path()).await.unwrap(),
            EntryStats { size: 0, lines: 0 }
        );
    }

    #[tokio::test]
    async fn stats_of_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = file_stats(dir.path().join("gone.log")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn pages_select_whole_lines() {
        let file = log_file("a\nb\nc\nd\ne");
        assert_eq!(read_page(file.path(), page(1), 2).await.unwrap(), b"a\nb\n");
        assert_eq!(read_page(file.path(), page(2), 2).await.unwrap(), b"c\nd\n");
        assert_eq!(read_page(file.path(), page(3), 2).await.unwrap(), b"e");
        assert!(read_page(file.path(), page(4), 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn all_pages_concatenate_to_full_content() {
        let contents = "first line\n\nthird line with \r\n crlf\nlast line without newline";
        let file = log_file(contents);
        let full = read_page(file.path(), Page::All, 3).await.unwrap();
        assert_eq!(full, contents.as_bytes());

        for page_size in 1..=5 {
            let mut joined = Vec::new();
            let mut n = 1;
            loop {
                let chunk = read_page(file.path(), page(n), page_size).await.unwrap();
                if chunk.is_empty() {
                    break;
                }
                joined.extend(chunk);
                n += 1;
            }
            assert_eq!(joined, full, "page size {page_size}");
        }
    }

    #[tokio::test]
    async fn copy_page_reports_bytes_written() {
        let file = log_file("12\n345\n");
        let mut out = Vec::new();
        let written = copy_page(file.path(), page(2), 1, &mut out).await.unwrap();
        assert_eq!(written, 4);
        assert_eq!(out, b"345\n");
    }
}
