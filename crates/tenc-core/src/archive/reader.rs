//! Archive reader: read-only random access to the streams of a sealed archive.

use super::StreamKind;
use super::format::{self, ArchiveManifest, HEADER_SIZE, ManifestEntry, TRAILER_SIZE};
use crate::TencError;
use crate::primitives::MAX_MANIFEST_SIZE;
use flate2::read::ZlibDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Take};
use std::path::{Path, PathBuf};

/// A sealed archive opened for extraction.
///
/// Only the manifest is held in memory. Every extracted stream opens its own
/// file handle, which is released when the stream is dropped.
#[derive(Debug, Clone)]
pub struct ArchiveReader {
    path: PathBuf,
    manifest: ArchiveManifest,
}

impl ArchiveReader {
    /// Open a sealed archive.
    ///
    /// # Errors
    /// - `TencError::Format` for wrong magic/version, a corrupt manifest or
    ///   stream bounds outside the data section
    /// - `TencError::State` if the archive was never sealed
    /// - `TencError::Io` if the file cannot be read
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TencError> {
        let path = path.as_ref();
        let label = path.display().to_string();
        tracing::debug!("Opening archive {} for reading", label);

        let mut file = File::open(path)?;
        let len = file.metadata()?.len();

        if len < HEADER_SIZE {
            return Err(TencError::format(&label, "Data too short for header"));
        }
        let mut header = [0u8; 5];
        file.read_exact(&mut header)?;
        format::validate_header(&header, &label)?;

        if len < HEADER_SIZE + TRAILER_SIZE {
            return Err(TencError::State(format!(
                "archive {} was never sealed",
                label
            )));
        }
        let mut trailer = [0u8; 12];
        file.seek(SeekFrom::End(-(TRAILER_SIZE as i64)))?;
        file.read_exact(&mut trailer)?;
        let manifest_len = format::parse_trailer(&trailer, &label)?;

        // Validate size BEFORE allocating the manifest buffer.
        if manifest_len > MAX_MANIFEST_SIZE || manifest_len > len - HEADER_SIZE - TRAILER_SIZE {
            return Err(TencError::format(
                &label,
                format!("Manifest size {} exceeds archive bounds", manifest_len),
            ));
        }
        let manifest_start = len - TRAILER_SIZE - manifest_len;
        let mut manifest_bytes = vec![0u8; manifest_len as usize];
        file.seek(SeekFrom::Start(manifest_start))?;
        file.read_exact(&mut manifest_bytes)?;
        let manifest = ArchiveManifest::from_bytes(&manifest_bytes)?;

        for entry in &manifest.entries {
            let end = entry.offset.checked_add(entry.compressed_len);
            if entry.offset < HEADER_SIZE || end.is_none_or(|e| e > manifest_start) {
                return Err(TencError::format(
                    &label,
                    format!("Stream {} lies outside the data section", entry.name),
                ));
            }
        }

        tracing::debug!(
            "Archive {} holds {} streams",
            manifest.base_name,
            manifest.entries.len()
        );
        Ok(Self {
            path: path.to_path_buf(),
            manifest,
        })
    }

    /// Path the archive was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base name recorded when the archive was created.
    #[must_use]
    pub fn base_name(&self) -> &str {
        &self.manifest.base_name
    }

    /// Prefix recorded when the archive was created.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.manifest.prefix.as_deref()
    }

    /// The archive manifest.
    #[must_use]
    pub fn manifest(&self) -> &ArchiveManifest {
        &self.manifest
    }

    /// Stream names in append order.
    pub fn stream_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.manifest.entries.iter().map(|e| e.name.as_str())
    }

    /// True if the archive holds a stream named `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.manifest.find(name).is_some()
    }

    /// Canonical name of one of the engine's streams in this archive.
    #[must_use]
    pub fn stream_name(&self, kind: StreamKind) -> String {
        kind.file_name(&self.manifest.base_name, self.prefix())
    }

    /// Open a stream for lazy, decompressing reads.
    ///
    /// Returns `TencError::NotFound` if the archive has no such stream.
    pub fn extract_stream(&self, name: &str) -> Result<ArchiveStream, TencError> {
        let entry = self.manifest.find(name).ok_or_else(|| TencError::NotFound {
            archive: self.path.display().to_string(),
            name: name.to_string(),
        })?;
        ArchiveStream::open(&self.path, entry)
    }

    /// Open one of the engine's streams.
    pub fn extract(&self, kind: StreamKind) -> Result<ArchiveStream, TencError> {
        self.extract_stream(&self.stream_name(kind))
    }

    /// Read a whole stream into memory.
    pub fn extract_bytes(&self, name: &str) -> Result<Vec<u8>, TencError> {
        let mut stream = self.extract_stream(name)?;
        let mut out = Vec::new();
        stream.read_to_end(&mut out).map_err(|e| stream.map_error(e))?;
        Ok(out)
    }
}

/// A decompressing reader over one archive stream.
///
/// Verifies at end-of-stream that exactly the recorded number of bytes was
/// produced; a mismatch surfaces as an `InvalidData` I/O error.
pub struct ArchiveStream {
    name: String,
    inner: BufReader<ZlibDecoder<Take<File>>>,
    expected: u64,
    seen: u64,
}

impl std::fmt::Debug for ArchiveStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveStream")
            .field("name", &self.name)
            .field("expected", &self.expected)
            .field("seen", &self.seen)
            .finish()
    }
}

impl ArchiveStream {
    fn open(path: &Path, entry: &ManifestEntry) -> Result<Self, TencError> {
        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(entry.offset))?;
        let decoder = ZlibDecoder::new(file.take(entry.compressed_len));
        Ok(Self {
            name: entry.name.clone(),
            inner: BufReader::new(decoder),
            expected: entry.raw_len,
            seen: 0,
        })
    }

    /// Name of the stream.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Convert an I/O error raised while reading this stream.
    ///
    /// Corrupt or truncated data becomes `TencError::Format` naming the
    /// stream; other failures stay `TencError::Io`.
    pub fn map_error(&self, err: io::Error) -> TencError {
        map_stream_error(&self.name, err)
    }
}

/// Classify an I/O error raised while reading the named stream.
pub(crate) fn map_stream_error(stream: &str, err: io::Error) -> TencError {
    match err.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput | io::ErrorKind::UnexpectedEof => {
            TencError::format(stream, err.to_string())
        }
        _ => TencError::Io(err),
    }
}

impl Read for ArchiveStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = {
            let available = self.fill_buf()?;
            let n = available.len().min(buf.len());
            buf[..n].copy_from_slice(&available[..n]);
            n
        };
        self.consume(n);
        Ok(n)
    }
}

impl BufRead for ArchiveStream {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        let buf = self.inner.fill_buf()?;
        if buf.is_empty() && self.seen != self.expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "stream ended after {} of {} bytes",
                    self.seen, self.expected
                ),
            ));
        }
        Ok(buf)
    }

    fn consume(&mut self, amt: usize) {
        self.seen += amt as u64;
        self.inner.consume(amt);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveWriter;
    use std::io::Write;

    fn sealed_archive(dir: &Path) -> PathBuf {
        let mut writer = ArchiveWriter::create(dir, "g", None).expect("create");
        writer.append_bytes("first", b"alpha\nbeta\n".to_vec()).expect("append");
        writer.append_bytes("empty", Vec::new()).expect("append");
        writer.append_bytes("second", vec![7u8; 10_000]).expect("append");
        writer.seal().expect("seal")
    }

    #[test]
    fn streams_roundtrip_byte_identical() {
        let dir = tempfile::tempdir().expect("tempdir");
        let reader = ArchiveReader::open(sealed_archive(dir.path())).expect("open");

        assert_eq!(reader.extract_bytes("first").expect("first"), b"alpha\nbeta\n");
        assert!(reader.extract_bytes("empty").expect("empty").is_empty());
        assert_eq!(reader.extract_bytes("second").expect("second"), vec![7u8; 10_000]);
        assert_eq!(
            reader.stream_names().collect::<Vec<_>>(),
            vec!["first", "empty", "second"]
        );
    }

    #[test]
    fn streams_read_line_by_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let reader = ArchiveReader::open(sealed_archive(dir.path())).expect("open");
        let lines: Vec<String> = reader
            .extract_stream("first")
            .expect("stream")
            .lines()
            .collect::<Result<_, _>>()
            .expect("lines");
        assert_eq!(lines, vec!["alpha", "beta"]);
    }

    #[test]
    fn missing_stream_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let reader = ArchiveReader::open(sealed_archive(dir.path())).expect("open");
        assert!(!reader.contains("nope"));
        assert!(matches!(
            reader.extract_stream("nope"),
            Err(TencError::NotFound { .. })
        ));
    }

    #[test]
    fn unsealed_file_is_state_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("partial.tz");
        let mut file = File::create(&path).expect("create");
        file.write_all(&format::header_bytes()).expect("header");
        file.write_all(b"some compressed bytes that never got a trailer")
            .expect("body");
        drop(file);

        assert!(matches!(
            ArchiveReader::open(&path),
            Err(TencError::State(_))
        ));
    }

    #[test]
    fn foreign_file_is_format_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("other.tz");
        std::fs::write(&path, b"PK\x03\x04 definitely not ours").expect("write");
        assert!(matches!(
            ArchiveReader::open(&path),
            Err(TencError::Format { .. })
        ));
    }

    #[test]
    fn corrupted_data_section_is_format_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = sealed_archive(dir.path());
        let reader = ArchiveReader::open(&path).expect("open");
        let entry = reader.manifest().find("second").expect("entry").clone();

        let mut bytes = std::fs::read(&path).expect("read");
        for b in &mut bytes[entry.offset as usize..(entry.offset + entry.compressed_len) as usize] {
            *b = 0xFF;
        }
        std::fs::write(&path, &bytes).expect("write");

        let reader = ArchiveReader::open(&path).expect("manifest still intact");
        assert!(matches!(
            reader.extract_bytes("second"),
            Err(TencError::Format { .. })
        ));
    }
}
