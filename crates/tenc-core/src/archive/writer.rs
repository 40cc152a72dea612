//! Archive writer: collects streams, then seals them into one file.

use super::format::{self, ArchiveManifest, HEADER_SIZE, ManifestEntry};
use super::{StreamKind, archive_file_name};
use crate::TencError;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Content registered for a stream, compressed only when the archive is sealed.
#[derive(Debug)]
enum StreamSource {
    /// Small streams kept in memory (shape header).
    Buffer(Vec<u8>),
    /// Streams spooled to a temporary file during ingestion.
    Spooled(NamedTempFile),
}

/// Builder for an archive.
///
/// Streams are only registered by `append_*`; `seal()` compresses all of
/// them into a temporary file next to the destination and moves it into
/// place in one step. Once sealed (or after a failed seal) the writer
/// accepts no further calls. Temporary files of an unsealed writer are
/// removed when it is dropped.
#[derive(Debug)]
pub struct ArchiveWriter {
    dir: PathBuf,
    base_name: String,
    prefix: Option<String>,
    pending: Vec<(String, StreamSource)>,
    sealed: bool,
}

impl ArchiveWriter {
    /// Open a new archive for appending.
    ///
    /// The archive is written to `dir/[prefix-]base_name.tz` on `seal()`.
    pub fn create(
        dir: impl AsRef<Path>,
        base_name: &str,
        prefix: Option<&str>,
    ) -> Result<Self, TencError> {
        validate_name_part("base name", base_name)?;
        if let Some(p) = prefix {
            validate_name_part("prefix", p)?;
        }
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(TencError::InvalidInput(format!(
                "output directory '{}' does not exist",
                dir.display()
            )));
        }

        tracing::debug!("Opening archive {} for writing", base_name);
        Ok(Self {
            dir: dir.to_path_buf(),
            base_name: base_name.to_string(),
            prefix: prefix.map(str::to_string),
            pending: Vec::new(),
            sealed: false,
        })
    }

    /// Base name of the archive.
    #[must_use]
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Canonical name of one of the engine's streams in this archive.
    #[must_use]
    pub fn stream_name(&self, kind: StreamKind) -> String {
        kind.file_name(&self.base_name, self.prefix.as_deref())
    }

    /// Destination path of the sealed archive.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir
            .join(archive_file_name(&self.base_name, self.prefix.as_deref()))
    }

    /// Directory the archive is written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Register an in-memory stream.
    pub fn append_bytes(
        &mut self,
        name: impl Into<String>,
        content: Vec<u8>,
    ) -> Result<(), TencError> {
        self.append(name.into(), StreamSource::Buffer(content))
    }

    /// Register a spooled temporary file. The file is read from its start.
    pub fn append_file(
        &mut self,
        name: impl Into<String>,
        file: NamedTempFile,
    ) -> Result<(), TencError> {
        self.append(name.into(), StreamSource::Spooled(file))
    }

    fn append(&mut self, name: String, source: StreamSource) -> Result<(), TencError> {
        if self.sealed {
            return Err(TencError::State(format!(
                "cannot append {} to sealed archive {}",
                name, self.base_name
            )));
        }
        if self.pending.iter().any(|(n, _)| *n == name) {
            return Err(TencError::State(format!(
                "stream {} already added to archive {}",
                name, self.base_name
            )));
        }
        tracing::debug!("Adding {} to archive {}", name, self.base_name);
        self.pending.push((name, source));
        Ok(())
    }

    /// Compress every registered stream and write the archive.
    ///
    /// Returns the path of the sealed archive. A second call fails with
    /// `TencError::State`, as does any call after a failed seal: a
    /// partially written archive is discarded, never resumed.
    pub fn seal(&mut self) -> Result<PathBuf, TencError> {
        if self.sealed {
            return Err(TencError::State(format!(
                "archive {} is already sealed",
                self.base_name
            )));
        }
        self.sealed = true;

        let path = self.path();
        let mut tmp = tempfile::Builder::new()
            .prefix(".tenc-")
            .suffix(".partial")
            .tempfile_in(&self.dir)?;

        let mut entries = Vec::with_capacity(self.pending.len());
        {
            let mut out = BufWriter::new(tmp.as_file_mut());
            out.write_all(&format::header_bytes())?;
            let mut offset = HEADER_SIZE;

            for (name, source) in self.pending.drain(..) {
                let (compressed_len, raw_len) = match source {
                    StreamSource::Buffer(bytes) => compress_into(&mut out, &mut bytes.as_slice())?,
                    StreamSource::Spooled(mut file) => {
                        let handle = file.as_file_mut();
                        handle.seek(SeekFrom::Start(0))?;
                        compress_into(&mut out, &mut BufReader::new(handle))?
                    }
                };
                entries.push(ManifestEntry {
                    name,
                    offset,
                    compressed_len,
                    raw_len,
                });
                offset += compressed_len;
            }

            let manifest = ArchiveManifest {
                base_name: self.base_name.clone(),
                prefix: self.prefix.clone(),
                entries,
            };
            let manifest_bytes = manifest.to_bytes()?;
            out.write_all(&manifest_bytes)?;
            out.write_all(&format::trailer_bytes(manifest_bytes.len() as u64))?;
            out.flush()?;
        }

        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| TencError::Io(e.error))?;

        tracing::debug!("Sealed archive {}", path.display());
        Ok(path)
    }

    /// True once `seal()` was called.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}

/// Stream `input` through a zlib encoder into `out`.
///
/// Returns `(compressed_len, raw_len)`.
fn compress_into<W: Write, R: Read>(out: &mut W, input: &mut R) -> Result<(u64, u64), TencError> {
    let mut encoder = ZlibEncoder::new(CountingWriter::new(out), Compression::default());
    let raw_len = io::copy(input, &mut encoder)?;
    let counter = encoder.finish()?;
    Ok((counter.written, raw_len))
}

/// Pass-through writer that counts bytes.
struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn validate_name_part(what: &str, value: &str) -> Result<(), TencError> {
    if value.is_empty() || value.contains(['/', '\\', '\n']) {
        return Err(TencError::InvalidInput(format!(
            "invalid archive {}: {:?}",
            what, value
        )));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
