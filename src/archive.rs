//! Archive entry sources
//!
//! The pipeline reads documents through [`EntrySource`]: entry names in a
//! stable order and a way to read one entry's bytes by position. [`Archive`]
//! buffers a zip or gzip-compressed tar in memory, keeping regular files in
//! archive order. Repeated names are kept as separate entries.

use crate::error::{IngestError, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";
const ZIP_EMPTY_MAGIC: &[u8; 4] = b"PK\x05\x06";

/// Ordered, named byte streams
pub trait EntrySource {
    /// Entry names in a stable order; names may repeat
    fn entry_names(&self) -> Vec<String>;

    /// Read all bytes of the entry at `index` in [`entry_names`](Self::entry_names) order
    fn read_entry(&mut self, index: usize) -> Result<Vec<u8>>;
}

/// Single file held by an [`Archive`]
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    data: Option<Vec<u8>>,
}

/// An archive fully loaded into memory.
///
/// Each entry's bytes are handed out once; a second read of the same
/// position is an error.
#[derive(Debug, Clone, Default)]
pub struct Archive {
    entries: Vec<ArchiveEntry>,
}

impl Archive {
    /// Open a zip or `.tar.gz` file from disk, chosen by its leading bytes
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let with_path = |e: IngestError| match e {
            IngestError::Archive { message } => IngestError::Archive {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        };
        let io_error = |e: std::io::Error| IngestError::Archive {
            message: format!("{}: {}", path.display(), e),
        };

        let mut file = File::open(path).map_err(io_error)?;
        let mut magic = Vec::with_capacity(4);
        (&mut file).take(4).read_to_end(&mut magic).map_err(io_error)?;
        file.seek(SeekFrom::Start(0)).map_err(io_error)?;

        if magic == ZIP_MAGIC || magic == ZIP_EMPTY_MAGIC {
            Self::from_zip(BufReader::new(file)).map_err(with_path)
        } else {
            Self::from_tar_gz(BufReader::new(file)).map_err(with_path)
        }
    }

    /// Read a gzip-compressed tar stream
    pub fn from_tar_gz<R: Read>(reader: R) -> Result<Self> {
        let mut archive = tar::Archive::new(GzDecoder::new(reader));
        let mut entries = Vec::new();

        for entry in archive.entries().map_err(not_a_tar_gz)? {
            let mut entry = entry.map_err(not_a_tar_gz)?;
            if !entry.header().entry_type().is_file() {
                continue;
            }

            let name = entry
                .path()
                .map_err(not_a_tar_gz)?
                .to_string_lossy()
                .to_string();
            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .map_err(|e| IngestError::Archive {
                    message: format!("failed to read entry {}: {}", name, e),
                })?;
            entries.push(ArchiveEntry::new(name, data));
        }

        Ok(Archive { entries })
    }

    /// Read a zip archive, in central directory order
    pub fn from_zip<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(reader).map_err(|e| IngestError::Archive {
            message: format!("not a valid zip archive: {}", e),
        })?;
        let mut entries = Vec::with_capacity(archive.len());

        for idx in 0..archive.len() {
            let mut file = archive.by_index(idx).map_err(|e| IngestError::Archive {
                message: format!("failed to open zip entry #{}: {}", idx, e),
            })?;
            if file.is_dir() {
                continue;
            }

            let name = file.name().to_string();
            let mut data = Vec::new();
            file.read_to_end(&mut data)
                .map_err(|e| IngestError::Archive {
                    message: format!("failed to read entry {}: {}", name, e),
                })?;
            entries.push(ArchiveEntry::new(name, data));
        }

        Ok(Archive { entries })
    }

    /// Build an archive from in-memory entries, keeping their order
    pub fn from_entries<I, N, D>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: Into<Vec<u8>>,
    {
        Archive {
            entries: entries
                .into_iter()
                .map(|(name, data)| ArchiveEntry::new(name, data))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ArchiveEntry {
    fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        ArchiveEntry {
            name: name.into(),
            data: Some(data.into()),
        }
    }
}

impl EntrySource for Archive {
    fn entry_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    fn read_entry(&mut self, index: usize) -> Result<Vec<u8>> {
        let entry = self.entries.get_mut(index).ok_or_else(|| IngestError::Archive {
            message: format!("no entry at position {}", index),
        })?;
        entry.data.take().ok_or_else(|| IngestError::Archive {
            message: format!("entry {} (#{}) was already read", entry.name, index),
        })
    }
}

fn not_a_tar_gz(e: std::io::Error) -> IngestError {
    IngestError::Archive {
        message: format!("not a valid tar.gz archive: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn zip_bytes(files: &[(&str, Option<&str>)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in files {
            match body {
                Some(body) => {
                    writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                    writer.write_all(body.as_bytes()).unwrap();
                }
                None => writer.add_directory(*name, SimpleFileOptions::default()).unwrap(),
            }
        }
        writer.finish().unwrap().into_inner()
    }

    fn tar_gz(files: &[(&str, &[u8])]) -> Vec<u8> {
        let gz = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(gz);
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn test_reads_entries_in_archive_order() {
        let bytes = tar_gz(&[("b.json", b"{}"), ("a.json", b"[]")]);
        let mut archive = Archive::from_tar_gz(bytes.as_slice()).unwrap();

        assert_eq!(archive.entry_names(), vec!["b.json", "a.json"]);
        assert_eq!(archive.read_entry(1).unwrap(), b"[]".to_vec());
    }

    #[test]
    fn test_repeated_names_stay_separate_entries() {
        let bytes = tar_gz(&[
            ("a.json", br#"{"orders":[{"id":1}]}"#),
            ("a.json", br#"{"orders":[{"id":2}]}"#),
        ]);
        let mut archive = Archive::from_tar_gz(bytes.as_slice()).unwrap();

        assert_eq!(archive.entry_names(), vec!["a.json", "a.json"]);
        assert_eq!(archive.read_entry(0).unwrap(), br#"{"orders":[{"id":1}]}"#.to_vec());
        assert_eq!(archive.read_entry(1).unwrap(), br#"{"orders":[{"id":2}]}"#.to_vec());
    }

    #[test]
    fn test_entry_bytes_are_handed_out_once() {
        let mut archive = Archive::from_entries([("one.json", "{}")]);

        assert_eq!(archive.read_entry(0).unwrap(), b"{}".to_vec());
        let err = archive.read_entry(0).unwrap_err();
        assert!(err.to_string().contains("already read"));
    }

    #[test]
    fn test_reads_zip_entries_in_order() {
        let bytes = zip_bytes(&[("data/", None), ("b.json", Some("{}")), ("a.json", Some("[]"))]);
        let mut archive = Archive::from_zip(Cursor::new(bytes)).unwrap();

        assert_eq!(archive.entry_names(), vec!["b.json", "a.json"]);
        assert_eq!(archive.read_entry(0).unwrap(), b"{}".to_vec());
        assert_eq!(archive.read_entry(1).unwrap(), b"[]".to_vec());
    }

    #[test]
    fn test_open_picks_format_from_magic_bytes() {
        let dir = tempfile::TempDir::new().unwrap();
        // Extensions are deliberately swapped
        let zip_path = dir.path().join("orders.tar.gz");
        std::fs::write(&zip_path, zip_bytes(&[("z.json", Some("{}"))])).unwrap();
        let tar_path = dir.path().join("orders.zip");
        std::fs::write(&tar_path, tar_gz(&[("t.json", b"{}")])).unwrap();

        assert_eq!(Archive::open(&zip_path).unwrap().entry_names(), vec!["z.json"]);
        assert_eq!(Archive::open(&tar_path).unwrap().entry_names(), vec!["t.json"]);
    }

    #[test]
    fn test_truncated_zip_is_archive_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("orders.zip");
        std::fs::write(&path, b"PK\x03\x04 not really a zip").unwrap();

        let err = Archive::open(&path).unwrap_err();
        assert!(matches!(err, IngestError::Archive { .. }));
    }

    #[test]
    fn test_skips_directories() {
        let gz = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(gz);
        let mut dir = tar::Header::new_gnu();
        dir.set_entry_type(tar::EntryType::Directory);
        dir.set_size(0);
        dir.set_mode(0o755);
        dir.set_cksum();
        builder.append_data(&mut dir, "data/", std::io::empty()).unwrap();
        let mut file = tar::Header::new_gnu();
        file.set_size(2);
        file.set_mode(0o644);
        file.set_cksum();
        builder.append_data(&mut file, "data/x.json", &b"{}"[..]).unwrap();
        let bytes = builder.into_inner().unwrap().finish().unwrap();

        let archive = Archive::from_tar_gz(bytes.as_slice()).unwrap();
        assert_eq!(archive.entry_names(), vec!["data/x.json"]);
    }

    #[test]
    fn test_rejects_non_archive_input() {
        let err = Archive::from_tar_gz(&b"definitely not gzip"[..]).unwrap_err();
        assert!(matches!(err, IngestError::Archive { .. }));
    }

    #[test]
    fn test_missing_file_is_archive_error() {
        let err = Archive::open("/nonexistent/orders.tar.gz").unwrap_err();
        assert!(err.to_string().contains("orders.tar.gz"));
    }

    #[test]
    fn test_unknown_entry_position() {
        let mut archive = Archive::from_entries([("one.json", "{}")]);
        assert!(archive.read_entry(1).is_err());
        assert_eq!(archive.len(), 1);
    }
}
