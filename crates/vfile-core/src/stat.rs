//! Stat information attached to a resource.

use std::time::SystemTime;

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::Display;

#[cfg(unix)]
use std::os::unix::fs::{FileTypeExt, MetadataExt};

/// Type of the entity a resource describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FileKind {
    /// Regular file.
    #[default]
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Block device.
    BlockDevice,
    /// Character device.
    CharacterDevice,
    /// Named pipe.
    Fifo,
    /// Unix domain socket.
    Socket,
}

impl FileKind {
    /// Derive the kind from a file type as reported by the OS.
    pub fn from_file_type(file_type: std::fs::FileType) -> Self {
        if file_type.is_symlink() {
            return Self::Symlink;
        }
        if file_type.is_dir() {
            return Self::Directory;
        }
        #[cfg(unix)]
        {
            if file_type.is_block_device() {
                return Self::BlockDevice;
            }
            if file_type.is_char_device() {
                return Self::CharacterDevice;
            }
            if file_type.is_fifo() {
                return Self::Fifo;
            }
            if file_type.is_socket() {
                return Self::Socket;
            }
        }
        Self::File
    }
}

/// Access, modification, change and birth times.
///
/// Each time is kept as a structured value; the `*_ms` accessors give the
/// numeric form (milliseconds since the Unix epoch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    /// Last access time.
    pub accessed: DateTime<Utc>,
    /// Last content modification time.
    pub modified: DateTime<Utc>,
    /// Last status change time.
    pub changed: DateTime<Utc>,
    /// Creation time.
    pub birth: DateTime<Utc>,
}

impl Timestamps {
    /// Create timestamps with every time set to `time`.
    pub fn all(time: DateTime<Utc>) -> Self {
        Self {
            accessed: time,
            modified: time,
            changed: time,
            birth: time,
        }
    }

    /// Create timestamps with every time set to now.
    pub fn now() -> Self {
        Self::all(Utc::now())
    }

    /// Read timestamps from file metadata, falling back to the
    /// modification time where the platform does not report a value.
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        let modified = to_utc(metadata.modified().unwrap_or(std::time::UNIX_EPOCH));
        Self {
            accessed: metadata.accessed().map(to_utc).unwrap_or(modified),
            modified,
            changed: get_ctime(metadata).unwrap_or(modified),
            birth: metadata.created().map(to_utc).unwrap_or(modified),
        }
    }

    /// Access time in milliseconds.
    pub fn accessed_ms(&self) -> i64 {
        self.accessed.timestamp_millis()
    }

    /// Modification time in milliseconds.
    pub fn modified_ms(&self) -> i64 {
        self.modified.timestamp_millis()
    }

    /// Status change time in milliseconds.
    pub fn changed_ms(&self) -> i64 {
        self.changed.timestamp_millis()
    }

    /// Birth time in milliseconds.
    pub fn birth_ms(&self) -> i64 {
        self.birth.timestamp_millis()
    }
}

impl Default for Timestamps {
    fn default() -> Self {
        Self::now()
    }
}

fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

#[cfg(unix)]
fn get_ctime(metadata: &std::fs::Metadata) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(metadata.ctime(), metadata.ctime_nsec() as u32)
}

#[cfg(not(unix))]
fn get_ctime(_metadata: &std::fs::Metadata) -> Option<DateTime<Utc>> {
    None
}

/// Metadata describing a resource.
///
/// The resource passes this through untouched. It is never recomputed when
/// content changes.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), default)]
pub struct StatInfo {
    /// Entity type.
    pub kind: FileKind,

    /// Size in bytes as reported by the origin.
    pub size: u64,

    /// Permission bits.
    pub mode: u32,

    /// File times.
    pub timestamps: Timestamps,
}

impl Default for StatInfo {
    fn default() -> Self {
        Self {
            kind: FileKind::File,
            size: 0,
            mode: 0o644,
            timestamps: Timestamps::now(),
        }
    }
}

impl StatInfo {
    /// Create a new stat info builder.
    pub fn builder() -> StatInfoBuilder {
        StatInfoBuilder::default()
    }

    /// Stat info for a directory, all times set to now.
    pub fn directory() -> Self {
        Self {
            kind: FileKind::Directory,
            mode: 0o755,
            ..Self::default()
        }
    }

    /// Build stat info from file metadata.
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        Self {
            kind: FileKind::from_file_type(metadata.file_type()),
            size: metadata.len(),
            mode: get_mode(metadata),
            timestamps: Timestamps::from_metadata(metadata),
        }
    }

    /// Check if this describes a regular file.
    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    /// Check if this describes a directory.
    pub fn is_directory(&self) -> bool {
        self.kind == FileKind::Directory
    }

    /// Check if this describes a symbolic link.
    pub fn is_symlink(&self) -> bool {
        self.kind == FileKind::Symlink
    }

    /// Check if this describes a block device.
    pub fn is_block_device(&self) -> bool {
        self.kind == FileKind::BlockDevice
    }

    /// Check if this describes a character device.
    pub fn is_character_device(&self) -> bool {
        self.kind == FileKind::CharacterDevice
    }

    /// Check if this describes a named pipe.
    pub fn is_fifo(&self) -> bool {
        self.kind == FileKind::Fifo
    }

    /// Check if this describes a socket.
    pub fn is_socket(&self) -> bool {
        self.kind == FileKind::Socket
    }
}

#[cfg(unix)]
fn get_mode(metadata: &std::fs::Metadata) -> u32 {
    metadata.mode() & 0o7777
}

#[cfg(not(unix))]
fn get_mode(metadata: &std::fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}
