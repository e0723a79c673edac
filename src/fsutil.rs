//! Filesystem primitives: the file-copy routine and the hidden-entry check.

use filetime::FileTime;
use std::ffi::OsStr;
use std::fs::{File, Metadata};
use std::io;
use std::path::Path;

/// Copy the full byte content of `source` to `dest`, returning the number of
/// bytes written.
///
/// Writes go to a temp file in the destination directory which is then
/// renamed into place, so an interrupted copy never leaves a partial file at
/// `dest`. With `preserve_timestamps` the source mtime/atime are applied to
/// the destination afterwards, best-effort.
pub fn copy_file(source: &Path, dest: &Path, preserve_timestamps: bool) -> io::Result<u64> {
    let src = File::open(source)?;
    let meta = src.metadata()?;
    let parent = dest.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent")
    })?;

    let temp = tempfile::NamedTempFile::new_in(parent)?;
    let copied = copy_file_contents(&src, temp.as_file(), meta.len())?;
    temp.persist(dest).map_err(|e| e.error)?;

    if preserve_timestamps {
        let mtime = FileTime::from_last_modification_time(&meta);
        let atime = FileTime::from_last_access_time(&meta);
        if let Err(e) = filetime::set_file_times(dest, atime, mtime) {
            tracing::debug!(dest = %dest.display(), error = %e, "could not set timestamps");
        }
    }

    Ok(copied)
}

/// Efficiently copy file contents using the best available method.
///
/// On Linux, uses `copy_file_range` for kernel-to-kernel transfer and falls
/// back to `std::io::copy` where the filesystem does not support it.
fn copy_file_contents(src: &File, dst: &File, len: u64) -> io::Result<u64> {
    #[cfg(target_os = "linux")]
    {
        copy_file_range_all(src, dst, len)
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = len; // unused off Linux
        io::copy(&mut io::BufReader::new(src), &mut &*dst)
    }
}

#[cfg(target_os = "linux")]
fn copy_file_range_all(src: &File, dst: &File, len: u64) -> io::Result<u64> {
    use std::os::unix::io::AsRawFd;

    let src_fd = src.as_raw_fd();
    let dst_fd = dst.as_raw_fd();
    let mut remaining = len;
    let mut copied: u64 = 0;

    while remaining > 0 {
        // 128MB chunks: avoids holding kernel resources across huge files
        let chunk_size = remaining.min(128 * 1024 * 1024) as usize;

        // SAFETY: valid file descriptors, null offsets mean current position
        let result = unsafe {
            libc::copy_file_range(
                src_fd,
                std::ptr::null_mut(),
                dst_fd,
                std::ptr::null_mut(),
                chunk_size,
                0,
            )
        };

        if result < 0 {
            let err = io::Error::last_os_error();
            // EXDEV/ENOSYS/EINVAL/EOPNOTSUPP: not supported here, fall back
            if copied == 0
                && matches!(
                    err.raw_os_error(),
                    Some(libc::EXDEV)
                        | Some(libc::ENOSYS)
                        | Some(libc::EINVAL)
                        | Some(libc::EOPNOTSUPP)
                )
            {
                return io::copy(&mut io::BufReader::new(src), &mut &*dst);
            }
            return Err(err);
        }

        if result == 0 {
            // EOF (file may have been truncated since discovery)
            break;
        }

        let bytes_copied = result as u64;
        copied += bytes_copied;
        remaining = remaining.saturating_sub(bytes_copied);
    }

    Ok(copied)
}

/// Whether a directory entry is hidden, by the platform's own notion.
///
/// One check applied at every directory level: Windows looks at the
/// hidden/system file attributes, everywhere else a leading dot in the name.
#[cfg(windows)]
pub fn is_hidden(_name: &OsStr, metadata: &Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    const FILE_ATTRIBUTE_SYSTEM: u32 = 0x4;
    metadata.file_attributes() & (FILE_ATTRIBUTE_HIDDEN | FILE_ATTRIBUTE_SYSTEM) != 0
}

/// Whether a directory entry is hidden, by the platform's own notion.
#[cfg(not(windows))]
pub fn is_hidden(name: &OsStr, _metadata: &Metadata) -> bool {
    name.to_string_lossy().starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_copy_file_preserves_content() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.bin");
        let dst = dir.path().join("dst.bin");
        let payload = vec![0xAB_u8; 70_000];
        fs::write(&src, &payload).unwrap();

        let copied = copy_file(&src, &dst, true).unwrap();
        assert_eq!(copied, payload.len() as u64);
        assert_eq!(fs::read(&dst).unwrap(), payload);
    }

    #[test]
    fn test_copy_empty_file() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("empty");
        let dst = dir.path().join("empty.out");
        fs::write(&src, b"").unwrap();

        assert_eq!(copy_file(&src, &dst, false).unwrap(), 0);
        assert!(dst.exists());
    }

    #[test]
    fn test_copy_missing_source_fails() {
        let dir = TempDir::new().unwrap();
        let err = copy_file(
            &dir.path().join("nope"),
            &dir.path().join("out"),
            false,
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_copy_preserves_mtime() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a");
        let dst = dir.path().join("b");
        fs::write(&src, b"data").unwrap();
        let past = FileTime::from_unix_time(1_500_000_000, 0);
        filetime::set_file_mtime(&src, past).unwrap();

        copy_file(&src, &dst, true).unwrap();
        let dst_mtime = FileTime::from_last_modification_time(&fs::metadata(&dst).unwrap());
        assert_eq!(dst_mtime.unix_seconds(), past.unix_seconds());
    }

    #[cfg(not(windows))]
    #[test]
    fn test_is_hidden_dot_names() {
        let dir = TempDir::new().unwrap();
        let visible = dir.path().join("visible");
        fs::write(&visible, b"x").unwrap();
        let meta = fs::metadata(&visible).unwrap();
        assert!(is_hidden(OsStr::new(".DS_Store"), &meta));
        assert!(!is_hidden(OsStr::new("Documents"), &meta));
    }
}
