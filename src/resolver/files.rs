//! Temp files for write-then-rename replacement inside the cache

use std::io;
use std::path::Path;

use tempfile::NamedTempFile;

/// Creates a temp file in `dir` that is later persisted over a cache file.
///
/// `NamedTempFile::new_in` creates owner-only files; this one gets the mode a
/// plain create would (0666 less the umask), so replaced cache files stay
/// readable by every user sharing the cache.
pub(crate) fn replacement_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}
