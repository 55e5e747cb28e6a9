use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use tokio::{fs, io::{self, AsyncWriteExt}};

/// Returns a sibling path of `path` with `suffix` appended to the file name.
pub fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Writes `contents` into a temporary sibling of `path` and renames it over `path`. Readers see
/// either the old file or the new one, never a partially written file.
pub async fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), io::Error> {
    let temporary = sibling_with_suffix(path, ".tmp");
    {
        let mut file = fs::File::create(&temporary).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
    }
    match fs::rename(&temporary, path).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = fs::remove_file(&temporary).await;
            Err(e)
        }
    }
}

/// Replaces `target` with the contents of `source`. If `target` exists its current contents are
/// first copied to `backup`, overwriting any earlier backup. Returns whether a backup was made.
pub async fn replace_with_backup(
    source: &Path,
    target: &Path,
    backup: &Path,
) -> Result<bool, io::Error> {
    let contents = fs::read(source).await?;

    let backed_up = match fs::copy(target, backup).await {
        Ok(_) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => return Err(e),
    };

    write_atomically(target, &contents).await?;
    Ok(backed_up)
}
