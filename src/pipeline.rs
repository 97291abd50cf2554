//! Blocking bodies of the create and extract operations.
//!
//! Both run on a single worker thread: first a size pass to learn the total
//! byte count, then a second pass that moves the data one entry and one chunk
//! at a time through a shared [`StreamCopier`].

use std::fs::{self, File};
use std::path::Path;
use std::time::SystemTime;

use tracing::{debug, info};

use crate::archive::TransferOptions;
use crate::copy::{StreamCopier, check_canceled};
use crate::error::Result;
use crate::names;
use crate::plan::{self, EntryKind};
use crate::zip::{ZipReader, ZipWriter};

/// Archive every file and empty directory below `folder` into `archive`.
///
/// Both paths must be absolute. The archive is finalized on every exit path,
/// so a canceled or failed run leaves a readable archive of the entries
/// completed so far.
pub fn create(folder: &Path, archive: &Path, options: &TransferOptions) -> Result<()> {
    let cancel = options.cancel.as_ref();
    let exclude = Some(archive);

    let total_bytes = plan::folder_total_bytes(folder, exclude)?;
    check_canceled(cancel)?;
    info!(
        folder = %folder.display(),
        archive = %archive.display(),
        total_bytes,
        "creating archive"
    );

    let mut zip = ZipWriter::create(archive, options.compression)?;
    let mut copier = StreamCopier::new(
        total_bytes,
        options.buffer_size,
        options.progress.as_deref(),
        cancel,
    );

    for entry in plan::walk(folder, exclude) {
        check_canceled(cancel)?;
        let entry = entry?;

        match entry.kind {
            EntryKind::File => {
                let name = names::entry_name(folder, &entry.path, false)?;
                debug!(name = %name, size = entry.size, "adding file");

                let mut source = File::open(&entry.path)?;
                let mut dest = zip.start_entry(&name)?;
                copier.copy(&mut source, &mut dest)?;
                dest.set_modified(entry.modified);
                dest.finish()?;
            }
            EntryKind::Directory => {
                // Non-empty directories are implied by the entries inside them
                if entry.empty {
                    let name = names::entry_name(folder, &entry.path, true)?;
                    debug!(name = %name, "adding empty directory");
                    zip.add_directory(&name, entry.modified)?;
                }
            }
        }
    }

    let entries = zip.len();
    zip.finish()?;
    copier.finish();
    info!(
        entries,
        bytes = copier.state().transferred,
        "archive created"
    );
    Ok(())
}

/// Extract every entry of `archive` below `dest`, which must exist.
///
/// Nothing is rolled back on failure or cancellation.
pub fn extract(archive: &Path, dest: &Path, options: &TransferOptions) -> Result<()> {
    let cancel = options.cancel.as_ref();
    check_canceled(cancel)?;

    let zip = ZipReader::open(archive)?;
    let entries = zip.entries()?;
    let total_bytes = plan::archive_total_bytes(&entries);
    check_canceled(cancel)?;
    info!(
        archive = %archive.display(),
        dest = %dest.display(),
        entries = entries.len(),
        total_bytes,
        "extracting archive"
    );

    let mut copier = StreamCopier::new(
        total_bytes,
        options.buffer_size,
        options.progress.as_deref(),
        cancel,
    );

    for entry in &entries {
        check_canceled(cancel)?;

        let path = names::destination_path(dest, &entry.file_name)?;
        let modified = SystemTime::from(entry.modified());

        if entry.is_directory {
            debug!(name = %entry.file_name, "creating directory");
            fs::create_dir_all(&path)?;
            set_dir_modified(&path, modified)?;
            continue;
        }

        debug!(
            name = %entry.file_name,
            size = entry.uncompressed_size,
            "extracting file"
        );
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut source = zip.open_entry(entry)?;
        let mut file = File::create(&path)?;
        copier.copy(&mut source, &mut file)?;
        file.set_modified(modified)?;
    }

    copier.finish();
    info!(bytes = copier.state().transferred, "archive extracted");
    Ok(())
}

fn set_dir_modified(path: &Path, modified: SystemTime) -> Result<()> {
    #[cfg(unix)]
    {
        File::open(path)?.set_modified(modified)?;
    }

    #[cfg(windows)]
    {
        use std::os::windows::fs::OpenOptionsExt;
        // Directories can only be opened with backup semantics
        const FILE_FLAG_BACKUP_SEMANTICS: u32 = 0x0200_0000;
        fs::OpenOptions::new()
            .write(true)
            .custom_flags(FILE_FLAG_BACKUP_SEMANTICS)
            .open(path)?
            .set_modified(modified)?;
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = (path, modified);
    }

    Ok(())
}
