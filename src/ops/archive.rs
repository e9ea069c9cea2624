//! Deterministic `.tar.gz` artifacts of a package tree.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::{Compression, GzBuilder};
use tar::{Builder, EntryType, Header};
use walkdir::WalkDir;

use crate::core::errors::PackError;
use crate::util::fs::{ensure_dir, to_slash, walk_error};

const FILE_MODE: u32 = 0o644;
const DIR_MODE: u32 = 0o755;

/// Default gzip level.
pub const DEFAULT_COMPRESSION: u32 = 6;

/// Outcome of writing an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveInfo {
    pub path: PathBuf,

    /// Files stored, excluding directory entries
    pub files: usize,

    /// Size of the compressed archive
    pub size: u64,
}

/// Write `package_dir` as a gzip-compressed tar at `output`.
///
/// Entries are sorted with normalized owners, modes and zero mtimes, so the
/// same tree always yields the same bytes. Entries are rooted at the package
/// tree (no leading directory). The archive is written to a temporary file
/// and moved into place.
pub fn create_archive(
    package_dir: &Path,
    output: &Path,
    level: u32,
) -> Result<ArchiveInfo, PackError> {
    let out_dir = output.parent().unwrap_or_else(|| Path::new("."));
    ensure_dir(out_dir)?;

    let tmp = tempfile::NamedTempFile::new_in(out_dir)
        .map_err(|e| PackError::fs("create temporary archive in", out_dir, e))?;

    let mut files = 0;
    {
        let writer = BufWriter::new(tmp.as_file());
        let encoder = GzBuilder::new()
            .mtime(0)
            .write(writer, Compression::new(level.min(9)));
        let mut builder = Builder::new(encoder);

        // Depth first with sorted siblings: a directory entry always precedes
        // its contents, and empty directories are kept.
        let walker = WalkDir::new(package_dir)
            .follow_links(true)
            .sort_by_file_name()
            .min_depth(1);
        for entry in walker {
            let entry = entry.map_err(|e| walk_error(e, package_dir))?;
            let path = entry.path();
            let rel = to_slash(path.strip_prefix(package_dir).unwrap_or(path));

            if entry.file_type().is_dir() {
                append_dir(&mut builder, &format!("{}/", rel))
                    .map_err(|e| PackError::fs("write archive", output, e))?;
            } else if entry.file_type().is_file() {
                let data = std::fs::read(path).map_err(|e| PackError::fs("read file", path, e))?;
                append_file(&mut builder, &rel, &data)
                    .map_err(|e| PackError::fs("write archive", output, e))?;
                files += 1;
            }
        }

        let encoder = builder
            .into_inner()
            .map_err(|e| PackError::fs("write archive", output, e))?;
        let mut writer = encoder
            .finish()
            .map_err(|e| PackError::fs("write archive", output, e))?;
        writer
            .flush()
            .map_err(|e| PackError::fs("write archive", output, e))?;
    }

    tmp.persist(output)
        .map_err(|e| PackError::fs("write archive", output, e.error))?;

    let size = std::fs::metadata(output)
        .map_err(|e| PackError::fs("read metadata of", output, e))?
        .len();

    tracing::info!("wrote {} ({} files, {} bytes)", output.display(), files, size);

    Ok(ArchiveInfo {
        path: output.to_path_buf(),
        files,
        size,
    })
}

fn base_header(entry_type: EntryType, mode: u32, size: u64) -> Header {
    let mut header = Header::new_gnu();
    header.set_entry_type(entry_type);
    header.set_mode(mode);
    header.set_size(size);
    header.set_mtime(0);
    header.set_uid(0);
    header.set_gid(0);
    header
}

fn append_dir<W: Write>(builder: &mut Builder<W>, path: &str) -> io::Result<()> {
    let mut header = base_header(EntryType::Directory, DIR_MODE, 0);
    builder.append_data(&mut header, path, io::empty())
}

fn append_file<W: Write>(builder: &mut Builder<W>, path: &str, data: &[u8]) -> io::Result<()> {
    let mut header = base_header(EntryType::Regular, FILE_MODE, data.len() as u64);
    builder.append_data(&mut header, path, data)
}

/// List the entries of an archive in stored order; directories end in `/`.
pub fn list_archive(archive: &Path) -> Result<Vec<String>, PackError> {
    let file = File::open(archive).map_err(|e| PackError::fs("open archive", archive, e))?;
    let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(file));
    let mut names = Vec::new();

    let entries = tar
        .entries()
        .map_err(|e| PackError::fs("read archive", archive, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| PackError::fs("read archive", archive, e))?;
        let kind = entry.header().entry_type();
        if kind.is_file() || kind.is_dir() {
            let path = entry
                .path()
                .map_err(|e| PackError::fs("read archive", archive, e))?;
            let mut name = to_slash(&path);
            if kind.is_dir() {
                name.push('/');
            }
            names.push(name);
        }
    }

    Ok(names)
}
