// src/engine/archive/gztar.rs
//! Gzip-compressed ustar codec.
//!
//! Archives are assembled in memory: the tree is read through the
//! `FileSystem` trait, encoded into 512-byte blocks and gzipped with flate2.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{debug, warn};

use super::{clear_symlink, member_target};
use crate::fs::path::is_contained;
use crate::fs::{normalize_path, FileSystem, FsError, WalkOptions};

const BLOCK_SIZE: usize = 512;

/// Byte range of one header field: (offset, length).
type Field = (usize, usize);

const NAME: Field = (0, 100);
const MODE: Field = (100, 8);
const UID: Field = (108, 8);
const GID: Field = (116, 8);
const SIZE: Field = (124, 12);
const MTIME: Field = (136, 12);
const CHECKSUM: Field = (148, 8);
const TYPEFLAG: usize = 156;
const LINKNAME: Field = (157, 100);
const MAGIC: Field = (257, 6);
const VERSION: Field = (263, 2);
const UNAME: Field = (265, 32);
const GNAME: Field = (297, 32);
const PREFIX: Field = (345, 155);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryKind {
    #[default]
    File,
    Directory,
    Symlink,
    /// Any other typeflag (hard links, devices, pax headers). Not extracted.
    Unsupported(u8),
}

impl EntryKind {
    fn flag(self) -> u8 {
        match self {
            EntryKind::File => b'0',
            EntryKind::Directory => b'5',
            EntryKind::Symlink => b'2',
            EntryKind::Unsupported(flag) => flag,
        }
    }

    fn from_flag(flag: u8) -> Self {
        match flag {
            b'0' | 0 | b'7' => EntryKind::File,
            b'5' => EntryKind::Directory,
            b'2' => EntryKind::Symlink,
            other => EntryKind::Unsupported(other),
        }
    }
}

/// One member of a tar archive.
#[derive(Debug, Clone, Default)]
pub struct TarEntry {
    /// Slash-separated member name, without a trailing slash.
    pub name: String,
    pub kind: EntryKind,
    pub content: Vec<u8>,
    pub mode: u32,
    pub mtime: u64,
    pub uid: u32,
    pub gid: u32,
    pub uname: String,
    pub gname: String,
    pub link_target: String,
}

struct HeaderBlock([u8; BLOCK_SIZE]);

impl HeaderBlock {
    fn new() -> Self {
        HeaderBlock([0u8; BLOCK_SIZE])
    }

    fn put_text(&mut self, (offset, len): Field, value: &str) {
        let bytes = value.as_bytes();
        let n = bytes.len().min(len);
        self.0[offset..offset + n].copy_from_slice(&bytes[..n]);
    }

    /// Zero-padded octal followed by a NUL.
    fn put_octal(&mut self, (offset, len): Field, value: u64) {
        let digits = format!("{:0width$o}", value, width = len - 1);
        let digits = &digits.as_bytes()[digits.len().saturating_sub(len - 1)..];
        self.0[offset..offset + digits.len()].copy_from_slice(digits);
        self.0[offset + digits.len()] = 0;
    }

    fn text(&self, (offset, len): Field) -> String {
        let raw = &self.0[offset..offset + len];
        let end = raw.iter().position(|&b| b == 0).unwrap_or(len);
        String::from_utf8_lossy(&raw[..end]).into_owned()
    }

    fn octal(&self, field: Field) -> Result<u64, String> {
        let text = self.text(field);
        let text = text.trim_matches(|c: char| c == ' ' || c == '\0');
        if text.is_empty() {
            return Ok(0);
        }
        u64::from_str_radix(text, 8).map_err(|_| format!("bad octal field '{}'", text))
    }

    /// Sum of all bytes with the checksum field counted as spaces.
    fn checksum(&self) -> u64 {
        let (offset, len) = CHECKSUM;
        self.0
            .iter()
            .enumerate()
            .map(|(i, &b)| if (offset..offset + len).contains(&i) { b' ' as u64 } else { b as u64 })
            .sum()
    }

    fn seal(&mut self) {
        let sum = format!("{:06o}\0 ", self.checksum());
        let (offset, len) = CHECKSUM;
        self.0[offset..offset + len].copy_from_slice(sum.as_bytes());
    }
}

/// Split a member name into ustar (prefix, name) at a slash.
fn split_name(path: &str) -> Result<(&str, &str), String> {
    if path.len() <= NAME.1 {
        return Ok(("", path));
    }
    path.char_indices()
        .filter(|&(_, c)| c == '/')
        .map(|(i, _)| (&path[..i], &path[i + 1..]))
        .find(|(prefix, name)| prefix.len() <= PREFIX.1 && name.len() <= NAME.1 && !name.is_empty())
        .ok_or_else(|| format!("name too long for ustar: {}", path))
}

fn encode_header(entry: &TarEntry) -> Result<HeaderBlock, String> {
    let mut name = entry.name.clone();
    if entry.kind == EntryKind::Directory {
        name.push('/');
    }
    let (prefix, short) = split_name(&name)?;
    if entry.link_target.len() > LINKNAME.1 {
        return Err(format!("link target too long for ustar: {}", entry.link_target));
    }

    let size = match entry.kind {
        EntryKind::File => entry.content.len() as u64,
        _ => 0,
    };

    let mut header = HeaderBlock::new();
    header.put_text(NAME, short);
    header.put_octal(MODE, (entry.mode & 0o7777) as u64);
    header.put_octal(UID, entry.uid as u64);
    header.put_octal(GID, entry.gid as u64);
    header.put_octal(SIZE, size);
    header.put_octal(MTIME, entry.mtime);
    header.0[TYPEFLAG] = entry.kind.flag();
    header.put_text(LINKNAME, &entry.link_target);
    header.put_text(MAGIC, "ustar\0");
    header.put_text(VERSION, "00");
    header.put_text(UNAME, &entry.uname);
    header.put_text(GNAME, &entry.gname);
    header.put_text(PREFIX, prefix);
    header.seal();
    Ok(header)
}

/// Serialize entries into an uncompressed tar stream.
pub fn encode(entries: &[TarEntry]) -> Result<Vec<u8>, String> {
    let mut out = Vec::new();
    for entry in entries {
        out.extend_from_slice(&encode_header(entry)?.0);
        if entry.kind == EntryKind::File {
            out.extend_from_slice(&entry.content);
            let pad = (BLOCK_SIZE - entry.content.len() % BLOCK_SIZE) % BLOCK_SIZE;
            out.resize(out.len() + pad, 0);
        }
    }
    out.resize(out.len() + 2 * BLOCK_SIZE, 0);
    Ok(out)
}

/// Parse an uncompressed tar stream.
pub fn decode(data: &[u8]) -> Result<Vec<TarEntry>, String> {
    let mut entries = Vec::new();
    let mut offset = 0;

    while offset + BLOCK_SIZE <= data.len() {
        let mut header = HeaderBlock::new();
        header.0.copy_from_slice(&data[offset..offset + BLOCK_SIZE]);
        offset += BLOCK_SIZE;

        if header.0.iter().all(|&b| b == 0) {
            break;
        }
        if header.octal(CHECKSUM)? != header.checksum() {
            return Err(format!("invalid header checksum at offset {}", offset - BLOCK_SIZE));
        }

        let kind = EntryKind::from_flag(header.0[TYPEFLAG]);
        let size = header.octal(SIZE)? as usize;
        let short = header.text(NAME);
        let prefix = header.text(PREFIX);
        let name = if prefix.is_empty() { short } else { format!("{}/{}", prefix, short) };

        let content = if size > 0 {
            let end = offset
                .checked_add(size)
                .filter(|&end| end <= data.len())
                .ok_or_else(|| "unexpected end of archive".to_string())?;
            let body = data[offset..end].to_vec();
            offset += size.div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
            body
        } else {
            Vec::new()
        };

        entries.push(TarEntry {
            name: name.trim_end_matches('/').to_string(),
            kind,
            content,
            mode: header.octal(MODE)? as u32,
            mtime: header.octal(MTIME)?,
            uid: header.octal(UID)? as u32,
            gid: header.octal(GID)? as u32,
            uname: header.text(UNAME),
            gname: header.text(GNAME),
            link_target: header.text(LINKNAME),
        });
    }

    if entries.is_empty() && !data.is_empty() && data.iter().any(|&b| b != 0) {
        return Err("no tar header found".to_string());
    }
    Ok(entries)
}

fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn gunzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

fn member_name(top: &Path, relative: &Path) -> String {
    top.join(relative)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Gzipped tar of everything under `root`, with member names rooted at `top`.
pub fn pack_tree(fs: &dyn FileSystem, root: &Path, top: &Path) -> Result<Vec<u8>, FsError> {
    let options = WalkOptions { follow_links: false, include_root: true };
    let mut entries = Vec::new();

    for node in fs.walk(root, &options) {
        let node = node?;
        let name = member_name(top, &node.relative);
        if name.is_empty() {
            continue;
        }
        let stat = fs.lstat(&node.path)?;
        let mut entry = TarEntry {
            name,
            mode: stat.mode & 0o7777,
            mtime: stat.mtime.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0),
            uid: stat.uid,
            gid: stat.gid,
            uname: fs.user_name(stat.uid),
            gname: fs.group_name(stat.gid),
            ..TarEntry::default()
        };
        if stat.is_symlink {
            entry.kind = EntryKind::Symlink;
            entry.link_target = fs.read_link(&node.path)?.to_string_lossy().into_owned();
        } else if stat.is_directory {
            entry.kind = EntryKind::Directory;
        } else {
            entry.content = fs.read_file(&node.path)?;
        }
        debug!(member = %entry.name, "adding to tar");
        entries.push(entry);
    }

    let tar = encode(&entries).map_err(|reason| FsError::wrong_format(root, "tar", reason))?;
    gzip(&tar).map_err(|e| FsError::from_io(e, root, "tar"))
}

/// Extract a gzipped tar into `dest` and return the number of members written.
///
/// Members whose names leave `dest`, members below a symlink, and symlinks
/// pointing outside `dest` are skipped.
pub fn unpack_into(fs: &dyn FileSystem, data: &[u8], dest: &Path, archive: &Path) -> Result<usize, FsError> {
    let tar = gunzip(data).map_err(|e| FsError::wrong_format(archive, "untar", e.to_string()))?;
    let entries = decode(&tar).map_err(|reason| FsError::wrong_format(archive, "untar", reason))?;

    let mut written = 0;
    for entry in entries {
        let relative = PathBuf::from(&entry.name);
        if !is_contained(&relative) {
            warn!(member = %entry.name, "skipping member outside the destination");
            continue;
        }
        let Some(target) = member_target(fs, dest, &relative) else {
            warn!(member = %entry.name, "skipping member below a symlink");
            continue;
        };
        if let Some(parent) = target.parent() {
            fs.create_dir_all(parent)?;
        }

        match entry.kind {
            EntryKind::Directory => {
                if fs.lstat(&target).is_ok_and(|s| s.is_symlink) {
                    warn!(member = %entry.name, "skipping directory shadowed by a symlink");
                    continue;
                }
                fs.create_dir_all(&target)?;
            }
            EntryKind::File => {
                clear_symlink(fs, &target)?;
                fs.write_file(&target, &entry.content)?;
                fs.set_mode(&target, entry.mode)?;
            }
            EntryKind::Symlink => {
                let base = target.parent().unwrap_or(dest);
                let pointee = normalize_path(&base.join(&entry.link_target));
                if !pointee.starts_with(normalize_path(dest)) {
                    warn!(member = %entry.name, target = %entry.link_target, "skipping symlink leaving the destination");
                    continue;
                }
                if fs.lstat(&target).is_ok() {
                    fs.remove_file(&target)?;
                }
                fs.symlink(Path::new(&entry.link_target), &target)?;
            }
            EntryKind::Unsupported(flag) => {
                warn!(member = %entry.name, flag = %(flag as char), "skipping unsupported tar member");
                continue;
            }
        }
        written += 1;
    }
    Ok(written)
}
