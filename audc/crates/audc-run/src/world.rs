//! The filesystem mirror: folders, files and audio metadata.
//!
//! The world is an arena of folder and file objects addressed by index
//! handles. Aud composite values point into it; every mutation keeps the
//! cross-references consistent (a live file's parent lists the file, a
//! deleted file is detached and marked non-live).
//!
//! The actual directory contents come in through the [`Backing`] seam:
//! [`DiskBacking`] walks the real filesystem read-only, [`MemoryBacking`] is
//! a seedable stand-in for tests. The world never writes to disk; moves,
//! deletions and audio edits mutate only the mirror.

use std::fs;
use std::path::Path;

use audc_util::{DiagnosticKind, FxHashMap, Span};

use crate::{Fault, RunResult};

/// Handle to a folder object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FolderId(pub usize);

/// Handle to a file object (plain or audio).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FileId(pub usize);

/// Audio metadata plus the opaque backing bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioMeta {
    /// Track length in milliseconds.
    pub length: i64,
    /// Bitrate in bits per second.
    pub bitrate: i64,
    pub title: String,
    /// Opaque content blob; mutated by the editing operations but only
    /// observable through the metadata.
    pub bytes: Vec<u8>,
}

impl AudioMeta {
    /// Metadata for a freshly constructed, detached audio file.
    pub fn detached(name: &str) -> Self {
        Self {
            length: 0,
            bitrate: 0,
            title: stem(name).to_string(),
            bytes: Vec::new(),
        }
    }
}

/// A file in the mirror. The `audio` tag distinguishes plain files from
/// audio files carrying metadata.
#[derive(Clone, Debug)]
pub struct FileObject {
    /// Basename, extension included.
    pub filename: String,
    pub parent: Option<FolderId>,
    pub live: bool,
    pub audio: Option<AudioMeta>,
}

/// A folder in the mirror.
#[derive(Clone, Debug)]
pub struct FolderObject {
    /// Normalized path.
    pub path: String,
    pub parent: Option<FolderId>,
    pub files: Vec<FileId>,
    pub subfolders: Vec<FolderId>,
    pub is_root: bool,
}

/// One directory entry as reported by a backing store.
#[derive(Clone, Debug)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Source of directory listings and audio probes.
pub trait Backing {
    /// Entries of the directory at `path`; empty when it does not exist.
    fn list_dir(&self, path: &str) -> Vec<DirEntry>;

    /// Audio metadata for the file at `path`, or `None` when it cannot be
    /// interpreted as audio.
    fn probe_audio(&self, path: &str) -> Option<AudioMeta>;
}

/// Read-only view of the real filesystem.
///
/// Audio probing is by extension; the metadata is derived from the file size
/// at the default bitrate, since real decoding lives outside the
/// interpreter.
pub struct DiskBacking;

const AUDIO_EXTENSIONS: [&str; 5] = ["mp3", "wav", "flac", "ogg", "m4a"];
const DEFAULT_BITRATE: i64 = 128_000;

impl Backing for DiskBacking {
    fn list_dir(&self, path: &str) -> Vec<DirEntry> {
        let Ok(entries) = fs::read_dir(path) else {
            return Vec::new();
        };
        let mut result: Vec<DirEntry> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let is_dir = entry.file_type().ok()?.is_dir();
                Some(DirEntry { name, is_dir })
            })
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        result
    }

    fn probe_audio(&self, path: &str) -> Option<AudioMeta> {
        let ext = Path::new(path).extension()?.to_str()?.to_lowercase();
        if !AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            return None;
        }
        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0) as i64;
        let name = Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(path);
        Some(AudioMeta {
            length: size.saturating_mul(8000) / DEFAULT_BITRATE,
            bitrate: DEFAULT_BITRATE,
            title: stem(name).to_string(),
            bytes: Vec::new(),
        })
    }
}

/// Seedable in-memory backing store.
#[derive(Default)]
pub struct MemoryBacking {
    dirs: FxHashMap<String, Vec<DirEntry>>,
    audio: FxHashMap<String, AudioMeta>,
}

impl MemoryBacking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a directory entry under its parent path.
    pub fn add_entry(&mut self, parent: &str, name: &str, is_dir: bool) {
        self.dirs
            .entry(normalize_path(parent))
            .or_default()
            .push(DirEntry {
                name: name.to_string(),
                is_dir,
            });
    }

    /// Registers audio metadata for the file at `path`.
    pub fn add_audio(&mut self, path: &str, meta: AudioMeta) {
        self.audio.insert(normalize_path(path), meta);
    }
}

impl Backing for MemoryBacking {
    fn list_dir(&self, path: &str) -> Vec<DirEntry> {
        self.dirs
            .get(&normalize_path(path))
            .cloned()
            .unwrap_or_default()
    }

    fn probe_audio(&self, path: &str) -> Option<AudioMeta> {
        self.audio.get(&normalize_path(path)).cloned()
    }
}

/// Lexical path normalization: collapses separators, `.` and `..`.
pub fn normalize_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().map(|p| *p != "..").unwrap_or(false) {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

fn stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// The folder/file object graph.
pub struct DomainWorld {
    folders: Vec<FolderObject>,
    files: Vec<FileObject>,
    by_path: FxHashMap<String, FolderId>,
    backing: Box<dyn Backing>,
    max_depth: usize,
}

impl DomainWorld {
    pub fn new(backing: Box<dyn Backing>, max_depth: usize) -> Self {
        Self {
            folders: Vec::new(),
            files: Vec::new(),
            by_path: FxHashMap::default(),
            backing,
            max_depth,
        }
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Opens the folder at `path`: returns the existing handle when the
    /// normalized path is already in the world, otherwise creates the folder
    /// and adopts the backing directory tree up to the depth limit. Deeper
    /// children are silently omitted.
    pub fn open_folder(&mut self, path: &str) -> FolderId {
        let normalized = normalize_path(path);
        if let Some(&id) = self.by_path.get(&normalized) {
            return id;
        }
        let id = self.insert_folder(normalized, None);
        self.adopt(id, 0);
        id
    }

    fn insert_folder(&mut self, path: String, parent: Option<FolderId>) -> FolderId {
        let id = FolderId(self.folders.len());
        self.by_path.insert(path.clone(), id);
        self.folders.push(FolderObject {
            path,
            parent,
            files: Vec::new(),
            subfolders: Vec::new(),
            is_root: parent.is_none(),
        });
        id
    }

    fn adopt(&mut self, folder: FolderId, depth: usize) {
        if depth >= self.max_depth {
            return;
        }
        let path = self.folders[folder.0].path.clone();
        for entry in self.backing.list_dir(&path) {
            let child_path = join_path(&path, &entry.name);
            if entry.is_dir {
                if self.by_path.contains_key(&child_path) {
                    continue;
                }
                let sub = self.insert_folder(child_path, Some(folder));
                self.folders[folder.0].subfolders.push(sub);
                self.adopt(sub, depth + 1);
            } else {
                let file = FileId(self.files.len());
                self.files.push(FileObject {
                    filename: entry.name,
                    parent: Some(folder),
                    live: true,
                    audio: None,
                });
                self.folders[folder.0].files.push(file);
            }
        }
    }

    /// Creates a detached plain file.
    pub fn create_file(&mut self, name: &str) -> FileId {
        let id = FileId(self.files.len());
        self.files.push(FileObject {
            filename: name.to_string(),
            parent: None,
            live: true,
            audio: None,
        });
        id
    }

    /// Creates a detached audio file with empty metadata.
    pub fn create_audio(&mut self, name: &str) -> FileId {
        let id = self.create_file(name);
        self.files[id.0].audio = Some(AudioMeta::detached(name));
        id
    }

    // =========================================================================
    // Access
    // =========================================================================

    pub fn folder(&self, id: FolderId) -> &FolderObject {
        &self.folders[id.0]
    }

    pub fn file(&self, id: FileId) -> &FileObject {
        &self.files[id.0]
    }

    /// Full path of a file: its parent's path joined with the basename, or
    /// just the basename while detached.
    pub fn file_path(&self, id: FileId) -> String {
        let file = &self.files[id.0];
        match file.parent {
            Some(parent) => join_path(&self.folders[parent.0].path, &file.filename),
            None => file.filename.clone(),
        }
    }

    /// Every operation on a deleted handle is a `File not found` fault.
    pub fn ensure_live(&self, id: FileId, span: Span) -> RunResult<()> {
        if self.files[id.0].live {
            Ok(())
        } else {
            Err(Fault::new(DiagnosticKind::FileNotFound, span))
        }
    }

    /// File equality: same basename and same parent handle.
    pub fn files_equal(&self, a: FileId, b: FileId) -> bool {
        let (fa, fb) = (&self.files[a.0], &self.files[b.0]);
        fa.filename == fb.filename && fa.parent == fb.parent
    }

    /// Folder equality: same path and same parent handle.
    pub fn folders_equal(&self, a: FolderId, b: FolderId) -> bool {
        let (fa, fb) = (&self.folders[a.0], &self.folders[b.0]);
        fa.path == fb.path && fa.parent == fb.parent
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Reparents a file. The old parent stops listing it, the new parent
    /// lists it, and its path follows.
    pub fn move_file(&mut self, id: FileId, new_parent: FolderId, span: Span) -> RunResult<()> {
        self.ensure_live(id, span)?;
        self.detach(id);
        self.files[id.0].parent = Some(new_parent);
        self.folders[new_parent.0].files.push(id);
        Ok(())
    }

    /// Marks a file non-live and detaches it from its parent.
    pub fn delete_file(&mut self, id: FileId, span: Span) -> RunResult<()> {
        self.ensure_live(id, span)?;
        self.detach(id);
        self.files[id.0].parent = None;
        self.files[id.0].live = false;
        Ok(())
    }

    fn detach(&mut self, id: FileId) {
        if let Some(parent) = self.files[id.0].parent {
            self.folders[parent.0].files.retain(|&f| f != id);
        }
    }

    /// Attempts to interpret a file as audio.
    ///
    /// A file that already carries metadata (an `Audio(…)` construction or
    /// an earlier probe) succeeds immediately; otherwise the backing store
    /// is probed and the metadata filled in on success.
    pub fn probe_audio(&mut self, id: FileId, span: Span) -> RunResult<bool> {
        self.ensure_live(id, span)?;
        if self.files[id.0].audio.is_some() {
            return Ok(true);
        }
        let path = self.file_path(id);
        match self.backing.probe_audio(&path) {
            Some(meta) => {
                self.files[id.0].audio = Some(meta);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn audio_meta(&self, id: FileId, span: Span) -> RunResult<&AudioMeta> {
        self.ensure_live(id, span)?;
        self.files[id.0]
            .audio
            .as_ref()
            .ok_or_else(|| Fault::new(DiagnosticKind::FileNotFound, span))
    }

    fn audio_meta_mut(&mut self, id: FileId, span: Span) -> RunResult<&mut AudioMeta> {
        self.ensure_live(id, span)?;
        self.files[id.0]
            .audio
            .as_mut()
            .ok_or_else(|| Fault::new(DiagnosticKind::FileNotFound, span))
    }

    /// `cut(start, end)`: keeps the `[start, end)` slice of the track.
    /// The range must satisfy `0 <= start <= end <= length`.
    pub fn cut_audio(&mut self, id: FileId, start: i64, end: i64, span: Span) -> RunResult<()> {
        let meta = self.audio_meta_mut(id, span)?;
        if start < 0 || start > end || end > meta.length {
            return Err(Fault::new(DiagnosticKind::InvalidValue, span));
        }
        meta.length = end - start;
        Ok(())
    }

    /// `concat(other)`: appends the other track's length; `other` is
    /// unchanged.
    pub fn concat_audio(&mut self, id: FileId, other: FileId, span: Span) -> RunResult<()> {
        let other_length = self.audio_meta(other, span)?.length;
        let meta = self.audio_meta_mut(id, span)?;
        meta.length += other_length;
        Ok(())
    }

    pub fn change_title(&mut self, id: FileId, title: String, span: Span) -> RunResult<()> {
        self.audio_meta_mut(id, span)?.title = title;
        Ok(())
    }

    /// Rewrites the filename extension; content re-encoding is the backing
    /// bytes' concern and stays opaque.
    pub fn change_format(&mut self, id: FileId, format: &str, span: Span) -> RunResult<()> {
        self.audio_meta_mut(id, span)?;
        let format = format.trim_start_matches('.');
        let file = &mut self.files[id.0];
        let renamed = format!("{}.{}", stem(&file.filename), format);
        file.filename = renamed;
        Ok(())
    }

    /// Scales the opaque content bytes; only the blob changes.
    pub fn change_volume(&mut self, id: FileId, factor: f64, span: Span) -> RunResult<()> {
        let meta = self.audio_meta_mut(id, span)?;
        for byte in &mut meta.bytes {
            *byte = ((f64::from(*byte) * factor) as i64).clamp(0, 255) as u8;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_world() -> DomainWorld {
        let mut backing = MemoryBacking::new();
        backing.add_entry("/music", "rock", true);
        backing.add_entry("/music", "notes.txt", false);
        backing.add_entry("/music/rock", "song.mp3", false);
        backing.add_audio(
            "/music/rock/song.mp3",
            AudioMeta {
                length: 180_000,
                bitrate: 320_000,
                title: "song".into(),
                bytes: vec![1, 2, 3],
            },
        );
        DomainWorld::new(Box::new(backing), 16)
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/a//b/./c"), "/a/b/c");
        assert_eq!(normalize_path("/a/b/../c"), "/a/c");
        assert_eq!(normalize_path("a/b/"), "a/b");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("."), ".");
    }

    #[test]
    fn test_open_folder_adopts_tree() {
        let mut world = seeded_world();
        let root = world.open_folder("/music");
        assert!(world.folder(root).is_root);
        assert_eq!(world.folder(root).files.len(), 1);
        assert_eq!(world.folder(root).subfolders.len(), 1);

        let rock = world.folder(root).subfolders[0];
        assert_eq!(world.folder(rock).path, "/music/rock");
        assert!(!world.folder(rock).is_root);
        assert_eq!(world.folder(rock).parent, Some(root));
        assert_eq!(world.folder(rock).files.len(), 1);
    }

    #[test]
    fn test_open_folder_is_idempotent() {
        let mut world = seeded_world();
        let a = world.open_folder("/music");
        let b = world.open_folder("/music/");
        assert_eq!(a, b);
        // Children were not adopted twice.
        assert_eq!(world.folder(a).files.len(), 1);
    }

    #[test]
    fn test_depth_limit_omits_deeper_children() {
        let mut backing = MemoryBacking::new();
        backing.add_entry("/a", "b", true);
        backing.add_entry("/a/b", "c", true);
        backing.add_entry("/a/b/c", "d", true);
        let mut world = DomainWorld::new(Box::new(backing), 2);

        let a = world.open_folder("/a");
        let b = world.folder(a).subfolders[0];
        let c = world.folder(b).subfolders[0];
        // Depth limit reached: /a/b/c has no children in the mirror.
        assert!(world.folder(c).subfolders.is_empty());
    }

    #[test]
    fn test_move_keeps_references_consistent() {
        let mut world = seeded_world();
        let root = world.open_folder("/music");
        let target = world.open_folder("/backup");
        let file = world.folder(root).files[0];

        world.move_file(file, target, Span::DUMMY).unwrap();

        assert!(!world.folder(root).files.contains(&file));
        assert!(world.folder(target).files.contains(&file));
        assert_eq!(world.file(file).parent, Some(target));
        assert_eq!(world.file_path(file), "/backup/notes.txt");
    }

    #[test]
    fn test_delete_marks_non_live() {
        let mut world = seeded_world();
        let root = world.open_folder("/music");
        let file = world.folder(root).files[0];

        world.delete_file(file, Span::DUMMY).unwrap();

        assert!(!world.file(file).live);
        assert!(!world.folder(root).files.contains(&file));
        let err = world.delete_file(file, Span::DUMMY).unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::FileNotFound);
    }

    #[test]
    fn test_probe_audio_fills_metadata() {
        let mut world = seeded_world();
        let root = world.open_folder("/music");
        let rock = world.folder(root).subfolders[0];
        let song = world.folder(rock).files[0];

        assert!(world.probe_audio(song, Span::DUMMY).unwrap());
        let meta = world.audio_meta(song, Span::DUMMY).unwrap();
        assert_eq!(meta.length, 180_000);
        assert_eq!(meta.bitrate, 320_000);

        // A plain text file does not probe as audio.
        let notes = world.folder(root).files[0];
        assert!(!world.probe_audio(notes, Span::DUMMY).unwrap());
    }

    #[test]
    fn test_cut_and_concat() {
        let mut world = seeded_world();
        let a = world.create_audio("a.mp3");
        let b = world.create_audio("b.mp3");
        world.audio_meta_mut(a, Span::DUMMY).unwrap().length = 1000;
        world.audio_meta_mut(b, Span::DUMMY).unwrap().length = 500;

        world.cut_audio(a, 100, 600, Span::DUMMY).unwrap();
        assert_eq!(world.audio_meta(a, Span::DUMMY).unwrap().length, 500);

        world.concat_audio(a, b, Span::DUMMY).unwrap();
        assert_eq!(world.audio_meta(a, Span::DUMMY).unwrap().length, 1000);
        // The other track is unchanged.
        assert_eq!(world.audio_meta(b, Span::DUMMY).unwrap().length, 500);
    }

    #[test]
    fn test_cut_out_of_range() {
        let mut world = seeded_world();
        let a = world.create_audio("a.mp3");
        world.audio_meta_mut(a, Span::DUMMY).unwrap().length = 100;

        for (start, end) in [(-1, 50), (60, 50), (0, 101)] {
            let err = world.cut_audio(a, start, end, Span::DUMMY).unwrap_err();
            assert_eq!(err.kind, DiagnosticKind::InvalidValue);
        }
    }

    #[test]
    fn test_change_format_renames_extension() {
        let mut world = seeded_world();
        let a = world.create_audio("track.mp3");
        world.change_format(a, "wav", Span::DUMMY).unwrap();
        assert_eq!(world.file(a).filename, "track.wav");
    }

    #[test]
    fn test_detached_file_equality_by_name_and_parent() {
        let mut world = seeded_world();
        let a = world.create_file("same.txt");
        let b = world.create_file("same.txt");
        let c = world.create_file("other.txt");
        assert!(world.files_equal(a, b));
        assert!(!world.files_equal(a, c));
    }

    #[test]
    fn test_disk_backing_lists_real_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("song.mp3"), vec![0u8; 1600]).unwrap();

        let backing = DiskBacking;
        let entries = backing.list_dir(dir.path().to_str().unwrap());
        assert_eq!(entries.len(), 2);

        let meta = backing
            .probe_audio(dir.path().join("song.mp3").to_str().unwrap())
            .unwrap();
        assert_eq!(meta.bitrate, 128_000);
        assert_eq!(meta.length, 1600 * 8000 / 128_000);
        assert!(backing
            .probe_audio(dir.path().join("sub").to_str().unwrap())
            .is_none());
    }
}
