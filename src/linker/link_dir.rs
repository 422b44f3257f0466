use std::ffi::{CStr, CString};
use std::fs::{File, Metadata, OpenOptions};
use std::io;
use std::mem::MaybeUninit;
use std::os::unix::fs::{MetadataExt, OpenOptionsExt};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to link {link}: {source}")]
pub struct LinkError {
    pub link: PathBuf,
    #[source]
    pub source: io::Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Created,
    /// An existing link was removed and re-created.
    Replaced,
    /// A link already existed and overwriting was off.
    AlreadyLink,
    /// A regular file or directory holds the name; nothing was touched.
    OccupiedByFile,
}

/// A directory in which aliases can be created.
pub trait LinkDir {
    /// Ensure an entry called `name` exists as a link to `target`.
    fn ensure_link(&self, target: &str, name: &str, overwrite: bool)
        -> Result<LinkOutcome, LinkError>;
}

/// Device and inode of a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirId {
    dev: u64,
    ino: u64,
}

impl DirId {
    pub fn of(metadata: &Metadata) -> Self {
        Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        }
    }
}

/// An open directory in which links are created with relative targets.
///
/// The directory is opened once. Every lookup, removal and creation goes
/// through that handle with the `*at` calls, so renaming or replacing any
/// ancestor afterwards does not redirect the links, and an existing entry is
/// never followed to decide what to do with it.
pub struct FsLinkDir {
    path: PathBuf,
    handle: File,
    dry_run: bool,
}

impl FsLinkDir {
    /// Open `dir`. Fails when `dir` itself is a symlink.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, LinkError> {
        let path = dir.into();
        let handle = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_DIRECTORY | libc::O_NOFOLLOW | libc::O_CLOEXEC)
            .open(&path)
            .map_err(|source| LinkError {
                link: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            handle,
            dry_run: false,
        })
    }

    /// Report outcomes without touching the filesystem.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The path the directory was opened by.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identity of the opened directory, not of whatever its path names now.
    pub fn identity(&self) -> io::Result<DirId> {
        self.handle.metadata().map(|meta| DirId::of(&meta))
    }

    fn is_link(&self, name: &CStr) -> io::Result<bool> {
        let mut stat = MaybeUninit::<libc::stat>::uninit();
        // SAFETY: the handle is an open directory, `name` is NUL-terminated
        // and `stat` is large enough for the kernel to fill.
        let ret = unsafe {
            libc::fstatat(
                self.handle.as_raw_fd(),
                name.as_ptr(),
                stat.as_mut_ptr(),
                libc::AT_SYMLINK_NOFOLLOW,
            )
        };
        if ret != 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: fstatat succeeded, so the buffer is initialised.
        let stat = unsafe { stat.assume_init() };
        Ok((stat.st_mode & libc::S_IFMT) == libc::S_IFLNK)
    }

    fn unlink(&self, name: &CStr) -> io::Result<()> {
        // SAFETY: valid directory handle and NUL-terminated name.
        let ret = unsafe { libc::unlinkat(self.handle.as_raw_fd(), name.as_ptr(), 0) };
        if ret != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn symlink(&self, target: &CStr, name: &CStr) -> io::Result<()> {
        // SAFETY: valid directory handle and NUL-terminated strings.
        let ret =
            unsafe { libc::symlinkat(target.as_ptr(), self.handle.as_raw_fd(), name.as_ptr()) };
        if ret != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl LinkDir for FsLinkDir {
    fn ensure_link(
        &self,
        target: &str,
        name: &str,
        overwrite: bool,
    ) -> Result<LinkOutcome, LinkError> {
        let wrap = |source: io::Error| LinkError {
            link: self.path.join(name),
            source,
        };
        let c_name = CString::new(name).map_err(|e| wrap(e.into()))?;

        let outcome = match self.is_link(&c_name) {
            Ok(false) => return Ok(LinkOutcome::OccupiedByFile),
            Ok(true) if !overwrite => return Ok(LinkOutcome::AlreadyLink),
            Ok(true) => LinkOutcome::Replaced,
            Err(e) if e.kind() == io::ErrorKind::NotFound => LinkOutcome::Created,
            Err(e) => return Err(wrap(e)),
        };

        if self.dry_run {
            return Ok(outcome);
        }

        if outcome == LinkOutcome::Replaced {
            self.unlink(&c_name).map_err(wrap)?;
        }
        let c_target = CString::new(target).map_err(|e| wrap(e.into()))?;
        self.symlink(&c_target, &c_name).map_err(wrap)?;

        Ok(outcome)
    }
}
