use std::ops::Deref;
use std::os::unix::io::RawFd;

/// Owns an inotify file descriptor and closes it when dropped.
///
/// The surrounding watcher state, and with it the guard, is shared between
/// the owning thread and the background listener. The descriptor is only
/// ever read from, so no locking is required.
#[derive(Debug)]
pub(crate) struct FdGuard {
    fd: RawFd,
}

impl FdGuard {
    pub(crate) fn new(fd: RawFd) -> Self {
        FdGuard { fd }
    }
}

impl Deref for FdGuard {
    type Target = RawFd;

    fn deref(&self) -> &RawFd {
        &self.fd
    }
}

impl Drop for FdGuard {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
