use std::error;
use std::ffi::CString;
use std::fmt;
use std::io;
use std::mem;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use inotify_sys as ffi;
use libc::{c_void, size_t};
use tracing::{debug, trace, warn};

use crate::events::{Event, RawRecords};
use crate::fd_guard::FdGuard;
use crate::mask::WatchMask;

// One record is at most the fixed header plus a NAME_MAX name and its
// terminating NUL. Sized for a burst of 1024 maximum-length records, so
// realistic reads fit without truncation.
const MAX_NAME_LEN: usize = 255;
const EVENT_BUF_LEN: usize = 1024 * (mem::size_of::<ffi::inotify_event>() + MAX_NAME_LEN + 1);

/// Controls whether reads on the inotify descriptor block
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReadMode {
    /// [`Watcher::listen`] blocks until the kernel has at least one event
    Blocking,

    /// [`Watcher::listen`] returns immediately when no events are pending
    ///
    /// Required if the watcher will be stopped asynchronously: a background
    /// listener over a blocking descriptor can only observe the stop signal
    /// once a further event arrives.
    NonBlocking,
}

/// An error that occurred while setting up a [`Watcher`]
#[derive(Debug)]
pub enum InitError {
    /// Creating the inotify instance failed
    Init(io::Error),

    /// Registering the watch for the given path failed
    AddWatch(io::Error),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Init(err) => {
                write!(f, "Error creating inotify instance: {err}")
            }
            Self::AddWatch(err) => {
                write!(f, "Error registering watch: {err}")
            }
        }
    }
}

impl error::Error for InitError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Init(err) | Self::AddWatch(err) => Some(err),
        }
    }
}

/// State shared between the owning thread and the background listener.
struct Inner {
    fd: FdGuard,
    path: PathBuf,
    callback: Box<dyn Fn(Event) + Send + Sync>,
    stop: AtomicBool,
}

impl Inner {
    /// One read-decode-dispatch pass.
    ///
    /// Performs exactly one read from the inotify descriptor into `buffer`,
    /// then walks the returned records and invokes the callback for each
    /// well-formed one, in buffer order.
    fn dispatch_pass(&self, buffer: &mut [u8]) -> io::Result<usize> {
        let num_bytes = unsafe {
            libc::read(
                *self.fd,
                buffer.as_mut_ptr() as *mut c_void,
                buffer.len() as size_t,
            )
        };

        let num_bytes = match num_bytes {
            -1 => {
                let error = io::Error::last_os_error();
                match error.kind() {
                    // Nothing pending (non-blocking mode), or the read was
                    // interrupted by a signal. No events this pass.
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => return Ok(0),
                    _ => return Err(error),
                }
            }
            _ => num_bytes as usize,
        };

        Ok(self.dispatch_buffer(buffer, num_bytes))
    }

    /// Walks `num_bytes` of raw records in `buffer`, dispatching each record
    /// whose name length and mask are both non-zero. Returns the number of
    /// events dispatched.
    fn dispatch_buffer(&self, buffer: &[u8], num_bytes: usize) -> usize {
        let mut dispatched = 0;

        for record in RawRecords::new(buffer, num_bytes) {
            if record.mask & ffi::IN_Q_OVERFLOW != 0 {
                warn!(
                    path = %self.path.display(),
                    "kernel event queue overflowed, events were lost"
                );
            }

            // A record without a name or without a mask describes nothing we
            // can hand to the callback. It still consumes its full length.
            if record.len == 0 || record.mask == 0 {
                continue;
            }

            let event = Event::new(&self.path, &record);
            trace!(event = %event, "dispatching");
            (self.callback)(event);
            dispatched += 1;
        }

        dispatched
    }
}

/// Watches one directory and dispatches its events to a callback
///
/// A `Watcher` owns one inotify instance with a single watch registered for
/// the directory given at construction. Events are delivered to the callback
/// either by calling [`listen`] (one blocking read-and-dispatch pass) or by
/// starting a background listener with [`listen_async`].
///
/// Dropping the watcher stops the background listener, waits for it to
/// finish, and closes the inotify descriptor, in that order. No callback
/// invocation happens after the drop returns.
///
/// [`listen`]: Self::listen
/// [`listen_async`]: Self::listen_async
///
/// # Examples
///
/// ```no_run
/// use dirwatch::Watcher;
///
/// let mut watcher = Watcher::new("/tmp/watched", |event| {
///     println!("{}", event);
/// })
/// .expect("Failed to register watch");
///
/// watcher.listen().expect("Failed to read events");
/// ```
pub struct Watcher {
    inner: Arc<Inner>,
    buffer: Box<[u8]>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Watcher {
    /// Creates a watcher for the given directory with the default settings
    ///
    /// Watches for created, deleted and modified entries
    /// ([`WatchMask::DEFAULT`]) over a blocking descriptor. Use
    /// [`with_options`](Self::with_options) to pick the mask and read mode.
    ///
    /// # Errors
    ///
    /// See [`with_options`](Self::with_options).
    pub fn new<P, F>(path: P, callback: F) -> Result<Watcher, InitError>
    where
        P: AsRef<Path>,
        F: Fn(Event) + Send + Sync + 'static,
    {
        Self::with_options(path, WatchMask::DEFAULT, ReadMode::Blocking, callback)
    }

    /// Creates a watcher for the given directory
    ///
    /// Opens an inotify instance ([`inotify_sys::inotify_init1`], always with
    /// `IN_CLOEXEC`, plus `IN_NONBLOCK` for [`ReadMode::NonBlocking`]) and
    /// registers `path` with the given mask. Trailing slashes are stripped
    /// from `path` before it is stored.
    ///
    /// The callback is invoked once per event, on whichever thread runs the
    /// dispatch pass. It must not block indefinitely, as that stalls the
    /// decode loop; a fallible callback has to report failures through a
    /// side channel of its own.
    ///
    /// # Errors
    ///
    /// Returns [`InitError::Init`] if the inotify instance could not be
    /// created, and [`InitError::AddWatch`] if the watch could not be
    /// registered, each wrapping the error reported by the kernel.
    pub fn with_options<P, F>(
        path: P,
        mask: WatchMask,
        mode: ReadMode,
        callback: F,
    ) -> Result<Watcher, InitError>
    where
        P: AsRef<Path>,
        F: Fn(Event) + Send + Sync + 'static,
    {
        let mut flags = ffi::IN_CLOEXEC;
        if mode == ReadMode::NonBlocking {
            flags |= ffi::IN_NONBLOCK;
        }

        let fd = unsafe { ffi::inotify_init1(flags) };
        if fd == -1 {
            return Err(InitError::Init(io::Error::last_os_error()));
        }
        let fd = FdGuard::new(fd);

        let path = strip_trailing_slashes(path.as_ref());

        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|err| InitError::AddWatch(err.into()))?;
        let wd = unsafe { ffi::inotify_add_watch(*fd, c_path.as_ptr(), mask.bits()) };
        if wd == -1 {
            return Err(InitError::AddWatch(io::Error::last_os_error()));
        }

        debug!(path = %path.display(), ?mask, ?mode, "watch registered");

        Ok(Watcher {
            inner: Arc::new(Inner {
                fd,
                path,
                callback: Box::new(callback),
                stop: AtomicBool::new(false),
            }),
            buffer: vec![0u8; EVENT_BUF_LEN].into_boxed_slice(),
            thread: None,
        })
    }

    /// The watched directory, with trailing slashes stripped
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Performs one read-decode-dispatch pass
    ///
    /// Reads once from the inotify descriptor — blocking until at least one
    /// event is available if the watcher was created with
    /// [`ReadMode::Blocking`] — and invokes the callback for every
    /// well-formed record in the returned buffer, in kernel order. Returns
    /// the number of events dispatched; `Ok(0)` means nothing was pending.
    ///
    /// This method does not loop. Continuous coverage requires calling it
    /// repeatedly, or [`listen_async`](Self::listen_async). It must not be
    /// called while a background listener is running, as the two would race
    /// for the same descriptor.
    ///
    /// # Errors
    ///
    /// Directly returns the error from the underlying read, without adding
    /// any error conditions of its own. An empty or interrupted read is not
    /// an error.
    pub fn listen(&mut self) -> io::Result<usize> {
        self.inner.dispatch_pass(&mut self.buffer)
    }

    /// Starts a background listener
    ///
    /// Spawns one dedicated thread that repeats the [`listen`](Self::listen)
    /// pass until [`stop`](Self::stop) is called or the watcher is dropped.
    /// Does nothing if the listener is already running.
    ///
    /// The stop signal is observed between passes only; over a
    /// [`ReadMode::Blocking`] descriptor the listener cannot be interrupted
    /// mid-read, so teardown may wait for one more event to arrive. Create
    /// the watcher with [`ReadMode::NonBlocking`] for bounded-time teardown.
    ///
    /// # Errors
    ///
    /// Directly returns the error from spawning the thread.
    pub fn listen_async(&mut self) -> io::Result<()> {
        if self.thread.is_some() {
            return Ok(());
        }

        self.inner.stop.store(false, Ordering::Release);

        let inner = Arc::clone(&self.inner);
        let handle = thread::Builder::new()
            .name("dirwatch-listener".into())
            .spawn(move || {
                debug!(path = %inner.path.display(), "listener started");

                let mut buffer = vec![0u8; EVENT_BUF_LEN].into_boxed_slice();
                while !inner.stop.load(Ordering::Acquire) {
                    match inner.dispatch_pass(&mut buffer) {
                        // Non-blocking and nothing pending; don't spin hot.
                        Ok(0) => thread::yield_now(),
                        Ok(_) => {}
                        Err(err) => {
                            warn!(error = %err, "read failed, listener stopping");
                            break;
                        }
                    }
                }

                debug!(path = %inner.path.display(), "listener stopped");
            })?;

        self.thread = Some(handle);

        Ok(())
    }

    /// Stops the background listener, if one is running
    ///
    /// Sets the stop signal and waits for the listener thread to observe it
    /// and exit. Once `stop` returns, no further callback invocation occurs
    /// until [`listen`](Self::listen) or
    /// [`listen_async`](Self::listen_async) is called again.
    ///
    /// Over a [`ReadMode::Blocking`] descriptor this can wait indefinitely;
    /// see [`listen_async`](Self::listen_async).
    pub fn stop(&mut self) {
        if let Some(handle) = self.thread.take() {
            self.inner.stop.store(true, Ordering::Release);
            let _ = handle.join();
        }
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        // Join before the last reference to the descriptor goes away, so the
        // fd outlives every dispatch.
        self.stop();
    }
}

fn strip_trailing_slashes(path: &Path) -> PathBuf {
    let bytes = path.as_os_str().as_bytes();

    let mut end = bytes.len();
    while end > 0 && bytes[end - 1] == b'/' {
        end -= 1;
    }

    PathBuf::from(std::ffi::OsString::from_vec(bytes[..end].to_vec()))
}
