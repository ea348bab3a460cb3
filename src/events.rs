use std::ffi::{OsStr, OsString};
use std::fmt;
use std::mem;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use inotify_sys as ffi;

use crate::mask::EventMask;

/// A file system event, as handed to the watcher's callback
///
/// Describes one change inside the watched directory. Events are dispatched
/// in the order the kernel reported them and are owned by the callback for
/// the duration of the call.
#[derive(Clone, Debug)]
pub struct Event {
    /// The watched directory, with trailing slashes stripped
    pub path: PathBuf,

    /// Name of the affected entry inside the watched directory
    ///
    /// Empty if the event concerns the watched directory itself.
    pub file: OsString,

    /// Indicates what kind of event this is
    pub mask: EventMask,
}

impl Event {
    pub(crate) fn new(path: &Path, record: &RawRecord) -> Self {
        Event {
            path: path.to_path_buf(),
            file: OsStr::from_bytes(record.name).to_os_string(),
            mask: EventMask::from_bits_retain(record.mask),
        }
    }

    /// Returns `true` if the affected entry is itself a directory
    pub fn is_dir(&self) -> bool {
        self.mask.contains(EventMask::ISDIR)
    }

    /// The symbolic name of this event's kind
    ///
    /// See [`EventMask::kind_name`].
    pub fn kind_name(&self) -> &'static str {
        self.mask.kind_name()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {:?} in {}",
            self.kind_name(),
            self.file,
            self.path.display(),
        )
    }
}

/// One raw `inotify_event` record, as it appears in a read buffer
///
/// `len` is the record's declared name length, including NUL padding; `name`
/// is the name with that padding removed and may be empty.
pub(crate) struct RawRecord<'a> {
    pub mask: u32,
    pub len: u32,
    pub name: &'a [u8],
}

/// Iterator over the raw records in the buffer filled by one read
///
/// Walks the buffer front to back, yielding one [`RawRecord`] per
/// `inotify_event` header. A record whose declared name length would run
/// past the end of the buffer terminates the walk.
pub(crate) struct RawRecords<'a> {
    buffer: &'a [u8],
    num_bytes: usize,
    pos: usize,
}

impl<'a> RawRecords<'a> {
    pub(crate) fn new(buffer: &'a [u8], num_bytes: usize) -> Self {
        debug_assert!(num_bytes <= buffer.len());

        RawRecords {
            buffer,
            num_bytes,
            pos: 0,
        }
    }
}

impl<'a> Iterator for RawRecords<'a> {
    type Item = RawRecord<'a>;

    fn next(&mut self) -> Option<RawRecord<'a>> {
        let header_size = mem::size_of::<ffi::inotify_event>();

        if self.pos + header_size > self.num_bytes {
            return None;
        }

        // The byte buffer has alignment 1 and `inotify_event` a higher one,
        // so the header must be read through `read_unaligned`.
        let event_ptr = self.buffer[self.pos..].as_ptr() as *const ffi::inotify_event;
        let event = unsafe { event_ptr.read_unaligned() };

        let record_end = self.pos + header_size + event.len as usize;
        if record_end > self.num_bytes {
            // Truncated record; never read past what the kernel wrote.
            self.pos = self.num_bytes;
            return None;
        }

        // The kernel pads names with NULs up to the declared length. The
        // `unwrap` is safe, as `splitn` always yields at least one item.
        let name = &self.buffer[self.pos + header_size..record_end];
        let name = name.splitn(2, |b| b == &0u8).next().unwrap();

        self.pos = record_end;

        Some(RawRecord {
            mask: event.mask,
            len: event.len,
            name,
        })
    }
}
