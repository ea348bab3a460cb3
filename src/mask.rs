use bitflags::bitflags;
use inotify_sys as ffi;

bitflags! {
    /// Describes which file system events a [`Watcher`] should report
    ///
    /// Passed to [`Watcher::with_options`] to select the event kinds the
    /// kernel will deliver for the watched directory. Constants can be
    /// combined with `|`; [`WatchMask::DEFAULT`] covers the common case of
    /// watching for created, deleted and modified entries.
    ///
    /// [`Watcher`]: crate::Watcher
    /// [`Watcher::with_options`]: crate::Watcher::with_options
    #[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
    pub struct WatchMask: u32 {
        /// File was accessed
        ///
        /// See [`inotify_sys::IN_ACCESS`].
        const ACCESS = ffi::IN_ACCESS;

        /// Metadata (permissions, timestamps, ...) changed
        ///
        /// See [`inotify_sys::IN_ATTRIB`].
        const ATTRIB = ffi::IN_ATTRIB;

        /// File opened for writing was closed
        ///
        /// See [`inotify_sys::IN_CLOSE_WRITE`].
        const CLOSE_WRITE = ffi::IN_CLOSE_WRITE;

        /// File or directory not opened for writing was closed
        ///
        /// See [`inotify_sys::IN_CLOSE_NOWRITE`].
        const CLOSE_NOWRITE = ffi::IN_CLOSE_NOWRITE;

        /// File/directory created in the watched directory
        ///
        /// See [`inotify_sys::IN_CREATE`].
        const CREATE = ffi::IN_CREATE;

        /// File/directory deleted from the watched directory
        ///
        /// See [`inotify_sys::IN_DELETE`].
        const DELETE = ffi::IN_DELETE;

        /// The watched directory was itself deleted
        ///
        /// See [`inotify_sys::IN_DELETE_SELF`].
        const DELETE_SELF = ffi::IN_DELETE_SELF;

        /// File was modified
        ///
        /// See [`inotify_sys::IN_MODIFY`].
        const MODIFY = ffi::IN_MODIFY;

        /// The watched directory was itself moved
        ///
        /// See [`inotify_sys::IN_MOVE_SELF`].
        const MOVE_SELF = ffi::IN_MOVE_SELF;

        /// File was renamed/moved; watched directory contained the old name
        ///
        /// See [`inotify_sys::IN_MOVED_FROM`].
        const MOVED_FROM = ffi::IN_MOVED_FROM;

        /// File was renamed/moved; watched directory contains the new name
        ///
        /// See [`inotify_sys::IN_MOVED_TO`].
        const MOVED_TO = ffi::IN_MOVED_TO;

        /// File or directory was opened
        ///
        /// See [`inotify_sys::IN_OPEN`].
        const OPEN = ffi::IN_OPEN;

        /// Watch for created, deleted and modified entries
        ///
        /// This is the mask used by [`Watcher::new`].
        ///
        /// [`Watcher::new`]: crate::Watcher::new
        const DEFAULT = ffi::IN_CREATE | ffi::IN_DELETE | ffi::IN_MODIFY;

        /// Watch for all events
        ///
        /// See [`inotify_sys::IN_ALL_EVENTS`].
        const ALL_EVENTS = ffi::IN_ALL_EVENTS;

        /// Watch for both [`MOVED_FROM`](Self::MOVED_FROM) and
        /// [`MOVED_TO`](Self::MOVED_TO)
        ///
        /// See [`inotify_sys::IN_MOVE`].
        const MOVE = ffi::IN_MOVE;

        /// Watch for both [`CLOSE_WRITE`](Self::CLOSE_WRITE) and
        /// [`CLOSE_NOWRITE`](Self::CLOSE_NOWRITE)
        ///
        /// See [`inotify_sys::IN_CLOSE`].
        const CLOSE = ffi::IN_CLOSE;

        /// Don't dereference the path if it is a symbolic link
        ///
        /// See [`inotify_sys::IN_DONT_FOLLOW`].
        const DONT_FOLLOW = ffi::IN_DONT_FOLLOW;

        /// Filter events for directory entries that have been unlinked
        ///
        /// See [`inotify_sys::IN_EXCL_UNLINK`].
        const EXCL_UNLINK = ffi::IN_EXCL_UNLINK;

        /// If a kernel-side watch for the inode exists, amend it instead of
        /// replacing it
        ///
        /// See [`inotify_sys::IN_MASK_ADD`].
        const MASK_ADD = ffi::IN_MASK_ADD;

        /// Only receive one event, then drop the kernel-side watch
        ///
        /// See [`inotify_sys::IN_ONESHOT`].
        const ONESHOT = ffi::IN_ONESHOT;

        /// Only watch the path if it is a directory
        ///
        /// See [`inotify_sys::IN_ONLYDIR`].
        const ONLYDIR = ffi::IN_ONLYDIR;
    }
}

bitflags! {
    /// Indicates the kind of an [`Event`]
    ///
    /// Retrieved from an [`Event`] via its `mask` field. A mask delivered by
    /// the kernel carries at most one of the semantic kind bits, optionally
    /// combined with [`ISDIR`](Self::ISDIR) when the affected entry is a
    /// directory.
    ///
    /// [`Event`]: crate::Event
    #[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
    pub struct EventMask: u32 {
        /// File was accessed
        const ACCESS = ffi::IN_ACCESS;

        /// File was modified
        const MODIFY = ffi::IN_MODIFY;

        /// Metadata (permissions, timestamps, ...) changed
        const ATTRIB = ffi::IN_ATTRIB;

        /// File opened for writing was closed
        const CLOSE_WRITE = ffi::IN_CLOSE_WRITE;

        /// File or directory not opened for writing was closed
        const CLOSE_NOWRITE = ffi::IN_CLOSE_NOWRITE;

        /// File or directory was opened
        const OPEN = ffi::IN_OPEN;

        /// File was renamed/moved; watched directory contained the old name
        const MOVED_FROM = ffi::IN_MOVED_FROM;

        /// File was renamed/moved; watched directory contains the new name
        const MOVED_TO = ffi::IN_MOVED_TO;

        /// File/directory created in the watched directory
        const CREATE = ffi::IN_CREATE;

        /// File/directory deleted from the watched directory
        const DELETE = ffi::IN_DELETE;

        /// The watched directory was itself deleted
        const DELETE_SELF = ffi::IN_DELETE_SELF;

        /// The watched directory was itself moved
        const MOVE_SELF = ffi::IN_MOVE_SELF;

        /// File system containing the watched directory was unmounted
        ///
        /// An event with [`IGNORED`](Self::IGNORED) will subsequently be
        /// delivered for the same watch.
        const UNMOUNT = ffi::IN_UNMOUNT;

        /// The kernel's event queue overflowed
        ///
        /// Events have presumably been lost.
        const Q_OVERFLOW = ffi::IN_Q_OVERFLOW;

        /// The watch was removed
        ///
        /// Delivered when the watch is dropped by the kernel, for example
        /// because the watched directory was deleted or its file system was
        /// unmounted.
        const IGNORED = ffi::IN_IGNORED;

        /// The affected entry is itself a directory
        ///
        /// Orthogonal to the kind bits above.
        const ISDIR = ffi::IN_ISDIR;
    }
}

impl EventMask {
    /// Fixed kind-to-name table. Exactly one semantic bit per entry.
    const KIND_NAMES: &'static [(EventMask, &'static str)] = &[
        (EventMask::ACCESS, "ACCESS"),
        (EventMask::MODIFY, "MODIFY"),
        (EventMask::ATTRIB, "ATTRIB"),
        (EventMask::CLOSE_WRITE, "CLOSE_WRITE"),
        (EventMask::CLOSE_NOWRITE, "CLOSE_NOWRITE"),
        (EventMask::OPEN, "OPEN"),
        (EventMask::MOVED_FROM, "MOVED_FROM"),
        (EventMask::MOVED_TO, "MOVED_TO"),
        (EventMask::CREATE, "CREATE"),
        (EventMask::DELETE, "DELETE"),
        (EventMask::DELETE_SELF, "DELETE_SELF"),
        (EventMask::MOVE_SELF, "MOVE_SELF"),
        (EventMask::UNMOUNT, "UNMOUNT"),
        (EventMask::Q_OVERFLOW, "Q_OVERFLOW"),
        (EventMask::IGNORED, "IGNORED"),
    ];

    /// Returns the symbolic name of this mask's event kind
    ///
    /// The [`ISDIR`](Self::ISDIR) marker is ignored; the remaining bits must
    /// match exactly one known kind. Any other value, including an empty mask
    /// or a mask with several kind bits set, maps to `"UNKNOWN"`.
    pub fn kind_name(self) -> &'static str {
        let kind = self.difference(EventMask::ISDIR);

        EventMask::KIND_NAMES
            .iter()
            .find(|(mask, _)| kind == *mask)
            .map(|(_, name)| *name)
            .unwrap_or("UNKNOWN")
    }
}

#[cfg(test)]
mod tests {
    use super::{EventMask, WatchMask};

    #[test]
    fn kind_names_should_match_the_fixed_table() {
        for (mask, name) in EventMask::KIND_NAMES {
            assert_eq!(*name, mask.kind_name());

            // The directory marker must not influence the name.
            assert_eq!(*name, (*mask | EventMask::ISDIR).kind_name());
        }
    }

    #[test]
    fn values_outside_the_table_should_map_to_the_sentinel() {
        assert_eq!("UNKNOWN", EventMask::empty().kind_name());
        assert_eq!("UNKNOWN", EventMask::ISDIR.kind_name());
        assert_eq!(
            "UNKNOWN",
            (EventMask::ACCESS | EventMask::MODIFY).kind_name()
        );
        assert_eq!("UNKNOWN", EventMask::from_bits_retain(0x0100_0000).kind_name());
    }

    #[test]
    fn default_watch_mask_should_cover_create_delete_modify() {
        assert_eq!(
            WatchMask::CREATE | WatchMask::DELETE | WatchMask::MODIFY,
            WatchMask::DEFAULT,
        );
    }

    #[test]
    fn wire_values_should_match_the_kernel_abi() {
        assert_eq!(0x0000_0001, EventMask::ACCESS.bits());
        assert_eq!(0x0000_0002, EventMask::MODIFY.bits());
        assert_eq!(0x0000_0004, EventMask::ATTRIB.bits());
        assert_eq!(0x0000_0008, EventMask::CLOSE_WRITE.bits());
        assert_eq!(0x0000_0010, EventMask::CLOSE_NOWRITE.bits());
        assert_eq!(0x0000_0020, EventMask::OPEN.bits());
        assert_eq!(0x0000_0040, EventMask::MOVED_FROM.bits());
        assert_eq!(0x0000_0080, EventMask::MOVED_TO.bits());
        assert_eq!(0x0000_0100, EventMask::CREATE.bits());
        assert_eq!(0x0000_0200, EventMask::DELETE.bits());
        assert_eq!(0x0000_0400, EventMask::DELETE_SELF.bits());
        assert_eq!(0x0000_0800, EventMask::MOVE_SELF.bits());
        assert_eq!(0x0000_2000, EventMask::UNMOUNT.bits());
        assert_eq!(0x0000_4000, EventMask::Q_OVERFLOW.bits());
        assert_eq!(0x0000_8000, EventMask::IGNORED.bits());
        assert_eq!(0x4000_0000, EventMask::ISDIR.bits());
    }
}
