#![warn(missing_docs)]

//! Callback-driven wrapper around Linux's inotify API.
//!
//! [Inotify][wiki] is a linux kernel mechanism for monitoring
//! changes to filesystems' contents.
//!
//! > The inotify API provides a mechanism for monitoring filesystem
//! > events. Inotify can be used to monitor individual files, or to
//! > monitor directories. When a directory is monitored, inotify will
//! > return events for the directory itself, and for files inside the
//! > directory.
//!
//! This crate covers the directory case: a [`Watcher`] registers one watch
//! for one directory and hands each decoded [`Event`] to a callback, either
//! from a single blocking [`Watcher::listen`] pass or from a dedicated
//! background thread started with [`Watcher::listen_async`].
//!
//! See the [man page][inotify7] for the semantics of the underlying
//! mechanism, which this crate follows closely.
//!
//! [wiki]: https://en.wikipedia.org/wiki/Inotify
//! [inotify7]: https://man7.org/linux/man-pages/man7/inotify.7.html
//!
//! # Examples
//!
//! ```no_run
//! use dirwatch::{ReadMode, WatchMask, Watcher};
//!
//! let mut watcher = Watcher::with_options(
//!     "/tmp/watched",
//!     WatchMask::CREATE | WatchMask::DELETE,
//!     ReadMode::Blocking,
//!     |event| println!("{}", event),
//! )
//! .expect("Failed to register watch");
//!
//! // One blocking read-and-dispatch pass.
//! watcher.listen().expect("Failed to read events");
//! ```

mod events;
mod fd_guard;
mod mask;
mod watcher;

pub use crate::events::Event;
pub use crate::mask::{EventMask, WatchMask};
pub use crate::watcher::{InitError, ReadMode, Watcher};
