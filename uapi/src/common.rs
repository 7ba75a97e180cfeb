// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: MIT

use errno::Errno;
use libc::{c_long, pollfd, ppoll, sigset_t, time_t, timespec, POLLIN, POLLPRI};
use std::ffi::OsStr;
use std::fs::File;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::AsRawFd;
use std::ptr;
use std::time::Duration;

/// Wait for the file to have an event available to read.
///
/// Returns false if the timeout expired before an event became available.
///
/// * `f` - The line request file.
/// * `timeout` - The maximum time to wait, or `None` to wait indefinitely.
pub fn wait_event(f: &File, timeout: Option<Duration>) -> Result<bool> {
    let mut pfd = pollfd {
        fd: f.as_raw_fd(),
        events: POLLIN | POLLPRI,
        revents: 0,
    };
    let ts = timeout.map(|d| timespec {
        tv_sec: d.as_secs() as time_t,
        tv_nsec: d.subsec_nanos() as c_long,
    });
    let tsp = match &ts {
        Some(ts) => ts as *const timespec,
        None => ptr::null(),
    };
    // SAFETY: pfd and ts outlive the call.
    match unsafe { ppoll(ptr::addr_of_mut!(pfd), 1, tsp, ptr::null::<sigset_t>()) } {
        -1 => Err(Error::from_errno()),
        0 => Ok(false),
        _ => Ok(true),
    }
}

/// Read as many raw events as are available, and fit, into the buffer.
///
/// Blocks if no events are available.
///
/// Returns the number of bytes read, which the caller must check against
/// the size of the expected event.
///
/// * `f` - The line request file.
/// * `buf` - The buffer to populate. Aligned to u64 as the events contain u64 fields.
pub fn read_event(f: &File, buf: &mut [u64]) -> Result<usize> {
    // SAFETY: the kernel writes at most buf.len() * 8 bytes into buf.
    let n = unsafe {
        libc::read(
            f.as_raw_fd(),
            buf.as_mut_ptr() as *mut libc::c_void,
            buf.len() * 8,
        )
    };
    if n < 0 {
        return Err(Error::from_errno());
    }
    Ok(n as usize)
}

pub(crate) const IOCTL_MAGIC: u8 = 0xb4;

/// The result returned by [`pulsecount_uapi`] functions.
///
/// [`pulsecount_uapi`]: crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`pulsecount_uapi`] functions.
///
/// [`pulsecount_uapi`]: crate
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// An error returned from an underlying system call.
    #[error(transparent)]
    Os(Errno),
}

impl Error {
    /// Capture the errno left by the most recent failed system call.
    pub(crate) fn from_errno() -> Error {
        Error::Os(errno::errno())
    }

    /// The raw OS error number behind the error.
    pub fn errno(&self) -> i32 {
        match self {
            Error::Os(e) => e.0,
        }
    }
}

/// The size of the name buffer, including the NUL terminator.
pub const NAME_MAX: usize = 32;

/// A uAPI name string, such as the consumer label of a request.
#[repr(C)]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Name([u8; NAME_MAX]);

impl Name {
    /// Checks whether the Name is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }

    /// The length of the contained name.
    #[inline]
    pub fn strlen(&self) -> usize {
        self.0.iter().position(|&x| x == 0).unwrap_or(self.0.len())
    }

    /// Convert the contained name to an OsStr.
    pub fn as_os_str(&self) -> &OsStr {
        OsStr::from_bytes(&self.0[..self.strlen()])
    }

    /// The raw buffer, as passed to the kernel.
    pub fn as_bytes(&self) -> &[u8; NAME_MAX] {
        &self.0
    }

    /// Construct a Name from a byte slice.
    ///
    /// Input beyond `NAME_MAX - 1` bytes is dropped so the buffer always
    /// retains a NUL terminator.
    /// May result in invalid UTF-8 if truncated in the middle of a multi-byte character.
    pub fn from_bytes(s: &[u8]) -> Name {
        let mut n = Name::default();
        let len = s.len().min(NAME_MAX - 1);
        n.0[..len].copy_from_slice(&s[..len]);
        n
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name::from_bytes(s.as_bytes())
    }
}

/// An identifier for a line on a particular chip.
pub type Offset = u32;

/// The maximum number of lines that may be requested in a single request.
pub const LINES_MAX: usize = 64;

/// A collection of line offsets.
#[repr(C)]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Offsets([Offset; LINES_MAX]);

impl Offsets {
    /// Create offsets from a slice.
    pub fn from_slice(s: &[Offset]) -> Self {
        let mut n = Offsets::default();
        for (src, dst) in s.iter().zip(n.0.iter_mut()) {
            *dst = *src;
        }
        n
    }

    /// Get the indexed offset from the set.
    #[inline]
    pub fn get(&self, idx: usize) -> Offset {
        self.0[idx]
    }
}

impl Default for Offsets {
    fn default() -> Self {
        Offsets([0; LINES_MAX])
    }
}

/// Space reserved for future use.
///
/// Sized in multiples of u32 words.
#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[doc(hidden)]
pub struct Padding<const SIZE: usize>([u32; SIZE]);

impl<const SIZE: usize> Default for Padding<SIZE> {
    fn default() -> Self {
        Padding([0; SIZE])
    }
}

impl<const SIZE: usize> Padding<SIZE> {
    pub fn is_zeroed(&self) -> bool {
        self.0.iter().all(|x| *x == 0)
    }
}
