// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::request::{Config, Request};
use crate::{Error, Result};
use errno::Errno;
use pulsecount_uapi::v2;
use std::fs::File;
use std::os::unix::prelude::AsRawFd;
use std::path::{Path, PathBuf};

/// A builder of line requests.
///
/// # Examples
/// Request line 26 for counting falling edges:
/// ```no_run
/// # fn example() -> Result<(), pulsecount::Error> {
/// use pulsecount::line::EdgeMode;
/// use pulsecount::request::{Builder, Config};
///
/// let mut cfg = Config::new(26);
/// cfg.with_edge(EdgeMode::Falling);
/// let req = Builder::new("/dev/gpiochip0", cfg).request()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Builder {
    chip: PathBuf,
    cfg: Config,
}

impl Builder {
    /// Start building a request for a line on the given chip.
    ///
    /// * `chip` - The path to the GPIO character device.
    /// * `cfg` - The configuration of the requested line.
    pub fn new<P: Into<PathBuf>>(chip: P, cfg: Config) -> Self {
        Builder {
            chip: chip.into(),
            cfg,
        }
    }

    /// The path to the chip the line will be requested from.
    pub fn chip(&self) -> &Path {
        &self.chip
    }

    /// The configuration that will be requested.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Perform the request.
    ///
    /// Opens the chip and requests the line from the kernel.
    /// There is no retry - failures are returned to the caller.
    ///
    /// On success returns the [`Request`] that provides access to the edge events.
    pub fn request(self) -> Result<Request> {
        self.cfg.validate()?;
        let chip = File::open(&self.chip).map_err(|e| {
            Error::GpioChip(
                self.chip.clone(),
                Errno(e.raw_os_error().unwrap_or(libc::EIO)),
            )
        })?;
        log::debug!(
            "controller device {} opened (fd={})",
            self.chip.display(),
            chip.as_raw_fd()
        );
        let lr = self.cfg.to_uapi();
        let offset = lr.offsets.get(0);
        log::debug!(
            "requesting line {} as {:?} for {:?}",
            offset,
            lr.config.flags,
            lr.consumer.as_os_str()
        );
        let f = v2::get_line(&chip, lr).map_err(|e| Error::GetLine(offset, e))?;
        log::debug!("line {} requested (fd={})", offset, f.as_raw_fd());
        Ok(Request {
            f,
            _chip: chip,
            path: self.chip,
            cfg: self.cfg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::BiasMode;

    #[test]
    fn new() {
        let mut cfg = Config::new(5);
        cfg.with_bias(BiasMode::PullUp);
        let b = Builder::new("/dev/gpiochip3", cfg.clone());
        assert_eq!(b.config(), &cfg);
        assert_eq!(b.chip(), Path::new("/dev/gpiochip3"));
    }

    #[test]
    fn request_missing_chip() {
        let path = "/dev/this-is-not-a-gpiochip";
        let err = Builder::new(path, Config::new(1)).request().unwrap_err();
        assert_eq!(err, Error::GpioChip(path.into(), Errno(libc::ENOENT)));
        assert_eq!(err.errno(), Some(libc::ENOENT));
    }

    #[test]
    fn request_invalid_config() {
        let mut cfg = Config::new(1);
        cfg.with_debounce_period_us(u32::MAX);
        // validated before the chip is touched
        let err = Builder::new("/dev/this-is-not-a-gpiochip", cfg)
            .request()
            .unwrap_err();
        assert!(matches!(err, Error::OutOfRange { .. }));
    }

    #[test]
    fn request_not_a_chip() {
        // a readable file that rejects the ioctl
        let err = Builder::new("/dev/null", Config::new(1))
            .request()
            .unwrap_err();
        assert!(matches!(err, Error::GetLine(1, _)));
        assert!(err.errno().is_some());
    }
}
