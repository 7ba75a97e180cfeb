// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: MIT

//! A thin but safe Rust layer around the parts of the Linux GPIO uAPI
//! required to count edges on a single line.
//!
//! Only ABI v2, released in Linux v5.10, is supported as it is the first ABI
//! version to provide debounce.

pub(crate) mod common;

pub use common::{
    read_event, wait_event, Error, Name, Offset, Offsets, Padding, Result, LINES_MAX, NAME_MAX,
};

/// This module implements the subset of GPIO ABI v2 used to request a line
/// and read its edge events.
pub mod v2;
