// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::OnceLock;

/// What the latency setup achieved.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Outcome {
    /// The process is scheduled with the highest FIFO realtime priority.
    pub realtime: bool,

    /// All current and future pages of the process are locked in memory.
    pub locked: bool,
}

static OUTCOME: OnceLock<Outcome> = OnceLock::new();

/// Switch the process to realtime FIFO scheduling and lock its memory.
///
/// Both steps are best effort, typically requiring CAP_SYS_NICE and
/// CAP_IPC_LOCK, and failures are logged rather than returned.
///
/// The setup is only performed by the first call. Subsequent calls return
/// the outcome of the first.
pub fn reduce_latency() -> Outcome {
    once_with(&OUTCOME, || Outcome {
        realtime: set_fifo_scheduling(),
        locked: lock_memory(),
    })
}

fn once_with<F: FnOnce() -> Outcome>(cell: &OnceLock<Outcome>, f: F) -> Outcome {
    *cell.get_or_init(f)
}

fn set_fifo_scheduling() -> bool {
    // SAFETY: plain syscalls with a zeroed, then populated, sched_param.
    unsafe {
        let mut param: libc::sched_param = std::mem::zeroed();
        param.sched_priority = libc::sched_get_priority_max(libc::SCHED_FIFO);
        if libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) == -1 {
            log::warn!("unable to set realtime scheduling: {}", errno::errno());
            return false;
        }
        log::info!("scheduling FIFO at priority {}", param.sched_priority);
    }
    true
}

fn lock_memory() -> bool {
    // SAFETY: no pointers are involved.
    if unsafe { libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) } == -1 {
        log::warn!("unable to lock memory: {}", errno::errno());
        return false;
    }
    log::info!("memory locked");
    true
}
