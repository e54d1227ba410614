//! Real-time scheduling helpers (Linux SCHED_FIFO and mlockall).
//!
//! Failures are warnings: the line still runs, with more jitter.

#[cfg(target_os = "linux")]
pub fn setup_rt_once(rt: bool, prio: Option<i32>) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !rt {
        return;
    }

    fn lock_memory() -> eyre::Result<()> {
        // SAFETY: mlockall has no memory-safety preconditions.
        let rc = unsafe { libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) };
        if rc == 0 {
            return Ok(());
        }
        let err = std::io::Error::last_os_error();
        if matches!(err.raw_os_error(), Some(code) if code == libc::EPERM || code == libc::ENOMEM)
        {
            eyre::bail!(
                "mlockall(current|future) failed: {err}; hint: needs CAP_IPC_LOCK (or root) and sufficient 'ulimit -l'"
            );
        }
        Err(eyre::eyre!(err))
    }

    fn apply_fifo(prio: Option<i32>) -> eyre::Result<i32> {
        // SAFETY: plain syscalls on the current process.
        let (min, max) = unsafe {
            let min = libc::sched_get_priority_min(libc::SCHED_FIFO);
            let max = libc::sched_get_priority_max(libc::SCHED_FIFO);
            if min < 0 || max < 0 { (1, 99) } else { (min, max) }
        };
        let prio_val = prio.unwrap_or(max).clamp(min, max);
        let param = libc::sched_param {
            sched_priority: prio_val,
        };
        // SAFETY: `param` outlives the call; pid 0 is the calling process.
        let rc = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
        if rc != 0 {
            let err = std::io::Error::last_os_error();
            eyre::bail!("{err}; hint: needs CAP_SYS_NICE or root");
        }
        Ok(prio_val)
    }

    RT_ONCE.get_or_init(|| {
        match lock_memory() {
            Ok(()) => tracing::info!("rt: memory locked (current|future)"),
            Err(err) => tracing::warn!(error = %err, "rt: mlockall failed"),
        }
        match apply_fifo(prio) {
            Ok(p) => tracing::info!(priority = p, "rt: SCHED_FIFO applied"),
            Err(err) => tracing::warn!(error = %err, "rt: sched_setscheduler(SCHED_FIFO) failed"),
        }
    });
}

#[cfg(not(target_os = "linux"))]
pub fn setup_rt_once(rt: bool, _prio: Option<i32>) {
    if rt {
        tracing::warn!("rt: real-time mode is only supported on Linux; ignoring --rt");
    }
}
