use rama::telemetry::tracing;

pub use libc::rlim_t;

/// Raise the soft `RLIMIT_NOFILE` limit towards `target`, capped by the hard limit.
///
/// The limit is never lowered. Returns the soft limit in effect afterwards.
pub fn raise_nofile(target: rlim_t) -> std::io::Result<rlim_t> {
    let mut lim = get_nofile()?;

    let wanted = target.min(lim.rlim_max);
    if lim.rlim_cur >= wanted {
        tracing::debug!(
            soft = lim.rlim_cur,
            hard = lim.rlim_max,
            wanted,
            "nofile soft limit already sufficient",
        );
        return Ok(lim.rlim_cur);
    }

    lim.rlim_cur = wanted;
    // SAFETY: setrlimit only reads the provided, fully initialised struct
    if unsafe { libc::setrlimit(libc::RLIMIT_NOFILE, &lim) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    Ok(get_nofile()?.rlim_cur)
}

fn get_nofile() -> std::io::Result<libc::rlimit> {
    let mut lim = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: getrlimit only writes into the provided struct
    if unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut lim) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(lim)
}
