// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words SIGCHLD SIGHUP SIGINT

//! The process-wide [`TopicMonitor`] and the signal handlers that post to it.

use super::{DEBUG_TOPIC_MONITOR, Topic, TopicMonitor};
use std::sync::{OnceLock,
                atomic::{AtomicBool, Ordering}};

static PRINCIPAL: OnceLock<TopicMonitor> = OnceLock::new();

static SIGNAL_HANDLERS_INSTALLED: AtomicBool = AtomicBool::new(false);

/// [`principal()`] was called before [`TopicMonitor::initialize_principal()`].
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("The principal topic monitor is not initialized")]
#[diagnostic(
    code(shell_notify::topic_monitor::principal_not_initialized),
    help("Call `TopicMonitor::initialize_principal()` from `main()` before anything posts")
)]
pub struct PrincipalNotInitialized;

/// A signal handler could not be registered.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("Failed to install handler for signal {signal}")]
#[diagnostic(code(shell_notify::topic_monitor::signal_install))]
pub struct SignalInstallError {
    pub signal: i32,
    #[source]
    pub source: std::io::Error,
}

impl TopicMonitor {
    /// Create the process-wide monitor. Call once at startup, before any signal
    /// handler is installed. Later calls return the same instance.
    ///
    /// # Errors
    ///
    /// Returns [`WakePipeCreationError`](super::WakePipeCreationError) if the first
    /// call can't create the wake pipe. The process should not carry on without it.
    pub fn initialize_principal() -> miette::Result<&'static TopicMonitor> {
        if let Some(it) = PRINCIPAL.get() {
            return Ok(it);
        }
        let monitor = TopicMonitor::new()?;
        // If another thread won the race, its monitor is kept and ours is dropped.
        let it = PRINCIPAL.get_or_init(|| monitor);
        DEBUG_TOPIC_MONITOR.then(|| {
            tracing::debug!(message = "principal topic monitor initialized");
        });
        Ok(it)
    }
}

/// The process-wide monitor.
///
/// # Errors
///
/// Returns [`PrincipalNotInitialized`] before
/// [`TopicMonitor::initialize_principal()`] has run.
pub fn principal() -> Result<&'static TopicMonitor, PrincipalNotInitialized> {
    PRINCIPAL.get().ok_or(PrincipalNotInitialized)
}

/// Route `SIGCHLD` to [`Topic::SigChld`], and `SIGHUP` and `SIGINT` to
/// [`Topic::SigHupInt`], on the principal monitor. Installing twice is a no-op.
///
/// The handlers replace the default action for these signals: `SIGINT` no longer
/// terminates the process, it only advances [`Topic::SigHupInt`].
///
/// # Errors
///
/// - [`PrincipalNotInitialized`] if the principal monitor doesn't exist yet.
/// - [`SignalInstallError`] if registration fails.
#[cfg(unix)]
pub fn install_signal_handlers() -> miette::Result<()> {
    use signal_hook::consts::{SIGCHLD, SIGHUP, SIGINT};

    let monitor = principal()?;
    if SIGNAL_HANDLERS_INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    for (signal, topic) in [
        (SIGCHLD, Topic::SigChld),
        (SIGHUP, Topic::SigHupInt),
        (SIGINT, Topic::SigHupInt),
    ] {
        // SAFETY: The action only does an atomic fetch-or, a fence, and a write(2).
        // That is async-signal-safe.
        let result = unsafe {
            signal_hook::low_level::register(signal, move || monitor.post(topic))
        };
        if let Err(source) = result {
            SIGNAL_HANDLERS_INSTALLED.store(false, Ordering::SeqCst);
            return Err(SignalInstallError { signal, source }.into());
        }
    }

    DEBUG_TOPIC_MONITOR.then(|| {
        tracing::debug!(message = "topic monitor signal handlers installed");
    });
    Ok(())
}
