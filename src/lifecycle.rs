//! One-time, process-wide setup of the transfer library.
//!
//! The first request runs [`Backend::global_init`] and, unless disabled, starts a watcher thread
//! that cleans the library up and exits the process when a termination signal arrives. Later
//! requests only observe the completed initialization.

use std::io;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;
use std::thread;

use httpwrap_interface::Backend;

const SIGINT: i32 = 2;
const SIGTERM: i32 = 15;

static TERMINATE_HOOK_DISABLED: AtomicBool = AtomicBool::new(false);

pub(crate) static GLOBAL: LifecycleGuard = LifecycleGuard::new(true);

/// Prevents httpwrap from installing its SIGTERM / Ctrl+C hook.
///
/// Must be called before the first request to have any effect. Use this when the host
/// application already handles termination signals itself.
pub fn disable_terminate_hook() {
    TERMINATE_HOOK_DISABLED.store(true, Ordering::SeqCst);
}

pub(crate) struct LifecycleGuard {
    init: Once,
    terminate_hook: bool,
}

impl LifecycleGuard {
    pub(crate) const fn new(terminate_hook: bool) -> Self {
        Self {
            init: Once::new(),
            terminate_hook,
        }
    }

    /// Runs the one-time initialization if nobody has yet. Concurrent callers block until it
    /// has completed.
    pub(crate) fn ensure_initialized(&self, backend: &'static dyn Backend) {
        self.init.call_once(|| {
            backend.global_init();
            if self.terminate_hook && !TERMINATE_HOOK_DISABLED.load(Ordering::SeqCst) {
                install_terminate_hook(backend);
            }
        });
    }

    #[cfg(test)]
    pub(crate) fn is_initialized(&self) -> bool {
        self.init.is_completed()
    }
}

fn install_terminate_hook(backend: &'static dyn Backend) {
    let spawned = thread::Builder::new()
        .name("httpwrap-terminate-hook".into())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::warn!(%e, "failed to build signal runtime, terminate hook disabled");
                    return;
                }
            };
            match rt.block_on(wait_for_termination()) {
                Ok(signum) => process::exit(shut_down(backend, signum)),
                Err(e) => tracing::warn!(%e, "failed to listen for termination signals"),
            }
        });
    if let Err(e) = spawned {
        tracing::warn!(%e, "failed to spawn terminate hook thread");
    }
}

/// Releases the transfer library after `signum` arrived and returns the exit status to use.
fn shut_down(backend: &dyn Backend, signum: i32) -> i32 {
    tracing::info!(signum, "termination signal received, cleaning up");
    backend.global_cleanup();
    signum
}

#[cfg(unix)]
async fn wait_for_termination() -> io::Result<i32> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigterm.recv() => Ok(SIGTERM),
        res = tokio::signal::ctrl_c() => res.map(|()| SIGINT),
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() -> io::Result<i32> {
    tokio::signal::ctrl_c().await?;
    Ok(SIGINT)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier,
    };

    use httpwrap_interface::{Request, Result as BackendResult};

    use super::*;

    #[derive(Default)]
    struct CountingBackend {
        inits: AtomicUsize,
        init_done: AtomicBool,
        cleanups: AtomicUsize,
    }

    impl Backend for CountingBackend {
        fn global_init(&self) {
            thread::sleep(std::time::Duration::from_millis(20));
            self.inits.fetch_add(1, Ordering::SeqCst);
            self.init_done.store(true, Ordering::SeqCst);
        }

        fn global_cleanup(&self) {
            self.cleanups.fetch_add(1, Ordering::SeqCst);
        }

        fn perform(&self, _req: &Request) -> BackendResult<Vec<u8>> {
            Ok(vec![])
        }
    }

    #[test]
    fn test_init_runs_once_under_contention() {
        const CALLERS: usize = 16;
        let backend: &'static CountingBackend = Box::leak(Box::default());
        let guard: &'static LifecycleGuard = Box::leak(Box::new(LifecycleGuard::new(false)));
        let barrier = Arc::new(Barrier::new(CALLERS));
        let callers: Vec<_> = (0..CALLERS)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    guard.ensure_initialized(backend);
                    // No caller may proceed before initialization has finished
                    assert!(backend.init_done.load(Ordering::SeqCst));
                })
            })
            .collect();
        for caller in callers {
            caller.join().unwrap();
        }
        assert!(guard.is_initialized());
        assert_eq!(backend.inits.load(Ordering::SeqCst), 1);

        guard.ensure_initialized(backend);
        assert_eq!(backend.inits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_shut_down_cleans_up_and_keeps_signal_status() {
        let backend = CountingBackend::default();
        assert_eq!(shut_down(&backend, SIGTERM), 15);
        assert_eq!(backend.cleanups.load(Ordering::SeqCst), 1);
        assert_eq!(backend.inits.load(Ordering::SeqCst), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_sigterm_resolves_termination_wait() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let signum = rt.block_on(async {
            let mut wait = std::pin::pin!(wait_for_termination());
            // The first poll registers the signal listeners, so SIGTERM no longer kills us
            assert!(futures::poll!(wait.as_mut()).is_pending());
            let status = std::process::Command::new("kill")
                .args(["-TERM", &process::id().to_string()])
                .status()
                .unwrap();
            assert!(status.success());
            wait.await
        });
        assert_eq!(signum.unwrap(), SIGTERM);
    }
}
