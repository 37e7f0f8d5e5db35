//! Start/stop state machine around the flowgraph.

use std::sync::{Mutex, PoisonError};

use log::{debug, error, info};
use thiserror::Error;

use crate::flowgraph::PipelineControl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Constructed,
    Running,
    Stopped,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("cannot start a pipeline that is {0:?}")]
    InvalidState(LifecycleState),
    #[error("failed to start pipeline")]
    Start(#[source] anyhow::Error),
}

type ExitFn = Box<dyn Fn(i32) + Send + Sync>;

struct Inner {
    state: LifecycleState,
    pipeline: Box<dyn PipelineControl>,
}

/// Owns the pipeline and the single shutdown path.
///
/// `shutdown` may be called from a signal handler and from the normal exit
/// path; only the first call stops, waits and exits.
pub struct Lifecycle {
    inner: Mutex<Inner>,
    exit: ExitFn,
}

impl Lifecycle {
    pub fn new(
        pipeline: Box<dyn PipelineControl>,
        exit: impl Fn(i32) + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: LifecycleState::Constructed,
                pipeline,
            }),
            exit: Box::new(exit),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.lock().state
    }

    pub fn start(&self) -> Result<(), LifecycleError> {
        let mut inner = self.lock();
        if inner.state != LifecycleState::Constructed {
            return Err(LifecycleError::InvalidState(inner.state));
        }
        inner.pipeline.start().map_err(LifecycleError::Start)?;
        inner.state = LifecycleState::Running;
        debug!("Pipeline running");
        Ok(())
    }

    /// Stop the pipeline, wait for it and exit with status 0.
    pub fn shutdown(&self) {
        self.shutdown_with_status(0);
    }

    pub fn shutdown_with_status(&self, code: i32) {
        let mut inner = self.lock();
        if inner.state == LifecycleState::Stopped {
            return;
        }
        info!("Shutting down");

        inner.pipeline.stop();
        let code = match inner.pipeline.wait() {
            Ok(()) => code,
            Err(e) => {
                error!("Pipeline did not stop cleanly: {e:?}");
                if code == 0 { 1 } else { code }
            }
        };
        inner.state = LifecycleState::Stopped;

        // Held across exit so a concurrent caller cannot run a second exit.
        (self.exit)(code);
        drop(inner);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
