use log::debug;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A single-shot delayed action running on the tokio runtime.
///
/// The action runs at most once. Cancelling (or dropping the handle) before the
/// delay elapses means it never runs.
pub struct ResultsReveal {
    handle: JoinHandle<()>,
}

impl ResultsReveal {
    pub fn schedule<F>(delay: Duration, action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        debug!("Scheduling results reveal in {:?}", delay);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        });
        Self { handle }
    }

    pub fn cancel(&self) {
        if !self.handle.is_finished() {
            debug!("Cancelling pending results reveal");
            self.handle.abort();
        }
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ResultsReveal {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
