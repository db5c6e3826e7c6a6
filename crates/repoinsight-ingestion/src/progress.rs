//! Advisory progress reporting from the pipeline to the task runtime

/// Sink for advisory progress marks (percent of 100 plus a message).
/// The task queue implements this to publish progress on the task row;
/// tests use the no-op.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, percent: u8, message: &str);
}

/// Reporter that drops everything
#[derive(Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _percent: u8, _message: &str) {}
}

/// Reporter that forwards to a closure (handy in tests and for the
/// queue's task-row updates)
pub struct FnProgress<F: Fn(u8, &str) + Send + Sync>(pub F);

impl<F: Fn(u8, &str) + Send + Sync> ProgressReporter for FnProgress<F> {
    fn report(&self, percent: u8, message: &str) {
        (self.0)(percent, message);
    }
}
