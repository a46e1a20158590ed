use crate::Error;

/// Receives errors from background flushes, which have no caller to return them to.
pub trait FaultReporter: Send + Sync + 'static {
    fn report(&self, err: &Error);
}

impl<F> FaultReporter for F
where
    F: Fn(&Error) + Send + Sync + 'static,
{
    fn report(&self, err: &Error) {
        self(err)
    }
}

/// Default reporter: logs through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFaultReporter;

impl FaultReporter for LogFaultReporter {
    fn report(&self, err: &Error) {
        log::error!("background flush failed: {err}");
    }
}
