//! Operation dispatch.
//!
//! Every host-facing operation runs through [`Dispatcher::call`], which
//! traces it, passes through errors that already carry an errno, classifies
//! provider failures, and takes the crash path for anything it cannot
//! classify.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use awsfs_telemetry::Telemetry;
use tracing::{debug, error, info, warn};

use crate::classify::{Classification, Classifier, ErrorTable, Severity};
use crate::errno::Errno;
use crate::error::{VfsError, VfsResult};
use crate::provider::ProviderError;

/// What to do once a failure has been found unclassifiable.
pub trait CrashHandler: Send + Sync {
    fn crash(&self, op: &str) -> !;
}

/// Flush every log sink, then abort the process.
#[derive(Debug, Clone)]
pub struct AbortOnCrash {
    telemetry: Arc<Telemetry>,
}

impl AbortOnCrash {
    pub fn new(telemetry: Arc<Telemetry>) -> Self {
        Self { telemetry }
    }
}

impl CrashHandler for AbortOnCrash {
    fn crash(&self, _op: &str) -> ! {
        self.telemetry.flush();
        std::process::abort()
    }
}

/// Wraps operations with tracing, classification and the crash-only policy.
pub struct Dispatcher {
    telemetry: Arc<Telemetry>,
    classifier: Box<dyn Classifier>,
    crash: Box<dyn CrashHandler>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("telemetry", &self.telemetry)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// A dispatcher using the standard error table that aborts on crash.
    pub fn new(telemetry: Arc<Telemetry>) -> Self {
        Self {
            classifier: Box::new(ErrorTable),
            crash: Box::new(AbortOnCrash::new(Arc::clone(&telemetry))),
            telemetry,
        }
    }

    pub fn with_classifier(mut self, classifier: impl Classifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn with_crash_handler(mut self, handler: impl CrashHandler + 'static) -> Self {
        self.crash = Box::new(handler);
        self
    }

    pub fn telemetry(&self) -> &Arc<Telemetry> {
        &self.telemetry
    }

    /// Run `f` as operation `op`.
    ///
    /// Events emitted while `f` runs, including cache and provider traces,
    /// go to this dispatcher's telemetry.
    pub fn call<T, F>(&self, op: &'static str, args: &dyn fmt::Debug, f: F) -> Result<T, Errno>
    where
        T: fmt::Debug,
        F: FnOnce() -> VfsResult<T>,
    {
        tracing::dispatcher::with_default(self.telemetry.dispatch(), || self.run(op, args, f))
    }

    fn run<T, F>(&self, op: &'static str, args: &dyn fmt::Debug, f: F) -> Result<T, Errno>
    where
        T: fmt::Debug,
        F: FnOnce() -> VfsResult<T>,
    {
        debug!(op, ?args, "->");

        let result = match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(result) => result,
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                self.fatal(op, format_args!("operation panicked: {reason}"))
            }
        };

        match result {
            Ok(value) => {
                debug!(op, result = ?value, "<-");
                Ok(value)
            }
            Err(VfsError::Provider(failure)) => Err(self.translate(op, &failure)),
            Err(err) => {
                let errno = err.errno().unwrap_or(Errno::Io);
                debug!(op, %errno, error = %err, "<-");
                Err(errno)
            }
        }
    }

    fn translate(&self, op: &'static str, failure: &ProviderError) -> Errno {
        match self.classifier.classify(failure) {
            Ok(Classification::Classified { errno, severity }) => {
                log_classified(op, errno, severity, failure);
                errno
            }
            Ok(Classification::Unclassified) => {
                self.fatal(op, format_args!("unclassified failure: {failure:?}"))
            }
            Err(e) => self.fatal(op, format_args!("classification failed ({e}): {failure:?}")),
        }
    }

    fn fatal(&self, op: &'static str, reason: fmt::Arguments<'_>) -> ! {
        error!(fatal = true, op, "{reason}");
        self.crash.crash(op)
    }
}

fn log_classified(op: &str, errno: Errno, severity: Severity, failure: &ProviderError) {
    match severity {
        Severity::Debug => debug!(op, %errno, error = %failure, "<-"),
        Severity::Info => info!(op, %errno, error = %failure, "<-"),
        Severity::Warning => warn!(op, %errno, error = %failure, "<-"),
        Severity::Error | Severity::Fatal => match failure {
            ProviderError::Service(service) => error!(
                op,
                %errno,
                error = %failure,
                response = %service.response(),
                "<-"
            ),
            _ => error!(op, %errno, error = %failure, "<-"),
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
