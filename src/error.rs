//! Error type and the reported-error channel.
//!
//! Most anomalies in this crate are recoverable and are only *reported*:
//! a user watcher whose getter fails must not take down the flush pass it
//! runs in. Those reports flow through a thread-local handler that hosts
//! can replace (the default sink logs via `tracing`). Render watchers are
//! the exception - their errors propagate out of
//! [`crate::reactive::scheduler::flush`] as a `Result`, because a broken
//! render cannot silently continue.

use std::cell::RefCell;

/// Errors produced by watcher evaluation and path parsing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A tracked computation failed.
    #[error("watcher evaluation failed: {0}")]
    Eval(String),

    /// A dotted watch path contained characters outside `[A-Za-z0-9_$.]`.
    #[error("unwatchable path expression: {0:?}")]
    Path(String),
}

impl Error {
    /// Convenience constructor for evaluation errors from user closures.
    pub fn eval(msg: impl Into<String>) -> Self {
        Error::Eval(msg.into())
    }
}

thread_local! {
    static ERROR_HANDLER: RefCell<Option<Box<dyn FnMut(&Error, &str)>>> =
        const { RefCell::new(None) };
}

/// Install a handler for reported (non-fatal) errors.
///
/// The handler receives the error and a short description of where it was
/// caught (e.g. `"getter for user watcher"`).
pub fn set_error_handler(handler: impl FnMut(&Error, &str) + 'static) {
    ERROR_HANDLER.with(|h| *h.borrow_mut() = Some(Box::new(handler)));
}

/// Remove the installed handler, restoring the default `tracing` sink.
pub fn clear_error_handler() {
    ERROR_HANDLER.with(|h| *h.borrow_mut() = None);
}

/// Route an error through the handler channel.
///
/// Falls back to `tracing::error!` when no handler is installed, or when the
/// handler is unavailable because the report originates from inside the
/// handler itself.
pub fn handle_error(err: &Error, context: &str) {
    let reported = ERROR_HANDLER.with(|h| {
        if let Ok(mut slot) = h.try_borrow_mut() {
            if let Some(handler) = slot.as_mut() {
                handler(err, context);
                return true;
            }
        }
        false
    });
    if !reported {
        tracing::error!(context, error = %err, "unhandled reactive error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_handler_receives_reports() {
        let seen = Rc::new(Cell::new(0));
        let seen2 = seen.clone();
        set_error_handler(move |_, _| seen2.set(seen2.get() + 1));

        handle_error(&Error::eval("boom"), "test");
        handle_error(&Error::Path("a-b".into()), "test");
        assert_eq!(seen.get(), 2);

        clear_error_handler();
        handle_error(&Error::eval("boom"), "test");
        assert_eq!(seen.get(), 2);
    }
}
