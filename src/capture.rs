//! Panic capture with the backtrace of the panic site.
//!
//! `catch_unwind` only hands back the payload; by then the stack that
//! panicked is gone. A process-wide hook, installed once and chained in front
//! of whatever hook was already set, renders a backtrace on the panicking
//! thread while [`catch`] is active on it. A hook installed later by the
//! application replaces ours; traces are then empty.

use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use crate::error::panic_message;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
    static TRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// A panic caught by [`catch`].
#[derive(Debug, Clone)]
pub(crate) struct Caught {
    pub(crate) message: String,
    pub(crate) trace: String,
}

/// Runs `f`, turning a panic into [`Caught`].
pub(crate) fn catch<R>(f: impl FnOnce() -> R) -> Result<R, Caught> {
    install_hook();

    DEPTH.with(|depth| depth.set(depth.get() + 1));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));

    let trace = TRACE.with(|trace| trace.borrow_mut().take());
    result.map_err(|payload| Caught {
        message: panic_message(payload.as_ref()),
        trace: trace.unwrap_or_default(),
    })
}

fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if DEPTH.with(Cell::get) > 0 {
                let rendered = Backtrace::force_capture().to_string();
                TRACE.with(|trace| *trace.borrow_mut() = Some(rendered));
            }
            previous(info);
        }));
    });
}
