//! Feature-gated tracing hooks for the filter pipeline.
//!
//! With the `tracing` feature the macros forward to `tracing` spans and
//! info events; without it they expand to nothing observable.

#[cfg(feature = "tracing")]
macro_rules! stage_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?).entered()
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! stage_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::DisabledSpan
    };
}

#[cfg(feature = "tracing")]
macro_rules! stage_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(stage = $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! stage_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

pub(crate) use stage_event;
pub(crate) use stage_span;

/// Guard returned by `stage_span!` when tracing is compiled out.
#[cfg(not(feature = "tracing"))]
pub(crate) struct DisabledSpan;
