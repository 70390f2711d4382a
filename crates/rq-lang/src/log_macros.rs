/// Domain-aware logging macros.
///
/// Each macro injects a `domain` field so call sites never repeat the string
/// literal. Domains used by the translator: `sys`, `conf`, `fold`, `xlat`.
///
/// ```ignore
/// rq_debug!(fold, node = %expr, error = %e, "fold abandoned");
/// rq_trace!(xlat, output = %text, "predicate translated");
/// ```

// ---------------------------------------------------------------------------
// Core macro
// ---------------------------------------------------------------------------

/// Internal helper. Use `rq_warn!` .. `rq_trace!`.
#[doc(hidden)]
macro_rules! rq_log {
    ($level:ident, $domain:ident, $($field:tt)*) => {
        tracing::$level!(domain = stringify!($domain), $($field)*)
    };
}

// ---------------------------------------------------------------------------
// Per-level macros
// ---------------------------------------------------------------------------

#[allow(unused_macros)]
macro_rules! rq_warn {
    ($domain:ident, $($rest:tt)*) => {
        rq_log!(warn, $domain, $($rest)*)
    };
}

macro_rules! rq_debug {
    ($domain:ident, $($rest:tt)*) => {
        rq_log!(debug, $domain, $($rest)*)
    };
}

macro_rules! rq_trace {
    ($domain:ident, $($rest:tt)*) => {
        rq_log!(trace, $domain, $($rest)*)
    };
}
