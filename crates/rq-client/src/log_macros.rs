/// Domain-aware logging macros.
///
/// Each macro injects a `domain` field so call sites never repeat the string
/// literal. Domains used by the client: `sys`, `conf`, `xlat`.
///
/// ```ignore
/// rq_info!(conf, resources = 3, "catalog loaded");
/// rq_debug!(xlat, uri = %uri, "query composed");
/// ```

/// Internal helper. Use `rq_info!` .. `rq_debug!`.
#[doc(hidden)]
macro_rules! rq_log {
    ($level:ident, $domain:ident, $($field:tt)*) => {
        tracing::$level!(domain = stringify!($domain), $($field)*)
    };
}

macro_rules! rq_info {
    ($domain:ident, $($rest:tt)*) => {
        rq_log!(info, $domain, $($rest)*)
    };
}

macro_rules! rq_debug {
    ($domain:ident, $($rest:tt)*) => {
        rq_log!(debug, $domain, $($rest)*)
    };
}
