// These are thin wrappers around the 'log' crate's macros. When the 'logging'
// feature is disabled, they expand to nothing, so log statements never need
// to be guarded at their call sites.

#[allow(unused_macros)]
macro_rules! log {
    ($($tt:tt)*) => {
        #[cfg(feature = "logging")]
        {
            $($tt)*
        }
    }
}

#[allow(unused_macros)]
macro_rules! debug {
    ($($tt:tt)*) => { log!(log::debug!($($tt)*)) }
}

#[allow(unused_macros)]
macro_rules! trace {
    ($($tt:tt)*) => { log!(log::trace!($($tt)*)) }
}
