//! Span definitions per coordinator operation: load, save, remote save, reconcile.

/// Create a load span.
#[macro_export]
macro_rules! load_span {
    ($key:expr) => {
        tracing::debug_span!("rollbook.load", collection = %$key.collection, id = %$key.id)
    };
}

/// Create a save span.
#[macro_export]
macro_rules! save_span {
    ($key:expr, $immediate:expr) => {
        tracing::debug_span!(
            "rollbook.save",
            collection = %$key.collection,
            id = %$key.id,
            immediate = $immediate
        )
    };
}

/// Create a span for a debounced save firing.
#[macro_export]
macro_rules! remote_save_span {
    ($key:expr) => {
        tracing::debug_span!("rollbook.remote_save", collection = %$key.collection, id = %$key.id)
    };
}

/// Create a reconcile span.
#[macro_export]
macro_rules! reconcile_span {
    ($key:expr) => {
        tracing::info_span!("rollbook.reconcile", collection = %$key.collection, id = %$key.id)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const LOAD: &str = "rollbook.load";
    pub const SAVE: &str = "rollbook.save";
    pub const REMOTE_SAVE: &str = "rollbook.remote_save";
    pub const RECONCILE: &str = "rollbook.reconcile";
}
