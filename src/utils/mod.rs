//! The `utils` module provides shared definitions used across `clipqueue`:
//! the crate-wide error type and the tracing subscriber setup.

pub mod error;
pub mod logging;

pub use error::QueueError;

#[cfg(test)]
mod tests {
    use super::logging;

    #[test]
    fn logging_init_accepts_levels() {
        // Should not panic
        logging::init("info");
        logging::init("debug");
        logging::init("warn");
        logging::init("nonsense");
    }
}
