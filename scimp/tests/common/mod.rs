pub mod assertions;
pub mod logging;

pub use assertions::assert_contains;
pub use logging::init_test_logging;
