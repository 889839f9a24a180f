mod logging;

pub use logging::LoggingHook;
