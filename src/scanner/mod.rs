pub mod error;
pub mod job;
pub mod lock;

// Re-export commonly used types
pub use error::ScanError;
pub use job::ScanJob;
pub use lock::DeviceLocks;
