pub mod config;
pub mod dimensions;
pub mod errors;
pub mod fetch;
pub mod model;
pub mod report;
pub mod request;
pub mod significance;
pub mod stats;
pub mod suppress;

pub use errors::ReportError;
pub use fetch::{FetchError, StatusFetcher};
pub use model::{Report, TestDetails, Verdict};
pub use report::ReportGenerator;
pub use request::Request;
