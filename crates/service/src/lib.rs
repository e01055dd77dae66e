pub mod service;

pub use service::{load_report, write_report, SessionRegistry, SessionSnapshot};
