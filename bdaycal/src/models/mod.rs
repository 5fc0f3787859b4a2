//! Data models for birthday records.

mod birthday;

pub use birthday::Birthday;
