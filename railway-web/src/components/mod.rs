pub mod backdrop;
pub mod footer;
pub mod header;
pub mod popover;
pub mod railway;

pub use railway::Railway;
