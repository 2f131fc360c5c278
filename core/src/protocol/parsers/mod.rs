//! Response Protocol Parser Implementations
//!
//! Concrete implementations of the `ResponseProtocolParser` trait.
//!
//! Currently available parsers:
//! - `MarkerProtocolParser`: the `$$$` directive language (default)

mod marker;

pub use marker::{parse_response, MarkerProtocolParser};
