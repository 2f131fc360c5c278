//! Parsing of model responses into file and command operations.

mod parser;
pub mod parsers;
mod types;

pub use parser::{FormatError, FormatValidation, FormatWarning, ResponseProtocolParser};
pub use parsers::{parse_response, MarkerProtocolParser};
pub use types::{
    CodeBlock, CommandSpec, FileOperation, OperationKind, ParseOutput, ParseWarning, PatchEdit,
    WarningKind,
};
