pub mod error;
pub mod openai;

pub use error::ChatError;
pub use openai::OpenAiCompatClient;
