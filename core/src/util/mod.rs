mod tail_buffer;
pub mod text;

pub use tail_buffer::TailBuffer;
