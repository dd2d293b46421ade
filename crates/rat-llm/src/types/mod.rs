pub mod content;
pub mod message;

pub use content::{Content, ContentPart};
pub use message::{Message, Role};
