pub mod content;
pub mod publication;
