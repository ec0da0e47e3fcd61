pub mod content;
pub mod publication;
pub mod shared;
