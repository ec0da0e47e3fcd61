pub mod content;
pub mod health;
pub mod publication;
