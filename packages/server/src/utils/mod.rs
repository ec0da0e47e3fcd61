pub mod filename;
pub mod slug;
