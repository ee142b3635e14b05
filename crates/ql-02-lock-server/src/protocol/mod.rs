//! Line protocol: command parsing and reply framing.

pub mod command;
pub mod reply;

pub use command::Command;
pub use reply::Reply;
