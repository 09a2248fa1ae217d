pub mod api;
pub mod models;

pub use models::{ChannelId, DmId, MessageId, UserId};
