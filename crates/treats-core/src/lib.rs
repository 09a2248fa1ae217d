//! Domain logic for a Treats workspace: users, channels, DMs, messages,
//! standups and the notification feed. Everything here is synchronous and
//! operates on a single in-memory [`Workspace`].

pub mod admin;
pub mod auth;
pub mod channels;
pub mod directory;
pub mod dms;
pub mod error;
pub mod mentions;
pub mod messages;
pub mod notify;
pub mod pager;
pub mod search;
pub mod standup;
pub mod stats;
pub mod users;
pub mod workspace;

pub use directory::Directory;
pub use error::{Result, TreatsError};
pub use workspace::{ConversationRef, Permission, Workspace};
