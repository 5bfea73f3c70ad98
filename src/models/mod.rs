pub mod conversation;
pub mod message;
pub mod notification;
pub mod thread;
pub mod user;

pub use conversation::ConversationSummary;
pub use message::Message;
pub use notification::{Notification, NotificationKind};
pub use thread::ThreadKey;
pub use user::CurrentUser;
