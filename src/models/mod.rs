pub mod message;
pub mod response;

pub use message::{Message, MessageMetadata, messages_from_hits};
pub use response::{ChatReply, ChatResponse, SaveAck, SearchResult, unix_timestamp};
