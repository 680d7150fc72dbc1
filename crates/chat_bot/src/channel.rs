//! Transport-independent view of a chat conversation.

use std::future::Future;

use thiserror::Error;

/// One inbound message, already stripped of transport details.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inbound {
    /// Message body, or the media caption.
    pub text: String,
    /// Identifier of the author.
    pub sender: String,
    /// Identifier of the conversation the message arrived in.
    pub conversation: String,
    /// The owner sent it.
    pub from_self: bool,
    pub has_attachment: bool,
}

/// Media carried by an inbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// File extension derived from the MIME subtype (`image/png` -> `png`).
    pub fn extension(&self) -> &str {
        self.mime_type
            .split_once('/')
            .map(|(_, subtype)| subtype)
            .and_then(|subtype| subtype.split([';', '+']).next())
            .map(str::trim)
            .filter(|subtype| !subtype.is_empty())
            .unwrap_or("bin")
    }
}

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("request failed: {0}")]
    Request(#[from] teloxide::RequestError),
    #[error("download failed: {0}")]
    Download(#[from] teloxide::DownloadError),
    #[error("message has no attachment")]
    NoAttachment,
    #[error("channel unavailable: {0}")]
    Unavailable(String),
}

/// Reply side of the conversation an inbound message came from.
///
/// An instance is bound to a single inbound message: `reply` answers it and
/// `fetch_attachment` downloads its media.
pub trait MessageChannel: Send + Sync {
    fn reply(&self, text: &str) -> impl Future<Output = Result<(), ChannelError>> + Send;

    fn fetch_attachment(&self) -> impl Future<Output = Result<Attachment, ChannelError>> + Send;
}
