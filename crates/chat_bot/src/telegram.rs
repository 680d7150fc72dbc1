//! Telegram transport.

use teloxide::{net::Download, prelude::*, types::FileId};

use crate::channel::{Attachment, ChannelError, Inbound, MessageChannel};

const PHOTO_MIME_TYPE: &str = "image/jpeg";

/// Reply side of one Telegram message.
pub(crate) struct TelegramChannel {
    bot: Bot,
    msg: Message,
}

impl TelegramChannel {
    pub(crate) fn new(bot: Bot, msg: Message) -> Self {
        Self { bot, msg }
    }

    /// The largest photo size, or the document, with its MIME type.
    fn media(&self) -> Option<(FileId, String)> {
        if let Some(photo) = self.msg.photo().and_then(|sizes| sizes.last()) {
            return Some((photo.file.id.clone(), PHOTO_MIME_TYPE.to_string()));
        }
        self.msg.document().map(|document| {
            let mime_type = document
                .mime_type
                .as_ref()
                .map_or_else(|| "application/octet-stream".to_string(), |m| m.to_string());
            (document.file.id.clone(), mime_type)
        })
    }
}

impl MessageChannel for TelegramChannel {
    async fn reply(&self, text: &str) -> Result<(), ChannelError> {
        self.bot.send_message(self.msg.chat.id, text).await?;
        Ok(())
    }

    async fn fetch_attachment(&self) -> Result<Attachment, ChannelError> {
        let (file_id, mime_type) = self.media().ok_or(ChannelError::NoAttachment)?;
        let file = self.bot.get_file(file_id).await?;
        let mut bytes = Vec::new();
        self.bot.download_file(&file.path, &mut bytes).await?;
        Ok(Attachment { mime_type, bytes })
    }
}

/// Builds the transport-independent view of `msg`.
///
/// The owner is recognised by user id; the conversation is the chat.
pub(crate) fn inbound(msg: &Message, owner: Option<UserId>) -> Option<Inbound> {
    let from = msg.from.as_ref()?;
    let text = msg.text().or_else(|| msg.caption()).unwrap_or_default();

    Some(Inbound {
        text: text.to_string(),
        sender: from.id.0.to_string(),
        conversation: msg.chat.id.0.to_string(),
        from_self: owner == Some(from.id),
        has_attachment: msg.photo().is_some() || msg.document().is_some(),
    })
}

pub(crate) async fn handle_message(
    bot: Bot,
    msg: Message,
    cfg: crate::ConfigParameters,
) -> ResponseResult<()> {
    let Some(inbound) = inbound(&msg, cfg.owner) else {
        tracing::warn!("ignoring message without sender in chat {}", msg.chat.id.0);
        return Ok(());
    };

    let channel = TelegramChannel::new(bot, msg);
    cfg.processor.process(&channel, &inbound).await;
    Ok(())
}
