//! Chat front end of the finance engine.
//!
//! [`Processor`] turns inbound messages into engine operations and replies;
//! it only needs a [`MessageChannel`]. [`Bot`] plugs it into Telegram.

use std::sync::Arc;

use engine::Engine;
use teloxide::prelude::*;
use tokio::sync::Mutex;

pub use channel::{Attachment, ChannelError, Inbound, MessageChannel};
pub use commands::{Command, Parser};
pub use handlers::{ProcessError, Processor};
pub use parsing::ParseError;

mod channel;
mod commands;
mod handlers;
mod parsing;
mod telegram;
mod ui;

#[derive(Clone)]
pub(crate) struct ConfigParameters {
    owner: Option<UserId>,
    processor: Arc<Processor>,
}

pub struct Bot {
    token: String,
    owner: Option<UserId>,
    processor: Arc<Processor>,
}

impl Bot {
    pub fn new(
        token: &str,
        owner: Option<UserId>,
        engine: Arc<Mutex<Engine>>,
    ) -> Result<Self, String> {
        let processor = Processor::new(engine)
            .map_err(|err| format!("failed to compile command patterns: {err}"))?;

        Ok(Self {
            token: token.to_string(),
            owner,
            processor: Arc::new(processor),
        })
    }

    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub async fn run(&self) {
        tracing::info!("Starting telegram bot...");
        if self.owner.is_none() {
            tracing::warn!("no owner configured: only allowed contacts will be served");
        }

        let bot = teloxide::Bot::new(&self.token);
        let parameters = ConfigParameters {
            owner: self.owner,
            processor: self.processor.clone(),
        };

        let handler =
            dptree::entry().branch(Update::filter_message().endpoint(telegram::handle_message));

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![parameters])
            .default_handler(|upd| async move {
                tracing::warn!("Unhandled update: {:?}", upd);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

#[derive(Default)]
pub struct BotBuilder {
    token: String,
    owner: Option<UserId>,
    engine: Option<Arc<Mutex<Engine>>>,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    /// Telegram user whose messages count as sent by the owner.
    pub fn owner(mut self, owner: u64) -> BotBuilder {
        self.owner = Some(UserId(owner));
        self
    }

    pub fn engine(mut self, engine: Arc<Mutex<Engine>>) -> BotBuilder {
        self.engine = Some(engine);
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        tracing::info!("Initializing telegram bot...");
        let engine = self.engine.ok_or("the bot needs an engine")?;
        Bot::new(&self.token, self.owner, engine)
    }
}
