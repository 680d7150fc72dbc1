use std::sync::Arc;

use chrono::{DateTime, Utc};
use engine::{Admission, Author, Engine, EngineError, Entry, Period, Sender};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    channel::{ChannelError, Inbound, MessageChannel},
    commands::{Command, Parser},
    parsing::ParseError,
    ui,
};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Runs inbound messages through access control, command parsing and the
/// engine, and answers on the channel they came from.
///
/// The engine lock is held for the whole processing of a message, so
/// messages are handled strictly one after the other.
pub struct Processor {
    engine: Arc<Mutex<Engine>>,
    parser: Parser,
    started_at: DateTime<Utc>,
}

impl Processor {
    pub fn new(engine: Arc<Mutex<Engine>>) -> Result<Self, regex::Error> {
        Ok(Self {
            engine,
            parser: Parser::new()?,
            started_at: Utc::now(),
        })
    }

    pub fn engine(&self) -> &Arc<Mutex<Engine>> {
        &self.engine
    }

    /// Processes one message. Never fails: errors are logged and answered
    /// with a generic apology.
    pub async fn process<C: MessageChannel>(&self, channel: &C, inbound: &Inbound) {
        if let Err(err) = self.try_process(channel, inbound).await {
            tracing::error!(
                "failed to process message from {}: {err}",
                inbound.sender
            );
            if let Err(err) = channel.reply(ui::APOLOGY).await {
                tracing::error!("failed to send error reply: {err}");
            }
        }
    }

    async fn try_process<C: MessageChannel>(
        &self,
        channel: &C,
        inbound: &Inbound,
    ) -> Result<(), ProcessError> {
        let mut engine = self.engine.lock().await;

        let sender = Sender {
            from_self: inbound.from_self,
            id: &inbound.sender,
            conversation: &inbound.conversation,
        };
        match engine.admit(sender) {
            Admission::Pass => {}
            Admission::BindOwner => {
                engine.bind_owner(&inbound.conversation);
                channel
                    .reply(&with_unsaved_warning(&engine, ui::CONVERSATION_BOUND.to_string()))
                    .await?;
                return Ok(());
            }
            Admission::ForeignConversation => {
                tracing::warn!(
                    "ignoring owner message from conversation {}",
                    inbound.conversation
                );
                return Ok(());
            }
            Admission::NotAllowed => {
                tracing::warn!("ignoring message from {} (not allowed)", inbound.sender);
                return Ok(());
            }
        }

        tracing::debug!(
            "received {:?} from {}",
            inbound.text,
            if inbound.from_self { "owner" } else { inbound.sender.as_str() }
        );

        let command =
            match self
                .parser
                .parse(&inbound.text, inbound.from_self, inbound.has_attachment)
            {
                Ok(Some(command)) => command,
                Ok(None) => return Ok(()),
                Err(ParseError::InvalidAmount(raw)) => {
                    tracing::warn!("invalid amount {raw:?}");
                    channel.reply(&ui::invalid_amount(&raw)).await?;
                    return Ok(());
                }
            };

        let reply = self
            .dispatch(&mut engine, channel, inbound, command, Utc::now())
            .await?;
        channel
            .reply(&with_unsaved_warning(&engine, reply))
            .await?;
        Ok(())
    }

    async fn dispatch<C: MessageChannel>(
        &self,
        engine: &mut Engine,
        channel: &C,
        inbound: &Inbound,
        command: Command,
        now: DateTime<Utc>,
    ) -> Result<String, ProcessError> {
        let author = if inbound.from_self {
            Author::Owner
        } else {
            Author::Contact(inbound.sender.clone())
        };

        let reply = match command {
            Command::AllowContact(contact) => {
                if engine.allow_contact(&contact) {
                    tracing::info!("contact {contact} allowed");
                    ui::contact_allowed(&contact)
                } else {
                    ui::CONTACT_REJECTED.to_string()
                }
            }
            Command::RemoveContact(contact) => {
                if engine.remove_contact(&contact) {
                    tracing::info!("contact {contact} removed");
                    ui::contact_removed(&contact)
                } else {
                    ui::CONTACT_NOT_FOUND.to_string()
                }
            }
            Command::ListContacts => ui::contacts(engine.allow_list().iter()),
            Command::BindConversation => {
                engine.bind_owner(&inbound.conversation);
                ui::CONVERSATION_BOUND.to_string()
            }
            Command::RecordExpense {
                amount,
                description,
            } => {
                let entry = engine.record_expense(amount, &description, author, now);
                ui::expense_recorded(&entry, &engine.check_alerts(now))
            }
            Command::RecordIncome { amount, source } => {
                let entry = engine.record_income(amount, &source, author, now);
                ui::income_recorded(&entry)
            }
            Command::UploadReceipt => match store_receipt(engine, channel, author, now).await {
                Ok(_) => ui::RECEIPT_SAVED.to_string(),
                Err(err) => {
                    tracing::error!("failed to process receipt: {err}");
                    ui::RECEIPT_FAILED.to_string()
                }
            },
            Command::AmendReceipt {
                amount,
                description,
            } => match engine.amend_receipt(amount, &description) {
                Ok(entry) => ui::receipt_amended(&entry, &engine.check_alerts(now)),
                Err(EngineError::NoReceiptPending) => ui::NO_PENDING_RECEIPT.to_string(),
                Err(err) => return Err(err.into()),
            },
            Command::DefineBudget { category, limit } => {
                match engine.set_budget(&category, limit) {
                    Ok(()) => ui::budget_defined(&category, limit),
                    Err(EngineError::InvalidBudget(_)) => ui::INVALID_BUDGET.to_string(),
                    Err(err) => return Err(err.into()),
                }
            }
            Command::AddKeyword { keyword, category } => {
                let outcome = engine.add_keyword(&keyword, &category);
                ui::keyword_added(outcome, &keyword, &category)
            }
            Command::Summary => ui::summary(engine.ledger(), engine.timezone()),
            Command::SummaryByCategory => {
                let totals = engine.ledger().by_category().ranked(engine.categories());
                ui::category_summary(engine.ledger(), &totals)
            }
            Command::PeriodSummary(period) => {
                let totals = engine
                    .period_totals(period, now)
                    .ranked(engine.categories());
                ui::period_summary(period, &totals)
            }
            Command::Insights => ui::insights(&engine.insights(now)),
            Command::Budgets => ui::budgets(&engine.budget_statuses(now)),
            Command::UndoLast => match engine.undo_last() {
                Ok(entry) => ui::undone(&entry),
                Err(EngineError::EmptyLedger) => ui::NOTHING_TO_UNDO.to_string(),
                Err(err) => return Err(err.into()),
            },
            Command::Ranking => {
                let totals = engine
                    .period_totals(Period::Month, now)
                    .ranked(engine.categories());
                ui::ranking(engine.ledger(), &totals)
            }
            Command::Status => ui::status(
                self.started_at,
                now,
                engine.ledger().len(),
                engine.allow_list().len(),
            ),
            Command::Help => ui::help(inbound.from_self),
        };
        Ok(reply)
    }
}

async fn store_receipt<C: MessageChannel>(
    engine: &mut Engine,
    channel: &C,
    author: Author,
    now: DateTime<Utc>,
) -> Result<Entry, ProcessError> {
    let attachment = channel.fetch_attachment().await?;
    let entry = engine.record_receipt(&attachment.bytes, attachment.extension(), author, now)?;
    Ok(entry)
}

fn with_unsaved_warning(engine: &Engine, mut reply: String) -> String {
    if engine.has_unsaved() {
        reply.push_str("\n\n");
        reply.push_str(ui::UNSAVED_WARNING);
    }
    reply
}
