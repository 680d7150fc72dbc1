//! Command recognition.
//!
//! Rules are tried in a fixed order and the first one that matches wins;
//! patterns overlap, so the order is part of the behaviour. Text that matches
//! no rule is not a command.

use engine::{MoneyCents, Period};
use regex::Regex;

use crate::parsing::{ParseError, fold_phrase, parse_amount};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    AllowContact(String),
    RemoveContact(String),
    ListContacts,
    BindConversation,
    RecordExpense {
        amount: MoneyCents,
        description: String,
    },
    RecordIncome {
        amount: MoneyCents,
        source: String,
    },
    UploadReceipt,
    AmendReceipt {
        amount: MoneyCents,
        description: String,
    },
    DefineBudget {
        category: String,
        limit: MoneyCents,
    },
    AddKeyword {
        keyword: String,
        category: String,
    },
    Summary,
    SummaryByCategory,
    PeriodSummary(Period),
    Insights,
    Budgets,
    UndoLast,
    Ranking,
    Status,
    Help,
}

const RECEIPT_WORDS: [&str; 2] = ["comprovante", "receipt"];

/// Compiled command patterns.
#[derive(Clone, Debug)]
pub struct Parser {
    expense: Regex,
    income: Regex,
    amend: Regex,
    budget: Regex,
    keyword: Regex,
}

impl Parser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            expense: Regex::new(r"(?:gastei|spent)\s*r?\$?\s*(\d+[.,]?\d*)\s+(?:com|on)\s+(.+)")?,
            income: Regex::new(
                r"(?:recebi|received)\s*r?\$?\s*(\d+[.,]?\d*)\s+(?:de|com|from|with)\s+(.+)",
            )?,
            amend: Regex::new(
                r"(?:valor\s+comprovante|set\s+receipt\s+value)\s*r?\$?\s*(\d+[.,]?\d*)\s+(.+)",
            )?,
            budget: Regex::new(
                r"(?:(?:definir|criar)\s+or[çc]amento\s+(?:de|para)|(?:set|create)\s+budget\s+for)\s+(.+?)\s+(?:r?\$\s*)?(\d+[.,]?\d*)\s*$",
            )?,
            keyword: Regex::new(
                r"(?:adicionar|add)\s+(.+)\s+(?:à|a|na|to)\s+categor(?:ia|y)\s+(.+)",
            )?,
        })
    }

    /// Recognises the command in `text`.
    ///
    /// Admin commands are only recognised for the owner. `Ok(None)` means the
    /// text is ordinary conversation.
    pub fn parse(
        &self,
        text: &str,
        from_self: bool,
        has_attachment: bool,
    ) -> Result<Option<Command>, ParseError> {
        let text = text.to_lowercase();
        let phrase = fold_phrase(&text);

        if from_self && let Some(command) = admin_command(&text, &phrase) {
            return Ok(Some(command));
        }

        if let Some(caps) = self.expense.captures(&text) {
            return Ok(Some(Command::RecordExpense {
                amount: parse_amount(&caps[1])?,
                description: caps[2].trim().to_string(),
            }));
        }

        if let Some(caps) = self.income.captures(&text) {
            return Ok(Some(Command::RecordIncome {
                amount: parse_amount(&caps[1])?,
                source: caps[2].trim().to_string(),
            }));
        }

        if has_attachment && RECEIPT_WORDS.iter().any(|word| text.contains(word)) {
            return Ok(Some(Command::UploadReceipt));
        }

        if let Some(caps) = self.amend.captures(&text) {
            return Ok(Some(Command::AmendReceipt {
                amount: parse_amount(&caps[1])?,
                description: caps[2].trim().to_string(),
            }));
        }

        if let Some(caps) = self.budget.captures(&text) {
            return Ok(Some(Command::DefineBudget {
                category: caps[1].trim().to_string(),
                limit: parse_amount(&caps[2])?,
            }));
        }

        if let Some(caps) = self.keyword.captures(&text) {
            return Ok(Some(Command::AddKeyword {
                keyword: caps[1].trim().to_string(),
                category: caps[2].trim().to_string(),
            }));
        }

        Ok(fixed_phrase(&phrase))
    }
}

fn admin_command(text: &str, phrase: &str) -> Option<Command> {
    let text = text.trim_start();
    if let Some(contact) = text
        .strip_prefix("permitir ")
        .or_else(|| text.strip_prefix("allow "))
    {
        return Some(Command::AllowContact(contact.trim().to_string()));
    }
    if let Some(contact) = text
        .strip_prefix("remover ")
        .or_else(|| text.strip_prefix("remove "))
    {
        return Some(Command::RemoveContact(contact.trim().to_string()));
    }

    match phrase {
        "listar permitidos" | "list contacts" => Some(Command::ListContacts),
        "configurar chat" | "bind chat" => Some(Command::BindConversation),
        _ => None,
    }
}

fn fixed_phrase(phrase: &str) -> Option<Command> {
    let command = match phrase {
        "resumo" | "summary" => Command::Summary,
        "resumo por categoria" | "summary by category" => Command::SummaryByCategory,
        "resumo hoje" | "summary today" => Command::PeriodSummary(Period::Day),
        "resumo semana" | "summary week" => Command::PeriodSummary(Period::Week),
        "resumo mes" | "summary month" => Command::PeriodSummary(Period::Month),
        "resumo ano" | "summary year" => Command::PeriodSummary(Period::Year),
        "insights" | "dicas" | "tips" => Command::Insights,
        "orcamentos" | "budgets" => Command::Budgets,
        "excluir ultimo" | "undo last" => Command::UndoLast,
        "ranking" | "ranking de gastos" => Command::Ranking,
        "status" | "status servidor" => Command::Status,
        "ajuda" | "help" => Command::Help,
        _ => return None,
    };
    Some(command)
}
