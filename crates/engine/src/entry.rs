//! A single financial event recorded in the ledger.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::MoneyCents;

/// Category carried by every income entry.
pub const INCOME_CATEGORY: &str = "receita";

/// Identifier stored in place of a contact when the owner records an entry.
const OWNER_AUTHOR: &str = "self";

/// How an entry entered the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    /// Expense typed as text.
    Text,
    Income,
    /// Uploaded receipt image still waiting for its value.
    ReceiptPending,
    /// Receipt whose value and category were set.
    Receipt,
}

/// Who recorded an entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Author {
    Owner,
    Contact(String),
}

impl From<String> for Author {
    fn from(value: String) -> Self {
        if value == OWNER_AUTHOR {
            Author::Owner
        } else {
            Author::Contact(value)
        }
    }
}

impl From<Author> for String {
    fn from(value: Author) -> Self {
        match value {
            Author::Owner => OWNER_AUTHOR.to_string(),
            Author::Contact(id) => id,
        }
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Author::Owner => f.write_str(OWNER_AUTHOR),
            Author::Contact(id) => f.write_str(id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub value: MoneyCents,
    pub category: String,
    pub timestamp: DateTime<Utc>,
    pub author: Author,
    pub kind: EntryKind,
    /// Where the money came from. Income only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Reference to the stored receipt image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
}

impl Entry {
    pub fn expense(
        value: MoneyCents,
        category: impl Into<String>,
        author: Author,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            value,
            category: category.into(),
            timestamp,
            author,
            kind: EntryKind::Text,
            source: None,
            attachment: None,
        }
    }

    pub fn income(
        value: MoneyCents,
        source: impl Into<String>,
        author: Author,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            value,
            category: INCOME_CATEGORY.to_string(),
            timestamp,
            author,
            kind: EntryKind::Income,
            source: Some(source.into()),
            attachment: None,
        }
    }

    /// A receipt with zero value filed under `category` until amended.
    pub fn pending_receipt(
        attachment: impl Into<String>,
        category: impl Into<String>,
        author: Author,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            value: MoneyCents::ZERO,
            category: category.into(),
            timestamp,
            author,
            kind: EntryKind::ReceiptPending,
            source: None,
            attachment: Some(attachment.into()),
        }
    }

    pub fn is_income(&self) -> bool {
        self.kind == EntryKind::Income
    }
}
