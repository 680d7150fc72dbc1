//! Finance engine: ledger, categories, budgets, insights and access control.
//!
//! [`Engine`] is the state container. It is built once at startup from a
//! [`Store`], mutated by one command at a time, and rewrites the affected
//! collection in full after every mutation.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

pub use access::{Admission, AllowList, OwnerBinding, Sender, admit};
pub use budgets::{Budget, BudgetLevel, BudgetStatus, BudgetTable};
pub use categories::{Category, CategoryTable, KeywordAdded, OTHER_CATEGORY};
pub use entry::{Author, Entry, EntryKind, INCOME_CATEGORY};
pub use error::EngineError;
pub use insights::{Insight, Trend};
pub use ledger::{CategoryTotals, Ledger, Period};
pub use money::MoneyCents;
pub use store::{Collection, FileStore, MemoryStore, Store, StoreError};

mod access;
mod budgets;
mod categories;
mod entry;
mod error;
pub mod insights;
mod ledger;
mod money;
mod store;

type ResultEngine<T> = Result<T, EngineError>;

/// Time zone used for calendar periods when none is configured.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Sao_Paulo;

pub struct Engine {
    ledger: Ledger,
    categories: CategoryTable,
    budgets: BudgetTable,
    allow_list: AllowList,
    owner: Option<OwnerBinding>,
    timezone: Tz,
    store: Box<dyn Store>,
    unsaved: BTreeSet<Collection>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    pub fn budgets(&self) -> &BudgetTable {
        &self.budgets
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    pub fn owner_binding(&self) -> Option<&OwnerBinding> {
        self.owner.as_ref()
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn classify(&self, text: &str) -> &str {
        self.categories.classify(text)
    }

    pub fn admit(&self, sender: Sender<'_>) -> Admission {
        access::admit(sender, &self.allow_list, self.owner.as_ref())
    }

    /// Records an expense. The category is the classified description, or the
    /// description itself when nothing matches.
    pub fn record_expense(
        &mut self,
        amount: MoneyCents,
        description: &str,
        author: Author,
        at: DateTime<Utc>,
    ) -> Entry {
        let category = self.categories.resolve(description);
        let entry = Entry::expense(amount, category, author, at);
        self.append(entry)
    }

    pub fn record_income(
        &mut self,
        amount: MoneyCents,
        source: &str,
        author: Author,
        at: DateTime<Utc>,
    ) -> Entry {
        let entry = Entry::income(amount, source.trim(), author, at);
        self.append(entry)
    }

    /// Stores the receipt image and records a zero-valued pending entry.
    pub fn record_receipt(
        &mut self,
        image: &[u8],
        extension: &str,
        author: Author,
        at: DateTime<Utc>,
    ) -> ResultEngine<Entry> {
        let file_name = format!("receipt_{}.{extension}", Uuid::new_v4());
        let reference = self.store.save_receipt(&file_name, image)?;
        tracing::info!("receipt stored as {reference}");
        let entry = Entry::pending_receipt(reference, OTHER_CATEGORY, author, at);
        Ok(self.append(entry))
    }

    /// Sets value and category of the most recent pending receipt.
    pub fn amend_receipt(&mut self, amount: MoneyCents, description: &str) -> ResultEngine<Entry> {
        let category = self.categories.resolve(description);
        let entry = self.ledger.amend_receipt(amount, category)?.clone();
        self.persist(Collection::Entries);
        Ok(entry)
    }

    /// Removes the most recently recorded entry.
    pub fn undo_last(&mut self) -> ResultEngine<Entry> {
        let entry = self.ledger.undo_last()?;
        tracing::info!("removed last entry ({} {})", entry.value, entry.category);
        self.persist(Collection::Entries);
        Ok(entry)
    }

    pub fn set_budget(&mut self, category: &str, limit: MoneyCents) -> ResultEngine<()> {
        self.budgets.set(category, limit)?;
        tracing::info!("budget for {category} set to {limit}");
        self.persist(Collection::Budgets);
        Ok(())
    }

    pub fn add_keyword(&mut self, keyword: &str, category: &str) -> KeywordAdded {
        let outcome = self.categories.add_keyword(keyword, category);
        if outcome != KeywordAdded::AlreadyPresent {
            tracing::info!("keyword {keyword} added to {category}");
            self.persist(Collection::Categories);
        }
        outcome
    }

    /// Returns `false` if the contact is empty or already allowed.
    pub fn allow_contact(&mut self, contact: &str) -> bool {
        let added = self.allow_list.allow(contact);
        if added {
            self.persist(Collection::AllowList);
        }
        added
    }

    /// Returns `false` if the contact was not allowed.
    pub fn remove_contact(&mut self, contact: &str) -> bool {
        let removed = self.allow_list.remove(contact);
        if removed {
            self.persist(Collection::AllowList);
        }
        removed
    }

    /// Makes `conversation` the only one the owner is served in.
    pub fn bind_owner(&mut self, conversation: &str) {
        self.owner = Some(OwnerBinding {
            conversation: conversation.to_string(),
        });
        tracing::info!("owner conversation bound to {conversation}");
        self.persist(Collection::OwnerBinding);
    }

    /// Non-income totals per category inside `period`, in first-appearance order.
    pub fn period_totals(&self, period: Period, now: DateTime<Utc>) -> CategoryTotals {
        CategoryTotals::from_entries(
            self.ledger
                .by_period(period, now, self.timezone)
                .filter(|entry| !entry.is_income()),
        )
    }

    pub fn budget_statuses(&self, now: DateTime<Utc>) -> Vec<BudgetStatus> {
        self.budgets.statuses(&self.ledger, now, self.timezone)
    }

    pub fn check_alerts(&self, now: DateTime<Utc>) -> Vec<BudgetStatus> {
        self.budgets.check_alerts(&self.ledger, now, self.timezone)
    }

    pub fn insights(&self, now: DateTime<Utc>) -> Vec<Insight> {
        insights::generate(&self.ledger, &self.categories, now, self.timezone)
    }

    /// Collections whose last save failed.
    pub fn unsaved(&self) -> impl Iterator<Item = Collection> + '_ {
        self.unsaved.iter().copied()
    }

    pub fn has_unsaved(&self) -> bool {
        !self.unsaved.is_empty()
    }

    /// Rewrites every collection.
    pub fn flush(&mut self) -> ResultEngine<()> {
        for collection in Collection::ALL {
            self.save(collection)?;
            self.unsaved.remove(&collection);
        }
        tracing::info!("all collections flushed");
        Ok(())
    }

    fn append(&mut self, entry: Entry) -> Entry {
        self.ledger.append(entry.clone());
        tracing::info!(
            "recorded {:?} entry: {} {} by {}",
            entry.kind,
            entry.value,
            entry.category,
            entry.author
        );
        self.persist(Collection::Entries);
        entry
    }

    /// Saves `collection` together with any collection whose previous save
    /// failed. Failures are logged and kept for the next attempt; the
    /// in-memory state stays authoritative.
    fn persist(&mut self, collection: Collection) {
        self.unsaved.insert(collection);
        let pending: Vec<Collection> = self.unsaved.iter().copied().collect();
        for collection in pending {
            match self.save(collection) {
                Ok(()) => {
                    self.unsaved.remove(&collection);
                }
                Err(err) => tracing::error!("failed to save {collection}: {err}"),
            }
        }
    }

    fn save(&self, collection: Collection) -> Result<(), StoreError> {
        let value = self.snapshot(collection)?;
        self.store.save(collection, &value)
    }

    fn snapshot(&self, collection: Collection) -> Result<Value, serde_json::Error> {
        match collection {
            Collection::Entries => serde_json::to_value(&self.ledger),
            Collection::Categories => serde_json::to_value(&self.categories),
            Collection::Budgets => serde_json::to_value(&self.budgets),
            Collection::AllowList => serde_json::to_value(&self.allow_list),
            Collection::OwnerBinding => serde_json::to_value(&self.owner),
        }
    }
}

fn load<T>(store: &dyn Store, collection: Collection) -> ResultEngine<T>
where
    T: DeserializeOwned + Default,
{
    match store.load(collection)? {
        Some(value) => {
            serde_json::from_value(value).map_err(|err| EngineError::Store(StoreError::Json(err)))
        }
        None => {
            tracing::info!("no saved {collection}, starting from defaults");
            Ok(T::default())
        }
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Box<dyn Store>>,
    timezone: Option<Tz>,
}

impl EngineBuilder {
    /// Pass the store collections are loaded from and saved to.
    pub fn store(mut self, store: impl Store + 'static) -> EngineBuilder {
        self.store = Some(Box::new(store));
        self
    }

    /// Time zone used to align calendar periods.
    pub fn timezone(mut self, timezone: Tz) -> EngineBuilder {
        self.timezone = Some(timezone);
        self
    }

    /// Construct `Engine`, loading every collection from the store.
    pub fn build(self) -> ResultEngine<Engine> {
        let store = self
            .store
            .unwrap_or_else(|| Box::new(MemoryStore::default()));

        let ledger: Ledger = load(store.as_ref(), Collection::Entries)?;
        let categories: CategoryTable = load(store.as_ref(), Collection::Categories)?;
        let budgets: BudgetTable = load(store.as_ref(), Collection::Budgets)?;
        let allow_list: AllowList = load(store.as_ref(), Collection::AllowList)?;
        let owner: Option<OwnerBinding> = load(store.as_ref(), Collection::OwnerBinding)?;

        tracing::info!(
            "engine loaded: {} entries, {} categories, {} budgets, {} allowed contacts",
            ledger.len(),
            categories.len(),
            budgets.len(),
            allow_list.len()
        );

        Ok(Engine {
            ledger,
            categories,
            budgets,
            allow_list,
            owner,
            timezone: self.timezone.unwrap_or(DEFAULT_TIMEZONE),
            store,
            unsaved: BTreeSet::new(),
        })
    }
}
