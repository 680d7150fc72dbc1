//! Append-only collection of entries and the aggregation queries over it.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{CategoryTable, EngineError, Entry, EntryKind, MoneyCents, ResultEngine};

/// Reporting window, ending at "now".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Period {
    /// The last 24 hours.
    Day,
    /// Since the start of the local calendar week (Sunday).
    Week,
    Month,
    Year,
}

impl Period {
    /// First instant included in the window ending at `now`.
    pub fn start(self, now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
        let local = now.with_timezone(&tz).date_naive();
        let first_day = match self {
            Period::Day => return now - Duration::hours(24),
            Period::Week => {
                local - Duration::days(i64::from(local.weekday().num_days_from_sunday()))
            }
            Period::Month => local.with_day(1).unwrap_or(local),
            Period::Year => NaiveDate::from_ymd_opt(local.year(), 1, 1).unwrap_or(local),
        };
        local_midnight(first_day, tz)
    }
}

/// Start of `date` in `tz`, as a UTC instant.
///
/// Zones that skip midnight on DST changes start the day at the first
/// existing local time.
fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    (0..=2)
        .find_map(|hour| {
            tz.from_local_datetime(&(midnight + Duration::hours(hour)))
                .earliest()
        })
        .map_or_else(
            || Utc.from_utc_datetime(&midnight),
            |local| local.with_timezone(&Utc),
        )
}

/// Totals per category, in first-appearance order until sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryTotals(Vec<(String, MoneyCents)>);

impl CategoryTotals {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Self {
        let mut totals: Vec<(String, MoneyCents)> = Vec::new();
        for entry in entries {
            match totals.iter_mut().find(|(name, _)| *name == entry.category) {
                Some((_, total)) => *total += entry.value,
                None => totals.push((entry.category.clone(), entry.value)),
            }
        }
        Self(totals)
    }

    pub fn get(&self, category: &str) -> MoneyCents {
        self.0
            .iter()
            .find(|(name, _)| name == category)
            .map_or(MoneyCents::ZERO, |(_, total)| *total)
    }

    pub fn total(&self) -> MoneyCents {
        self.0.iter().map(|(_, total)| *total).sum()
    }

    /// Sorts by total, highest first.
    ///
    /// Ties follow the category table order; categories missing from the
    /// table come after, in first-appearance order.
    pub fn ranked(mut self, table: &CategoryTable) -> Self {
        self.0.sort_by(|(a_name, a_total), (b_name, b_total)| {
            b_total.cmp(a_total).then_with(|| {
                let a = table.position(a_name).unwrap_or(usize::MAX);
                let b = table.position(b_name).unwrap_or(usize::MAX);
                a.cmp(&b)
            })
        });
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, MoneyCents)> {
        self.0.iter().map(|(name, total)| (name.as_str(), *total))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: Vec<Entry>,
}

impl Ledger {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    pub fn append(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Removes the most recently appended entry, whatever its kind.
    pub fn undo_last(&mut self) -> ResultEngine<Entry> {
        self.entries.pop().ok_or(EngineError::EmptyLedger)
    }

    /// Sets value and category of the latest pending receipt, which becomes a
    /// plain receipt.
    pub fn amend_receipt(&mut self, value: MoneyCents, category: String) -> ResultEngine<&Entry> {
        let entry = self
            .entries
            .iter_mut()
            .rev()
            .find(|entry| entry.kind == EntryKind::ReceiptPending)
            .ok_or(EngineError::NoReceiptPending)?;
        entry.value = value;
        entry.category = category;
        entry.kind = EntryKind::Receipt;
        Ok(&*entry)
    }

    /// Non-income totals per category.
    pub fn by_category(&self) -> CategoryTotals {
        CategoryTotals::from_entries(self.expenses())
    }

    /// Entries recorded inside `period`, income included.
    pub fn by_period(
        &self,
        period: Period,
        now: DateTime<Utc>,
        tz: Tz,
    ) -> impl Iterator<Item = &Entry> {
        let start = period.start(now, tz);
        self.entries
            .iter()
            .filter(move |entry| entry.timestamp >= start && entry.timestamp <= now)
    }

    pub fn expenses(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|entry| !entry.is_income())
    }

    pub fn incomes(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|entry| entry.is_income())
    }

    pub fn total_expenses(&self) -> MoneyCents {
        self.expenses().map(|entry| entry.value).sum()
    }

    pub fn total_income(&self) -> MoneyCents {
        self.incomes().map(|entry| entry.value).sum()
    }

    /// Income minus expenses.
    pub fn balance(&self) -> MoneyCents {
        self.total_income() - self.total_expenses()
    }

    /// The `limit` newest non-income entries, newest first.
    pub fn latest_expenses(&self, limit: usize) -> Vec<&Entry> {
        let mut expenses: Vec<&Entry> = self.expenses().collect();
        expenses.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        expenses.truncate(limit);
        expenses
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&Entry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono_tz::America::Sao_Paulo;

    use super::*;
    use crate::{Author, OTHER_CATEGORY};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Sao_Paulo
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc)
    }

    fn expense(cents: i64, category: &str, when: DateTime<Utc>) -> Entry {
        Entry::expense(MoneyCents::new(cents), category, Author::Owner, when)
    }

    #[test]
    fn by_category_excludes_income_and_sums_to_total_expenses() {
        let now = at(2025, 3, 15, 12);
        let mut ledger = Ledger::default();
        ledger.append(expense(1000, "alimentação", now));
        ledger.append(Entry::income(MoneyCents::new(50_000), "salário", Author::Owner, now));
        ledger.append(expense(250, "transporte", now));
        ledger.append(expense(500, "alimentação", now));

        let totals = ledger.by_category();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals.get("alimentação"), MoneyCents::new(1500));
        assert_eq!(totals.get(crate::INCOME_CATEGORY), MoneyCents::ZERO);
        assert_eq!(totals.total(), ledger.total_expenses());
        assert_eq!(ledger.balance(), MoneyCents::new(48_250));
    }

    #[test]
    fn undo_is_inverse_of_append() {
        let now = at(2025, 3, 15, 12);
        let mut ledger = Ledger::default();
        ledger.append(expense(1000, "lazer", now));
        let before = ledger.clone();

        let appended = expense(700, "moradia", now);
        ledger.append(appended.clone());
        assert_eq!(ledger.undo_last().unwrap(), appended);
        assert_eq!(ledger, before);
    }

    #[test]
    fn undo_on_empty_ledger_fails() {
        let mut ledger = Ledger::default();
        assert_eq!(ledger.undo_last().unwrap_err(), EngineError::EmptyLedger);
    }

    #[test]
    fn amend_targets_latest_pending_receipt() {
        let now = at(2025, 3, 15, 12);
        let mut ledger = Ledger::default();
        ledger.append(Entry::pending_receipt("a.jpeg", OTHER_CATEGORY, Author::Owner, now));
        ledger.append(Entry::pending_receipt("b.jpeg", OTHER_CATEGORY, Author::Owner, now));
        ledger.append(expense(100, "lazer", now));

        let amended = ledger
            .amend_receipt(MoneyCents::new(4590), "saúde".to_string())
            .unwrap();
        assert_eq!(amended.attachment.as_deref(), Some("b.jpeg"));
        assert_eq!(amended.kind, EntryKind::Receipt);

        let amended = ledger
            .amend_receipt(MoneyCents::new(10), "lazer".to_string())
            .unwrap();
        assert_eq!(amended.attachment.as_deref(), Some("a.jpeg"));

        assert_eq!(
            ledger
                .amend_receipt(MoneyCents::new(10), "lazer".to_string())
                .unwrap_err(),
            EngineError::NoReceiptPending
        );
    }

    #[test]
    fn period_starts_are_calendar_aligned() {
        // Wednesday.
        let now = at(2025, 3, 12, 15);
        assert_eq!(Period::Day.start(now, Sao_Paulo), now - Duration::hours(24));
        assert_eq!(Period::Week.start(now, Sao_Paulo), at(2025, 3, 9, 0));
        assert_eq!(Period::Month.start(now, Sao_Paulo), at(2025, 3, 1, 0));
        assert_eq!(Period::Year.start(now, Sao_Paulo), at(2025, 1, 1, 0));
    }

    #[test]
    fn by_period_filters_window() {
        let now = at(2025, 3, 12, 15);
        let mut ledger = Ledger::default();
        ledger.append(expense(100, "a", at(2025, 2, 28, 23)));
        ledger.append(expense(200, "b", at(2025, 3, 1, 0)));
        ledger.append(expense(300, "c", at(2025, 3, 11, 16)));
        ledger.append(expense(400, "d", at(2025, 3, 13, 10)));

        let month: Vec<i64> = ledger
            .by_period(Period::Month, now, Sao_Paulo)
            .map(|e| e.value.cents())
            .collect();
        assert_eq!(month, vec![200, 300]);

        let day: Vec<i64> = ledger
            .by_period(Period::Day, now, Sao_Paulo)
            .map(|e| e.value.cents())
            .collect();
        assert_eq!(day, vec![300]);

        assert_eq!(ledger.by_period(Period::Year, now, Sao_Paulo).count(), 3);
    }

    #[test]
    fn ranked_breaks_ties_by_table_order() {
        let now = at(2025, 3, 12, 15);
        let table = CategoryTable::default();
        let mut ledger = Ledger::default();
        ledger.append(expense(500, "pet shop", now));
        ledger.append(expense(500, "lazer", now));
        ledger.append(expense(500, "transporte", now));
        ledger.append(expense(900, "moradia", now));

        let ranked = ledger.by_category().ranked(&table);
        let names: Vec<&str> = ranked.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["moradia", "transporte", "lazer", "pet shop"]);
    }

    #[test]
    fn latest_expenses_are_newest_first() {
        let mut ledger = Ledger::default();
        for day in 1..=7 {
            ledger.append(expense(i64::from(day), "x", at(2025, 3, day, 10)));
        }
        ledger.append(Entry::income(
            MoneyCents::new(1),
            "bônus",
            Author::Owner,
            at(2025, 3, 8, 10),
        ));

        let latest: Vec<i64> = ledger
            .latest_expenses(5)
            .iter()
            .map(|e| e.value.cents())
            .collect();
        assert_eq!(latest, vec![7, 6, 5, 4, 3]);
    }
}
