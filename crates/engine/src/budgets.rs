//! Monthly budgets per category and the alerts derived from them.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{CategoryTotals, EngineError, Ledger, MoneyCents, Period, ResultEngine};

/// Share of the limit (in percent) from which a warning is raised.
const WARNING_PERCENT: i128 = 90;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub category: String,
    pub limit: MoneyCents,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum BudgetLevel {
    /// Below 90% of the limit.
    Within,
    /// In [90%, 100%).
    Warning,
    /// At or above the limit.
    Exceeded,
}

impl BudgetLevel {
    /// Level reached by `spent` against a positive `limit`.
    pub fn of(spent: MoneyCents, limit: MoneyCents) -> Self {
        let spent = i128::from(spent.cents());
        let limit = i128::from(limit.cents());
        if spent >= limit {
            BudgetLevel::Exceeded
        } else if spent * 100 >= limit * WARNING_PERCENT {
            BudgetLevel::Warning
        } else {
            BudgetLevel::Within
        }
    }
}

/// Current-month spend of a budgeted category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BudgetStatus {
    pub category: String,
    pub spent: MoneyCents,
    pub limit: MoneyCents,
    pub level: BudgetLevel,
}

impl BudgetStatus {
    pub fn percent(&self) -> f64 {
        self.spent.percent_of(self.limit)
    }
}

/// Budgets in insertion order. Redefining a budget keeps its position.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BudgetTable {
    budgets: Vec<Budget>,
}

impl BudgetTable {
    pub fn set(&mut self, category: &str, limit: MoneyCents) -> ResultEngine<()> {
        if !limit.is_positive() {
            return Err(EngineError::InvalidBudget(format!(
                "limit for '{category}' must be > 0"
            )));
        }
        match self.budgets.iter_mut().find(|b| b.category == category) {
            Some(budget) => budget.limit = limit,
            None => self.budgets.push(Budget {
                category: category.to_string(),
                limit,
            }),
        }
        Ok(())
    }

    pub fn get(&self, category: &str) -> Option<MoneyCents> {
        self.budgets
            .iter()
            .find(|b| b.category == category)
            .map(|b| b.limit)
    }

    /// Status of every budget, in table order.
    ///
    /// Spend is the sum of all entries of the category recorded since the
    /// start of the current month.
    pub fn statuses(&self, ledger: &Ledger, now: DateTime<Utc>, tz: Tz) -> Vec<BudgetStatus> {
        let month = CategoryTotals::from_entries(ledger.by_period(Period::Month, now, tz));
        self.budgets
            .iter()
            .map(|budget| {
                let spent = month.get(&budget.category);
                BudgetStatus {
                    category: budget.category.clone(),
                    spent,
                    limit: budget.limit,
                    level: BudgetLevel::of(spent, budget.limit),
                }
            })
            .collect()
    }

    /// Budgets at or above the warning threshold, in table order.
    pub fn check_alerts(&self, ledger: &Ledger, now: DateTime<Utc>, tz: Tz) -> Vec<BudgetStatus> {
        self.statuses(ledger, now, tz)
            .into_iter()
            .filter(|status| status.level != BudgetLevel::Within)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Budget> {
        self.budgets.iter()
    }

    pub fn len(&self) -> usize {
        self.budgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.budgets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono_tz::America::Sao_Paulo;

    use super::*;
    use crate::{Author, Entry};

    fn now() -> DateTime<Utc> {
        Sao_Paulo
            .with_ymd_and_hms(2025, 3, 20, 12, 0, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc)
    }

    fn level_at(spent_cents: i64) -> BudgetLevel {
        BudgetLevel::of(MoneyCents::new(spent_cents), MoneyCents::new(100_000))
    }

    #[test]
    fn thresholds_are_exact() {
        assert_eq!(level_at(89_900), BudgetLevel::Within);
        assert_eq!(level_at(90_000), BudgetLevel::Warning);
        assert_eq!(level_at(99_900), BudgetLevel::Warning);
        assert_eq!(level_at(100_000), BudgetLevel::Exceeded);
        assert_eq!(level_at(150_000), BudgetLevel::Exceeded);
        assert_eq!(level_at(0), BudgetLevel::Within);
    }

    #[test]
    fn rejects_non_positive_limit() {
        let mut table = BudgetTable::default();
        assert!(matches!(
            table.set("lazer", MoneyCents::ZERO),
            Err(EngineError::InvalidBudget(_))
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn redefining_keeps_position() {
        let mut table = BudgetTable::default();
        table.set("lazer", MoneyCents::new(100)).unwrap();
        table.set("moradia", MoneyCents::new(200)).unwrap();
        table.set("lazer", MoneyCents::new(300)).unwrap();

        let order: Vec<&str> = table.iter().map(|b| b.category.as_str()).collect();
        assert_eq!(order, vec!["lazer", "moradia"]);
        assert_eq!(table.get("lazer"), Some(MoneyCents::new(300)));
    }

    #[test]
    fn alerts_follow_table_order_not_severity() {
        let now = now();
        let mut ledger = Ledger::default();
        ledger.append(Entry::expense(MoneyCents::new(30_000), "lazer", Author::Owner, now));
        ledger.append(Entry::expense(MoneyCents::new(70_000), "moradia", Author::Owner, now));
        ledger.append(Entry::expense(MoneyCents::new(9_500), "saúde", Author::Owner, now));

        let mut table = BudgetTable::default();
        table.set("saúde", MoneyCents::new(10_000)).unwrap();
        table.set("lazer", MoneyCents::new(10_000)).unwrap();
        table.set("moradia", MoneyCents::new(100_000)).unwrap();
        table.set("educação", MoneyCents::new(10_000)).unwrap();

        let alerts = table.check_alerts(&ledger, now, Sao_Paulo);
        let summary: Vec<(&str, BudgetLevel)> = alerts
            .iter()
            .map(|a| (a.category.as_str(), a.level))
            .collect();
        // lazer at 300% is exceeded, not a warning; moradia at 70% is silent;
        // educação has no spend.
        assert_eq!(
            summary,
            vec![
                ("saúde", BudgetLevel::Warning),
                ("lazer", BudgetLevel::Exceeded),
            ]
        );
        assert_eq!(alerts[1].percent(), 300.0);
    }

    #[test]
    fn spend_from_previous_month_is_ignored() {
        let now = now();
        let last_month = Sao_Paulo
            .with_ymd_and_hms(2025, 2, 27, 12, 0, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc);
        let mut ledger = Ledger::default();
        ledger.append(Entry::expense(MoneyCents::new(50_000), "lazer", Author::Owner, last_month));

        let mut table = BudgetTable::default();
        table.set("lazer", MoneyCents::new(10_000)).unwrap();

        assert!(table.check_alerts(&ledger, now, Sao_Paulo).is_empty());
        assert_eq!(table.statuses(&ledger, now, Sao_Paulo)[0].spent, MoneyCents::ZERO);
    }
}
