//! # Customer Purchase History
//!
//! The query window for "what did this customer buy recently", and the rows
//! the sales listing returns for it.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use crate::money::Money;
use crate::types::{lenient, Branch, Customer, EntityId};
use crate::MAX_HISTORY_ROWS;

/// Filter for the sales listing, scoped to one customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryQuery {
    pub customer_id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<EntityId>,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub page: u32,
    pub limit: u32,
}

impl HistoryQuery {
    /// `[today − months, today]` for one customer, optionally one branch.
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use rxpos_core::history::HistoryQuery;
    /// use rxpos_core::types::{Customer, EntityId};
    ///
    /// let customer = Customer { id: EntityId::Int(4), first_name: None, last_name: None, phone: None };
    /// let today = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
    /// let q = HistoryQuery::last_months(&customer, None, today, 6);
    /// assert_eq!(q.from_date, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
    /// ```
    pub fn last_months(
        customer: &Customer,
        branch: Option<&Branch>,
        today: NaiveDate,
        months: u32,
    ) -> Self {
        let from_date = today
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN);
        HistoryQuery {
            customer_id: customer.id.clone(),
            branch_id: branch.map(|b| b.id.clone()),
            from_date,
            to_date: today,
            page: 1,
            limit: MAX_HISTORY_ROWS,
        }
    }
}

/// One past sale in the customer's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleSummary {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<EntityId>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub invoice_number: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub sale_date: Option<String>,

    #[serde(default, deserialize_with = "lenient_money")]
    pub final_amount: Money,
}

fn lenient_money<'de, D>(deserializer: D) -> Result<Money, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::number(deserializer)?
        .map(Money::from_major)
        .unwrap_or_default())
}
