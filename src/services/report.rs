use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::order::{OrderItem, OrderState};
use crate::schema::{items, order_items, orders};

use super::order::restaurant_for_manager;

/// Closed set of report windows selectable via the `filter` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    Today,
    LastWeek,
    LastMonth,
}

impl ReportPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::Today => "today",
            ReportPeriod::LastWeek => "last_week",
            ReportPeriod::LastMonth => "last_month",
        }
    }

    pub fn parse(value: &str) -> Option<ReportPeriod> {
        match value {
            "today" => Some(ReportPeriod::Today),
            "last_week" => Some(ReportPeriod::LastWeek),
            "last_month" => Some(ReportPeriod::LastMonth),
            _ => None,
        }
    }

    pub fn date_range(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = match self {
            ReportPeriod::Today => now.date_naive().and_time(NaiveTime::MIN).and_utc(),
            ReportPeriod::LastWeek => now - Duration::days(7),
            ReportPeriod::LastMonth => now - Duration::days(30),
        };
        (start, now)
    }
}

#[derive(Debug, Clone)]
pub struct SalesReportItem {
    pub name: String,
    pub photo: Option<String>,
    pub total_count: i64,
    pub total_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct SalesReport {
    pub filter: &'static str,
    pub total_income: BigDecimal,
    pub items: Vec<SalesReportItem>,
}

/// Net revenue of one sold line. Unlike basket totals, the report deducts
/// the per-line discount.
pub fn line_revenue(price: &BigDecimal, count: i32, discount: i32) -> BigDecimal {
    price * BigDecimal::from(count) * BigDecimal::from(100 - discount) / BigDecimal::from(100)
}

/// Per-item sales of the manager's restaurant over the window, counting
/// completed orders only.
pub fn sales_report(
    conn: &mut PgConnection,
    manager_id: Uuid,
    period: ReportPeriod,
) -> Result<SalesReport, AppError> {
    let restaurant = restaurant_for_manager(conn, manager_id)?;
    let (start, end) = period.date_range(Utc::now());

    let rows: Vec<(OrderItem, String, Option<String>)> = order_items::table
        .inner_join(orders::table)
        .inner_join(items::table)
        .filter(orders::restaurant_id.eq(restaurant.id))
        .filter(orders::state.eq(OrderState::Completed.as_str()))
        .filter(orders::order_date.between(start, end))
        .select((OrderItem::as_select(), items::name, items::photo))
        .load(conn)?;

    let mut by_item: HashMap<Uuid, SalesReportItem> = HashMap::new();
    for (line, name, photo) in rows {
        let entry = by_item.entry(line.item_id).or_insert_with(|| SalesReportItem {
            name,
            photo,
            total_count: 0,
            total_price: BigDecimal::from(0),
        });
        entry.total_count += i64::from(line.count);
        entry.total_price += line_revenue(&line.price, line.count, line.discount);
    }

    let mut items: Vec<SalesReportItem> = by_item.into_values().collect();
    items.sort_by(|a, b| a.name.cmp(&b.name));
    let total_income = items
        .iter()
        .fold(BigDecimal::from(0), |acc, item| acc + &item.total_price);

    Ok(SalesReport {
        filter: period.as_str(),
        total_income,
        items,
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::TimeZone;

    use super::*;

    #[test]
    fn unknown_filter_is_rejected() {
        assert_eq!(ReportPeriod::parse("yesterday"), None);
        assert_eq!(ReportPeriod::parse("today"), Some(ReportPeriod::Today));
    }

    #[test]
    fn today_starts_at_midnight() {
        let now = Utc.with_ymd_and_hms(2025, 6, 20, 15, 30, 45).unwrap();
        let (start, end) = ReportPeriod::Today.date_range(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 6, 20, 0, 0, 0).unwrap());
        assert_eq!(end, now);
    }

    #[test]
    fn rolling_windows_reach_back_whole_days() {
        let now = Utc.with_ymd_and_hms(2025, 6, 20, 12, 0, 0).unwrap();
        let (week_start, _) = ReportPeriod::LastWeek.date_range(now);
        assert_eq!(week_start, Utc.with_ymd_and_hms(2025, 6, 13, 12, 0, 0).unwrap());
        let (month_start, _) = ReportPeriod::LastMonth.date_range(now);
        assert_eq!(month_start, Utc.with_ymd_and_hms(2025, 5, 21, 12, 0, 0).unwrap());
    }

    #[test]
    fn revenue_deducts_the_discount() {
        let price = BigDecimal::from_str("10.00").expect("valid decimal");
        assert_eq!(
            line_revenue(&price, 2, 0),
            BigDecimal::from_str("20.00").expect("valid decimal")
        );
        assert_eq!(
            line_revenue(&price, 2, 25),
            BigDecimal::from_str("15.00").expect("valid decimal")
        );
    }
}
