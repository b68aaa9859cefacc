//! Expense history

use crate::providers::ExpenseRecord;
use chrono::NaiveDate;
use farmlog_common::Result;
use sqlx::{Row, SqlitePool};

pub async fn save_expense(pool: &SqlitePool, farm_id: &str, expense: &ExpenseRecord) -> Result<()> {
    sqlx::query("INSERT INTO expenses (farm_id, category, amount, spent_on) VALUES (?, ?, ?, ?)")
        .bind(farm_id)
        .bind(&expense.category)
        .bind(expense.amount)
        .bind(expense.spent_on)
        .execute(pool)
        .await?;

    Ok(())
}

/// Expenses with `from <= spent_on < to`, oldest first
pub async fn load_expenses_between(
    pool: &SqlitePool,
    farm_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<ExpenseRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT category, amount, spent_on
        FROM expenses
        WHERE farm_id = ? AND spent_on >= ? AND spent_on < ?
        ORDER BY spent_on, id
        "#,
    )
    .bind(farm_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<ExpenseRecord> {
            Ok(ExpenseRecord {
                category: row.try_get("category")?,
                amount: row.try_get("amount")?,
                spent_on: row.try_get("spent_on")?,
            })
        })
        .collect()
}
