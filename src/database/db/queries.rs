use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

use crate::database::models::{
    AllocationDetail, AllocationInput, AnomalyAlert, AuditLog, BudgetAllocation, Department,
    FundSource, FundSourceInput, NewAuditLog, NewDepartment, NewTransaction, Profile, Report,
    Transaction, TransactionDetail, TransactionStatus, User,
};

/*
Store access for every persisted entity.
Money is kept as TEXT and parsed back into Decimal on read so no amount
ever passes through a float inside the database.
 */

fn decimal_col(row: &SqliteRow, col: &str) -> Result<Decimal, sqlx::Error> {
    let text: String = row.try_get(col)?;
    Decimal::from_str(text.trim())
        .map_err(|e| sqlx::Error::Decode(format!("Invalid Decimal format for {col}: {e}").into()))
}

fn parsed_col<T>(row: &SqliteRow, col: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = String>,
{
    let text: String = row.try_get(col)?;
    text.parse::<T>()
        .map_err(|e| sqlx::Error::Decode(format!("Invalid value for {col}: {e}").into()))
}

/*==========User & Session Queries=========== */

pub struct NewUserRecord<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub password_salt: &'a str,
    pub verification_token: Option<&'a str>,
    pub confirmed: bool,
    pub full_name: &'a str,
    pub role: Option<&'a str>,
    pub department_id: Option<i64>,
}

// Creates the credentials row and its profile in one SQL transaction.
pub async fn create_user_with_profile(
    pool: &Pool<Sqlite>,
    rec: &NewUserRecord<'_>,
) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let now = Utc::now();
    let confirmed_at = rec.confirmed.then_some(now);

    let user_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (email, password_hash, password_salt, verification_token, email_confirmed_at, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(rec.email)
    .bind(rec.password_hash)
    .bind(rec.password_salt)
    .bind(rec.verification_token)
    .bind(confirmed_at)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO profiles (user_id, email, full_name, role, department_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(rec.email)
    .bind(rec.full_name)
    .bind(rec.role)
    .bind(rec.department_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(user_id)
}

fn map_user(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        password_salt: row.try_get("password_salt")?,
        verification_token: row.try_get("verification_token")?,
        email_confirmed_at: row.try_get("email_confirmed_at")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn find_user_by_email(pool: &Pool<Sqlite>, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query("SELECT * FROM users WHERE lower(email) = lower(?)")
        .bind(email.trim())
        .fetch_optional(pool)
        .await?
        .map(|row| map_user(&row))
        .transpose()
}

pub async fn get_user(pool: &Pool<Sqlite>, user_id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .map(|row| map_user(&row))
        .transpose()
}

// Confirms the email owning `token`; false when no user holds it.
pub async fn verify_user_email(pool: &Pool<Sqlite>, token: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET email_confirmed_at = ?, verification_token = NULL
        WHERE verification_token = ?
        "#,
    )
    .bind(Utc::now())
    .bind(token)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn insert_session(
    pool: &Pool<Sqlite>,
    token_hash: &str,
    user_id: i64,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO sessions (token_hash, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(token_hash)
    .bind(user_id)
    .bind(expires_at)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_session(
    pool: &Pool<Sqlite>,
    token_hash: &str,
) -> Result<Option<(i64, DateTime<Utc>)>, sqlx::Error> {
    let row = sqlx::query("SELECT user_id, expires_at FROM sessions WHERE token_hash = ?")
        .bind(token_hash)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(r) => Ok(Some((r.try_get("user_id")?, r.try_get("expires_at")?))),
        None => Ok(None),
    }
}

pub async fn delete_session(pool: &Pool<Sqlite>, token_hash: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(token_hash)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/*==========Profile Queries=========== */

fn map_profile(row: &SqliteRow) -> Result<Profile, sqlx::Error> {
    Ok(Profile {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        role: row.try_get("role")?,
        department_id: row.try_get("department_id")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn get_profile_by_user(pool: &Pool<Sqlite>, user_id: i64) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query("SELECT * FROM profiles WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .map(|row| map_profile(&row))
        .transpose()
}

pub async fn list_profiles(pool: &Pool<Sqlite>) -> Result<Vec<Profile>, sqlx::Error> {
    sqlx::query("SELECT * FROM profiles ORDER BY created_at DESC, id DESC")
        .fetch_all(pool)
        .await?
        .iter()
        .map(map_profile)
        .collect()
}

pub async fn set_profile_role(pool: &Pool<Sqlite>, user_id: i64, role: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE profiles SET role = ? WHERE user_id = ?")
        .bind(role)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_profile_assignment(
    pool: &Pool<Sqlite>,
    user_id: i64,
    role: &str,
    department_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE profiles SET role = ?, department_id = ? WHERE user_id = ?")
        .bind(role)
        .bind(department_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/*==========Department Queries=========== */

fn map_department(row: &SqliteRow) -> Result<Department, sqlx::Error> {
    Ok(Department {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        code: row.try_get("code")?,
        dept_type: parsed_col(row, "dept_type")?,
        description: row.try_get("description")?,
    })
}

pub async fn list_departments(pool: &Pool<Sqlite>) -> Result<Vec<Department>, sqlx::Error> {
    sqlx::query("SELECT * FROM departments ORDER BY name ASC")
        .fetch_all(pool)
        .await?
        .iter()
        .map(map_department)
        .collect()
}

pub async fn get_department(pool: &Pool<Sqlite>, id: i64) -> Result<Option<Department>, sqlx::Error> {
    sqlx::query("SELECT * FROM departments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(|row| map_department(&row))
        .transpose()
}

pub async fn get_department_by_code(pool: &Pool<Sqlite>, code: &str) -> Result<Option<Department>, sqlx::Error> {
    sqlx::query("SELECT * FROM departments WHERE upper(code) = upper(?)")
        .bind(code.trim())
        .fetch_optional(pool)
        .await?
        .map(|row| map_department(&row))
        .transpose()
}

pub async fn create_department(pool: &Pool<Sqlite>, d: &NewDepartment) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO departments (name, code, dept_type, description)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(d.name.trim())
    .bind(d.code.trim().to_uppercase())
    .bind(d.dept_type.as_str())
    .bind(&d.description)
    .fetch_one(pool)
    .await
}

/*==========Fund Source Queries=========== */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundOrder {
    Newest,
    LargestTotal,
}

fn map_fund_source(row: &SqliteRow) -> Result<FundSource, sqlx::Error> {
    Ok(FundSource {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        fund_type: parsed_col(row, "fund_type")?,
        total_amount: decimal_col(row, "total_amount")?,
        available_amount: decimal_col(row, "available_amount")?,
        description: row.try_get("description")?,
        grant_period_start: row.try_get("grant_period_start")?,
        grant_period_end: row.try_get("grant_period_end")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn list_fund_sources(pool: &Pool<Sqlite>, order: FundOrder) -> Result<Vec<FundSource>, sqlx::Error> {
    let sql = match order {
        FundOrder::Newest => "SELECT * FROM fund_sources ORDER BY created_at DESC, id DESC",
        FundOrder::LargestTotal => {
            "SELECT * FROM fund_sources ORDER BY CAST(total_amount AS REAL) DESC, id ASC"
        }
    };
    sqlx::query(sql)
        .fetch_all(pool)
        .await?
        .iter()
        .map(map_fund_source)
        .collect()
}

pub async fn get_fund_source(pool: &Pool<Sqlite>, id: i64) -> Result<Option<FundSource>, sqlx::Error> {
    sqlx::query("SELECT * FROM fund_sources WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(|row| map_fund_source(&row))
        .transpose()
}

pub async fn create_fund_source(pool: &Pool<Sqlite>, f: &FundSourceInput) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO fund_sources (
            name, fund_type, total_amount, available_amount, description,
            grant_period_start, grant_period_end, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(f.name.trim())
    .bind(f.fund_type.as_str())
    .bind(f.total_amount.to_string())
    .bind(f.available_amount.to_string())
    .bind(&f.description)
    .bind(f.grant_period_start)
    .bind(f.grant_period_end)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn update_fund_source(pool: &Pool<Sqlite>, id: i64, f: &FundSourceInput) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE fund_sources
        SET name = ?, fund_type = ?, total_amount = ?, available_amount = ?,
            description = ?, grant_period_start = ?, grant_period_end = ?
        WHERE id = ?
        "#,
    )
    .bind(f.name.trim())
    .bind(f.fund_type.as_str())
    .bind(f.total_amount.to_string())
    .bind(f.available_amount.to_string())
    .bind(&f.description)
    .bind(f.grant_period_start)
    .bind(f.grant_period_end)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_fund_source(pool: &Pool<Sqlite>, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM fund_sources WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_allocations_for_fund(pool: &Pool<Sqlite>, fund_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM budget_allocations WHERE fund_source_id = ?")
        .bind(fund_id)
        .fetch_one(pool)
        .await
}

/*==========Budget Allocation Queries=========== */

const ALLOCATION_DETAIL_SELECT: &str = r#"
    SELECT ba.id, ba.department_id, ba.fund_source_id, ba.category, ba.fiscal_year,
           ba.allocated_amount, ba.spent_amount,
           d.name AS department_name, d.code AS department_code, d.dept_type AS department_type,
           f.name AS fund_name, f.fund_type AS fund_type
    FROM budget_allocations ba
    JOIN departments d ON d.id = ba.department_id
    JOIN fund_sources f ON f.id = ba.fund_source_id
"#;

fn map_allocation_detail(row: &SqliteRow) -> Result<AllocationDetail, sqlx::Error> {
    Ok(AllocationDetail {
        id: row.try_get("id")?,
        department_id: row.try_get("department_id")?,
        department_name: row.try_get("department_name")?,
        department_code: row.try_get("department_code")?,
        department_type: parsed_col(row, "department_type")?,
        fund_source_id: row.try_get("fund_source_id")?,
        fund_name: row.try_get("fund_name")?,
        fund_type: parsed_col(row, "fund_type")?,
        category: row.try_get("category")?,
        fiscal_year: row.try_get("fiscal_year")?,
        allocated_amount: decimal_col(row, "allocated_amount")?,
        spent_amount: decimal_col(row, "spent_amount")?,
    })
}

// Allocations for a fiscal year, largest first; optionally one department only.
pub async fn list_allocation_details(
    pool: &Pool<Sqlite>,
    fiscal_year: i32,
    department_id: Option<i64>,
) -> Result<Vec<AllocationDetail>, sqlx::Error> {
    let sql = format!(
        "{ALLOCATION_DETAIL_SELECT}
         WHERE ba.fiscal_year = ? AND (? IS NULL OR ba.department_id = ?)
         ORDER BY CAST(ba.allocated_amount AS REAL) DESC, ba.id ASC"
    );
    sqlx::query(&sql)
        .bind(fiscal_year)
        .bind(department_id)
        .bind(department_id)
        .fetch_all(pool)
        .await?
        .iter()
        .map(map_allocation_detail)
        .collect()
}

pub async fn get_allocation(pool: &Pool<Sqlite>, id: i64) -> Result<Option<BudgetAllocation>, sqlx::Error> {
    let row = sqlx::query("SELECT * FROM budget_allocations WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| -> Result<BudgetAllocation, sqlx::Error> {
        Ok(BudgetAllocation {
            id: r.try_get("id")?,
            department_id: r.try_get("department_id")?,
            fund_source_id: r.try_get("fund_source_id")?,
            category: r.try_get("category")?,
            fiscal_year: r.try_get("fiscal_year")?,
            allocated_amount: decimal_col(&r, "allocated_amount")?,
            spent_amount: decimal_col(&r, "spent_amount")?,
            created_at: r.try_get("created_at")?,
        })
    })
    .transpose()
}

pub async fn create_allocation(pool: &Pool<Sqlite>, a: &AllocationInput) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO budget_allocations (
            department_id, fund_source_id, category, fiscal_year,
            allocated_amount, spent_amount, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(a.department_id)
    .bind(a.fund_source_id)
    .bind(a.category.trim())
    .bind(a.fiscal_year)
    .bind(a.allocated_amount.to_string())
    .bind(a.spent_amount.to_string())
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn update_allocation(pool: &Pool<Sqlite>, id: i64, a: &AllocationInput) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE budget_allocations
        SET department_id = ?, fund_source_id = ?, category = ?, fiscal_year = ?,
            allocated_amount = ?, spent_amount = ?
        WHERE id = ?
        "#,
    )
    .bind(a.department_id)
    .bind(a.fund_source_id)
    .bind(a.category.trim())
    .bind(a.fiscal_year)
    .bind(a.allocated_amount.to_string())
    .bind(a.spent_amount.to_string())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_allocation(pool: &Pool<Sqlite>, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM budget_allocations WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_transactions_for_allocation(pool: &Pool<Sqlite>, allocation_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE allocation_id = ?")
        .bind(allocation_id)
        .fetch_one(pool)
        .await
}

/*==========Transaction Queries=========== */

/// Which transactions a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnScope {
    All,
    CreatedBy(i64),
    Department(i64),
    Status(TransactionStatus),
}

impl TxnScope {
    fn clause(&self) -> &'static str {
        match self {
            TxnScope::All => "1 = 1",
            TxnScope::CreatedBy(_) => "t.created_by = ?",
            TxnScope::Department(_) => "ba.department_id = ?",
            TxnScope::Status(_) => "t.status = ?",
        }
    }
}

const TRANSACTION_DETAIL_SELECT: &str = r#"
    SELECT t.id, t.allocation_id, t.description, t.vendor_name, t.amount, t.status,
           t.transaction_date, t.invoice_number, t.created_by,
           ba.category AS category, d.id AS department_id,
           d.name AS department_name, d.code AS department_code
    FROM transactions t
    LEFT JOIN budget_allocations ba ON ba.id = t.allocation_id
    LEFT JOIN departments d ON d.id = ba.department_id
"#;

fn map_transaction_detail(row: &SqliteRow) -> Result<TransactionDetail, sqlx::Error> {
    Ok(TransactionDetail {
        id: row.try_get("id")?,
        allocation_id: row.try_get("allocation_id")?,
        description: row.try_get("description")?,
        vendor_name: row.try_get("vendor_name")?,
        amount: decimal_col(row, "amount")?,
        status: parsed_col(row, "status")?,
        transaction_date: row.try_get("transaction_date")?,
        invoice_number: row.try_get("invoice_number")?,
        created_by: row.try_get("created_by")?,
        category: row.try_get("category")?,
        department_id: row.try_get("department_id")?,
        department_name: row.try_get("department_name")?,
        department_code: row.try_get("department_code")?,
    })
}

// Newest first. `limit = None` returns every matching row.
pub async fn list_transaction_details(
    pool: &Pool<Sqlite>,
    scope: TxnScope,
    limit: Option<i64>,
) -> Result<Vec<TransactionDetail>, sqlx::Error> {
    let sql = format!(
        "{TRANSACTION_DETAIL_SELECT}
         WHERE {}
         ORDER BY t.transaction_date DESC, t.id DESC
         LIMIT ?",
        scope.clause()
    );
    let mut query = sqlx::query(&sql);
    query = match scope {
        TxnScope::All => query,
        TxnScope::CreatedBy(id) | TxnScope::Department(id) => query.bind(id),
        TxnScope::Status(status) => query.bind(status.as_str()),
    };
    query
        .bind(limit.unwrap_or(-1))
        .fetch_all(pool)
        .await?
        .iter()
        .map(map_transaction_detail)
        .collect()
}

pub async fn count_transactions(
    pool: &Pool<Sqlite>,
    scope: TxnScope,
    status: TransactionStatus,
) -> Result<i64, sqlx::Error> {
    let sql = format!(
        "SELECT COUNT(*)
         FROM transactions t
         LEFT JOIN budget_allocations ba ON ba.id = t.allocation_id
         WHERE {} AND t.status = ?",
        scope.clause()
    );
    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    query = match scope {
        TxnScope::All => query,
        TxnScope::CreatedBy(id) | TxnScope::Department(id) => query.bind(id),
        TxnScope::Status(s) => query.bind(s.as_str()),
    };
    query.bind(status.as_str()).fetch_one(pool).await
}

// (date, amount) of completed transactions in [from, to], oldest first.
pub async fn completed_between(
    pool: &Pool<Sqlite>,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<(NaiveDate, Decimal)>, sqlx::Error> {
    sqlx::query(
        r#"
        SELECT transaction_date, amount
        FROM transactions
        WHERE status = 'completed' AND transaction_date >= ? AND transaction_date <= ?
        ORDER BY transaction_date ASC, id ASC
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?
    .iter()
    .map(|row| -> Result<(NaiveDate, Decimal), sqlx::Error> {
        Ok((row.try_get("transaction_date")?, decimal_col(row, "amount")?))
    })
    .collect()
}

pub async fn get_transaction(pool: &Pool<Sqlite>, id: i64) -> Result<Option<Transaction>, sqlx::Error> {
    let row = sqlx::query("SELECT * FROM transactions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| -> Result<Transaction, sqlx::Error> {
        Ok(Transaction {
            id: r.try_get("id")?,
            allocation_id: r.try_get("allocation_id")?,
            description: r.try_get("description")?,
            vendor_name: r.try_get("vendor_name")?,
            amount: decimal_col(&r, "amount")?,
            status: parsed_col(&r, "status")?,
            transaction_date: r.try_get("transaction_date")?,
            invoice_number: r.try_get("invoice_number")?,
            created_by: r.try_get("created_by")?,
            created_at: r.try_get("created_at")?,
        })
    })
    .transpose()
}

pub async fn get_transaction_detail(pool: &Pool<Sqlite>, id: i64) -> Result<Option<TransactionDetail>, sqlx::Error> {
    let sql = format!("{TRANSACTION_DETAIL_SELECT} WHERE t.id = ?");
    sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(|row| map_transaction_detail(&row))
        .transpose()
}

pub async fn insert_transaction(
    pool: &Pool<Sqlite>,
    t: &NewTransaction,
    status: TransactionStatus,
    created_by: Option<i64>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO transactions (
            allocation_id, description, vendor_name, amount, status,
            transaction_date, invoice_number, created_by, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(t.allocation_id)
    .bind(t.description.trim())
    .bind(t.vendor_name.as_deref())
    .bind(t.amount.to_string())
    .bind(status.as_str())
    .bind(t.transaction_date)
    .bind(t.invoice_number.as_deref())
    .bind(created_by)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

/* Status change is atomic with the allocation's spent amount:
entering `completed` adds the amount, leaving it subtracts it again,
so each completed transaction is counted exactly once. */

pub async fn update_transaction_status(
    pool: &Pool<Sqlite>,
    id: i64,
    new_status: TransactionStatus,
) -> Result<Option<TransactionStatus>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query("SELECT status, amount, allocation_id FROM transactions WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(row) = row else {
        return Ok(None);
    };
    let old_status: TransactionStatus = parsed_col(&row, "status")?;
    let amount = decimal_col(&row, "amount")?;
    let allocation_id: i64 = row.try_get("allocation_id")?;

    sqlx::query("UPDATE transactions SET status = ? WHERE id = ?")
        .bind(new_status.as_str())
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let was_completed = old_status == TransactionStatus::Completed;
    let now_completed = new_status == TransactionStatus::Completed;
    if was_completed != now_completed {
        let spent_row = sqlx::query("SELECT spent_amount FROM budget_allocations WHERE id = ?")
            .bind(allocation_id)
            .fetch_optional(&mut *tx)
            .await?;
        if let Some(spent_row) = spent_row {
            let spent = decimal_col(&spent_row, "spent_amount")?;
            let updated = if now_completed { spent + amount } else { spent - amount };
            sqlx::query("UPDATE budget_allocations SET spent_amount = ? WHERE id = ?")
                .bind(updated.to_string())
                .bind(allocation_id)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;
    Ok(Some(old_status))
}

/*==========Anomaly Alert Queries=========== */

fn map_alert(row: &SqliteRow) -> Result<AnomalyAlert, sqlx::Error> {
    Ok(AnomalyAlert {
        id: row.try_get("id")?,
        alert_type: row.try_get("alert_type")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        severity: row.try_get("severity")?,
        is_resolved: row.try_get("is_resolved")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn list_unresolved_alerts(pool: &Pool<Sqlite>, limit: i64) -> Result<Vec<AnomalyAlert>, sqlx::Error> {
    sqlx::query(
        "SELECT * FROM anomaly_alerts WHERE is_resolved = 0 ORDER BY created_at DESC, id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?
    .iter()
    .map(map_alert)
    .collect()
}

pub async fn insert_alert(
    pool: &Pool<Sqlite>,
    alert_type: &str,
    title: &str,
    description: &str,
    severity: &str,
    created_at: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO anomaly_alerts (alert_type, title, description, severity, is_resolved, created_at)
        VALUES (?, ?, ?, ?, 0, ?)
        RETURNING id
        "#,
    )
    .bind(alert_type)
    .bind(title)
    .bind(description)
    .bind(severity)
    .bind(created_at)
    .fetch_one(pool)
    .await
}

pub async fn resolve_alert(pool: &Pool<Sqlite>, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE anomaly_alerts SET is_resolved = 1 WHERE id = ? AND is_resolved = 0")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/*==========Audit Log Queries=========== */

pub async fn append_audit(pool: &Pool<Sqlite>, entry: &NewAuditLog) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO audit_logs (actor, action, entity, details, severity, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(entry.actor.as_deref())
    .bind(&entry.action)
    .bind(&entry.entity)
    .bind(&entry.details)
    .bind(&entry.severity)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn list_audit_logs(pool: &Pool<Sqlite>, limit: i64) -> Result<Vec<AuditLog>, sqlx::Error> {
    sqlx::query("SELECT * FROM audit_logs ORDER BY created_at DESC, id DESC LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await?
        .iter()
        .map(|row| -> Result<AuditLog, sqlx::Error> {
            Ok(AuditLog {
                id: row.try_get("id")?,
                actor: row.try_get("actor")?,
                action: row.try_get("action")?,
                entity: row.try_get("entity")?,
                details: row.try_get("details")?,
                severity: row.try_get("severity")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .collect()
}

/*==========Report Queries=========== */

pub async fn insert_report(
    pool: &Pool<Sqlite>,
    report_type: &str,
    format: &str,
    generated_by: i64,
    generator: &str,
    parameters: &serde_json::Value,
    content: &str,
) -> Result<Report, sqlx::Error> {
    let now = Utc::now();
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO reports (report_type, format, generated_by, generator, parameters, content, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(report_type)
    .bind(format)
    .bind(generated_by)
    .bind(generator)
    .bind(parameters.to_string())
    .bind(content)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(Report {
        id,
        report_type: report_type.to_string(),
        format: format.to_string(),
        generated_by,
        generator: generator.to_string(),
        parameters: parameters.clone(),
        content: content.to_string(),
        created_at: now,
    })
}

pub async fn get_report(pool: &Pool<Sqlite>, id: i64) -> Result<Option<Report>, sqlx::Error> {
    let row = sqlx::query("SELECT * FROM reports WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| -> Result<Report, sqlx::Error> {
        let params_text: String = r.try_get("parameters")?;
        Ok(Report {
            id: r.try_get("id")?,
            report_type: r.try_get("report_type")?,
            format: r.try_get("format")?,
            generated_by: r.try_get("generated_by")?,
            generator: r.try_get("generator")?,
            parameters: serde_json::from_str(&params_text).unwrap_or(serde_json::Value::Null),
            content: r.try_get("content")?,
            created_at: r.try_get("created_at")?,
        })
    })
    .transpose()
}

/*==========Public Portal Queries=========== */

// Distinct vendor names per department, for the portal's vendor filter.
pub async fn department_vendors(pool: &Pool<Sqlite>) -> Result<Vec<(i64, String)>, sqlx::Error> {
    sqlx::query(
        r#"
        SELECT DISTINCT ba.department_id AS department_id, t.vendor_name AS vendor_name
        FROM transactions t
        JOIN budget_allocations ba ON ba.id = t.allocation_id
        WHERE t.vendor_name IS NOT NULL AND t.vendor_name <> ''
        ORDER BY ba.department_id, t.vendor_name
        "#,
    )
    .fetch_all(pool)
    .await?
    .iter()
    .map(|row| -> Result<(i64, String), sqlx::Error> {
        Ok((row.try_get("department_id")?, row.try_get("vendor_name")?))
    })
    .collect()
}
