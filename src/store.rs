use rusqlite::{Connection, Row};

use crate::error::Result;
use crate::models::{
    Account, AccountType, CardType, Category, OnlineAccountType, Payee, Project, Transaction,
    TransactionSplit,
};

// ---------------------------------------------------------------------------
// Bulk delete
// ---------------------------------------------------------------------------

/// Wipe every entity table in one write transaction. Children go first so
/// foreign keys hold at each step.
pub fn delete_all(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    for table in [
        "transaction_splits",
        "transactions",
        "payees",
        "projects",
        "categories",
        "accounts",
    ] {
        tx.execute(&format!("DELETE FROM {table}"), [])?;
    }
    tx.commit()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Create-or-overwrite by id
// ---------------------------------------------------------------------------

pub fn insert_category(conn: &Connection, category: &Category) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO categories (id, name, parent_id) VALUES (?1, ?2, ?3)",
        rusqlite::params![category.id, category.name, category.parent_id],
    )?;
    Ok(())
}

pub fn insert_account(conn: &Connection, account: &Account) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO accounts (id, title, currency, balance, account_type, card_type, \
         online_account_type, is_active, include_in_totals, sort_order, note, created_at, last_transaction_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        rusqlite::params![
            account.id,
            account.title,
            account.currency,
            account.balance,
            account.account_type.as_str(),
            account.card_type.map(CardType::as_str),
            account.online_account_type.map(OnlineAccountType::as_str),
            account.is_active,
            account.include_in_totals,
            account.sort_order,
            account.note,
            account.created_at,
            account.last_transaction_at,
        ],
    )?;
    Ok(())
}

pub fn insert_payee(conn: &Connection, payee: &Payee) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO payees (id, name, last_category_id) VALUES (?1, ?2, ?3)",
        rusqlite::params![payee.id, payee.name, payee.last_category_id],
    )?;
    Ok(())
}

pub fn insert_project(conn: &Connection, project: &Project) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO projects (id, title, is_active, updated_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![project.id, project.title, project.is_active, project.updated_at],
    )?;
    Ok(())
}

pub fn insert_transaction(conn: &Connection, txn: &Transaction) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO transactions (id, from_account_id, from_amount, from_running_balance, \
         to_account_id, to_amount, to_running_balance, payee_id, category_id, project_id, note, \
         original_currency, original_amount, occurred_at, cleared_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        rusqlite::params![
            txn.id,
            txn.from_account_id,
            txn.from_amount,
            txn.from_running_balance,
            txn.to_account_id,
            txn.to_amount,
            txn.to_running_balance,
            txn.payee_id,
            txn.category_id,
            txn.project_id,
            txn.note,
            txn.original_currency,
            txn.original_amount,
            txn.occurred_at,
            txn.cleared_at,
            txn.updated_at,
        ],
    )?;
    Ok(())
}

pub fn insert_split(conn: &Connection, split: &TransactionSplit) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO transaction_splits (id, transaction_id, amount, category_id, project_id, note) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            split.id,
            split.transaction_id,
            split.amount,
            split.category_id,
            split.project_id,
            split.note,
        ],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

fn id_exists(conn: &Connection, sql: &str, id: i64) -> Result<bool> {
    let mut stmt = conn.prepare_cached(sql)?;
    Ok(stmt.exists([id])?)
}

pub fn account_exists(conn: &Connection, id: i64) -> Result<bool> {
    id_exists(conn, "SELECT 1 FROM accounts WHERE id = ?1", id)
}

pub fn category_exists(conn: &Connection, id: i64) -> Result<bool> {
    id_exists(conn, "SELECT 1 FROM categories WHERE id = ?1", id)
}

pub fn payee_exists(conn: &Connection, id: i64) -> Result<bool> {
    id_exists(conn, "SELECT 1 FROM payees WHERE id = ?1", id)
}

pub fn project_exists(conn: &Connection, id: i64) -> Result<bool> {
    id_exists(conn, "SELECT 1 FROM projects WHERE id = ?1", id)
}

pub fn account_ids(conn: &Connection) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT id FROM accounts ORDER BY id")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<i64>, _>>()?;
    Ok(ids)
}

fn account_from_row(row: &Row) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        title: row.get(1)?,
        currency: row.get(2)?,
        balance: row.get(3)?,
        account_type: AccountType::from_str(&row.get::<_, String>(4)?),
        card_type: row.get::<_, Option<String>>(5)?.map(|s| CardType::from_str(&s)),
        online_account_type: row
            .get::<_, Option<String>>(6)?
            .map(|s| OnlineAccountType::from_str(&s)),
        is_active: row.get(7)?,
        include_in_totals: row.get(8)?,
        sort_order: row.get(9)?,
        note: row.get(10)?,
        created_at: row.get(11)?,
        last_transaction_at: row.get(12)?,
    })
}

pub fn accounts_sorted(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, currency, balance, account_type, card_type, online_account_type, \
         is_active, include_in_totals, sort_order, note, created_at, last_transaction_at \
         FROM accounts ORDER BY sort_order, id",
    )?;
    let accounts = stmt
        .query_map([], account_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(accounts)
}

fn transaction_from_row(row: &Row) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        from_account_id: row.get(1)?,
        from_amount: row.get(2)?,
        from_running_balance: row.get(3)?,
        to_account_id: row.get(4)?,
        to_amount: row.get(5)?,
        to_running_balance: row.get(6)?,
        payee_id: row.get(7)?,
        category_id: row.get(8)?,
        project_id: row.get(9)?,
        note: row.get(10)?,
        original_currency: row.get(11)?,
        original_amount: row.get(12)?,
        occurred_at: row.get(13)?,
        cleared_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

/// Every transaction touching the account, oldest first. Equal timestamps
/// order by ascending id so replay is deterministic across runs.
pub fn transactions_for_account(conn: &Connection, account_id: i64) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, from_account_id, from_amount, from_running_balance, to_account_id, to_amount, \
         to_running_balance, payee_id, category_id, project_id, note, original_currency, \
         original_amount, occurred_at, cleared_at, updated_at \
         FROM transactions WHERE from_account_id = ?1 OR to_account_id = ?1 \
         ORDER BY occurred_at ASC, id ASC",
    )?;
    let transactions = stmt
        .query_map([account_id], transaction_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(transactions)
}

// ---------------------------------------------------------------------------
// Derived-field updates (integrity fixer)
// ---------------------------------------------------------------------------

pub fn set_from_running_balance(conn: &Connection, transaction_id: i64, balance: i64) -> Result<()> {
    conn.execute(
        "UPDATE transactions SET from_running_balance = ?1 WHERE id = ?2",
        rusqlite::params![balance, transaction_id],
    )?;
    Ok(())
}

pub fn set_to_running_balance(conn: &Connection, transaction_id: i64, balance: i64) -> Result<()> {
    conn.execute(
        "UPDATE transactions SET to_running_balance = ?1 WHERE id = ?2",
        rusqlite::params![balance, transaction_id],
    )?;
    Ok(())
}

pub fn set_account_totals(
    conn: &Connection,
    account_id: i64,
    balance: i64,
    last_transaction_at: Option<i64>,
) -> Result<()> {
    conn.execute(
        "UPDATE accounts SET balance = ?1, last_transaction_at = ?2 WHERE id = ?3",
        rusqlite::params![balance, last_transaction_at, account_id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn sample_account(id: i64) -> Account {
        Account {
            id,
            title: format!("Account {id}"),
            currency: "EUR".to_string(),
            balance: 0,
            account_type: AccountType::Bank,
            card_type: None,
            online_account_type: None,
            is_active: true,
            include_in_totals: true,
            sort_order: 0,
            note: None,
            created_at: 1_000,
            last_transaction_at: None,
        }
    }

    #[test]
    fn test_insert_account_round_trip() {
        let (_dir, conn) = test_db();
        let mut account = sample_account(7);
        account.account_type = AccountType::CreditCard;
        account.card_type = Some(CardType::Visa);
        account.note = Some("shared card".to_string());
        insert_account(&conn, &account).unwrap();

        let accounts = accounts_sorted(&conn).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].id, 7);
        assert_eq!(accounts[0].account_type, AccountType::CreditCard);
        assert_eq!(accounts[0].card_type, Some(CardType::Visa));
        assert_eq!(accounts[0].note.as_deref(), Some("shared card"));
    }

    #[test]
    fn test_insert_is_overwrite_by_id() {
        let (_dir, conn) = test_db();
        insert_account(&conn, &sample_account(1)).unwrap();
        let mut renamed = sample_account(1);
        renamed.title = "Renamed".to_string();
        insert_account(&conn, &renamed).unwrap();

        let accounts = accounts_sorted(&conn).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].title, "Renamed");
    }

    #[test]
    fn test_exists_lookups() {
        let (_dir, conn) = test_db();
        insert_category(&conn, &Category { id: 3, name: "Groceries".to_string(), parent_id: None }).unwrap();
        assert!(category_exists(&conn, 3).unwrap());
        assert!(!category_exists(&conn, 4).unwrap());
        assert!(!account_exists(&conn, 1).unwrap());
        assert!(!payee_exists(&conn, 1).unwrap());
        assert!(!project_exists(&conn, 1).unwrap());
    }

    #[test]
    fn test_transactions_for_account_ordering() {
        let (_dir, mut conn) = test_db();
        insert_account(&conn, &sample_account(1)).unwrap();
        let base = Transaction {
            id: 0,
            from_account_id: None,
            from_amount: None,
            from_running_balance: None,
            to_account_id: Some(1),
            to_amount: Some(100),
            to_running_balance: None,
            payee_id: None,
            category_id: None,
            project_id: None,
            note: None,
            original_currency: None,
            original_amount: None,
            occurred_at: 0,
            cleared_at: 0,
            updated_at: None,
        };
        // Same timestamp for ids 12 and 5, later timestamp for id 2.
        for (id, occurred_at) in [(12, 50), (2, 90), (5, 50)] {
            let txn = Transaction { id, occurred_at, cleared_at: occurred_at, ..base.clone() };
            insert_transaction(&conn, &txn).unwrap();
        }

        let ordered: Vec<i64> = transactions_for_account(&conn, 1)
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ordered, vec![5, 12, 2]);

        delete_all(&mut conn).unwrap();
        assert!(transactions_for_account(&conn, 1).unwrap().is_empty());
        assert!(accounts_sorted(&conn).unwrap().is_empty());
    }
}
