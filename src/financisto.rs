//! Financisto backup import.
//!
//! The backup is a line-oriented record stream: `$ENTITY:<table>` (or a bare
//! `$<table>`) opens a record, `key:value` lines fill it, `$$` closes and
//! dispatches it. Records accumulate in memory, get reconciled against each
//! other (currency resolution, category tree flattening, split attachment),
//! and are persisted in phased write transactions.

use std::collections::HashMap;
use std::io::BufRead;

use iso_currency::Currency;
use log::warn;
use rusqlite::Connection;

use crate::error::{ExpensesError, Result};
use crate::models::{
    Account, AccountType, CardType, Category, OnlineAccountType, Payee, Project, Transaction,
    TransactionSplit,
};
use crate::store;

/// Accounts whose legacy currency id never resolved fall back to this code.
const FALLBACK_CURRENCY: &str = "EUR";

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

type Fields = HashMap<String, String>;

fn req<'a>(values: &'a Fields, field: &str) -> Result<&'a str> {
    values
        .get(field)
        .map(String::as_str)
        .ok_or_else(|| ExpensesError::MissingField(field.to_string()))
}

fn req_i64(values: &Fields, field: &str) -> Result<i64> {
    let raw = req(values, field)?;
    raw.trim().parse().map_err(|_| ExpensesError::InvalidField {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

fn opt_i64(values: &Fields, field: &str) -> Result<Option<i64>> {
    match values.get(field) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ExpensesError::InvalidField {
                field: field.to_string(),
                value: raw.to_string(),
            }),
        None => Ok(None),
    }
}

fn req_bool(values: &Fields, field: &str) -> Result<bool> {
    Ok(req_i64(values, field)? == 1)
}

/// Reference fields use id <= 0 as a "none" sentinel.
fn opt_ref(values: &Fields, field: &str) -> Result<Option<i64>> {
    Ok(opt_i64(values, field)?.filter(|id| *id > 0))
}

// ---------------------------------------------------------------------------
// Legacy enumeration mappings
// ---------------------------------------------------------------------------

fn map_card_type(issuer: Option<&str>) -> CardType {
    match issuer.unwrap_or_default() {
        "VISA" => CardType::Visa,
        "VISA_ELECTRON" => CardType::VisaElectron,
        "MASTERCARD" => CardType::Mastercard,
        "MAESTRO" => CardType::Maestro,
        "CIRRUS" => CardType::Cirrus,
        "AMEX" => CardType::AmericanExpress,
        "JCB" => CardType::Jcb,
        "DINERS" => CardType::Diners,
        "DISCOVER" => CardType::Discover,
        "UNIONPAY" => CardType::Unionpay,
        "EPS" => CardType::Eps,
        // NETS and anything unrecognized
        _ => CardType::Other,
    }
}

fn map_online_type(issuer: Option<&str>) -> OnlineAccountType {
    match issuer.unwrap_or_default() {
        "PAYPAL" => OnlineAccountType::Paypal,
        "AMAZON" => OnlineAccountType::Amazon,
        "GOOGLE_WALLET" => OnlineAccountType::GoogleWallet,
        _ => OnlineAccountType::Other,
    }
}

fn map_account_type(
    legacy: &str,
    issuer: Option<&str>,
) -> (AccountType, Option<CardType>, Option<OnlineAccountType>) {
    match legacy {
        "CASH" => (AccountType::Cash, None, None),
        "BANK" => (AccountType::Bank, None, None),
        "DEBIT_CARD" => (AccountType::DebitCard, Some(map_card_type(issuer)), None),
        "CREDIT_CARD" => (AccountType::CreditCard, Some(map_card_type(issuer)), None),
        "ASSET" => (AccountType::Savings, None, None),
        "LIABILITY" => (AccountType::Loan, None, None),
        "ONLINE" => (AccountType::Online, None, Some(map_online_type(issuer))),
        "PAYPAL" => (AccountType::Online, None, Some(OnlineAccountType::Paypal)),
        _ => (AccountType::Other, None, None),
    }
}

// ---------------------------------------------------------------------------
// Accumulated records
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct AccountRecord {
    id: i64,
    title: String,
    currency_id: Option<String>,
    balance: i64,
    account_type: AccountType,
    card_type: Option<CardType>,
    online_account_type: Option<OnlineAccountType>,
    is_active: bool,
    include_in_totals: bool,
    sort_order: i64,
    note: Option<String>,
    created_at: i64,
}

#[derive(Debug)]
struct PayeeRecord {
    id: i64,
    name: String,
    last_category_id: Option<i64>,
}

#[derive(Debug)]
struct ProjectRecord {
    id: i64,
    title: String,
    is_active: bool,
    updated_at: Option<i64>,
}

#[derive(Debug, Clone)]
struct CategoryRecord {
    id: i64,
    name: String,
    left: i64,
    right: i64,
}

#[derive(Debug)]
struct TransactionRecord {
    id: i64,
    from_account_id: Option<i64>,
    from_amount: Option<i64>,
    to_account_id: Option<i64>,
    to_amount: Option<i64>,
    category_id: Option<i64>,
    payee_id: Option<i64>,
    project_id: Option<i64>,
    note: Option<String>,
    original_currency_id: Option<String>,
    original_amount: Option<i64>,
    occurred_at: i64,
    updated_at: Option<i64>,
}

#[derive(Debug)]
struct SplitRecord {
    id: i64,
    amount: i64,
    category_id: Option<i64>,
    project_id: Option<i64>,
    note: Option<String>,
}

/// Everything parsed out of one backup file, before any database write.
#[derive(Debug, Default)]
pub struct Backup {
    /// Legacy currency id -> resolved ISO 4217 code.
    currencies: HashMap<String, String>,
    accounts: Vec<AccountRecord>,
    payees: Vec<PayeeRecord>,
    projects: Vec<ProjectRecord>,
    categories: Vec<CategoryRecord>,
    /// Top-level transactions in encounter order.
    transactions: Vec<TransactionRecord>,
    /// Parent transaction id -> its buffered splits.
    splits: HashMap<i64, Vec<SplitRecord>>,
}

// ---------------------------------------------------------------------------
// Record-stream parsing
// ---------------------------------------------------------------------------

/// Parse the decoded backup stream into an accumulator. Malformed numeric
/// fields and missing required fields abort the parse; unknown tables and
/// unknown currency codes do not.
pub fn parse_backup<R: BufRead>(input: R) -> Result<Backup> {
    let mut backup = Backup::default();
    let mut table: Option<String> = None;
    let mut values: Fields = HashMap::new();

    for line in input.lines() {
        let line = line?;
        if let Some(rest) = line.strip_prefix('$') {
            if rest == "$" {
                // Close only a non-empty open record; a stray $$ is inert.
                if !values.is_empty() {
                    if let Some(name) = table.take() {
                        dispatch(&mut backup, &name, &values)?;
                        values.clear();
                    }
                }
            } else {
                // `$ENTITY:account` in real exports; a bare `$account` also opens.
                let name = match rest.split_once(':') {
                    Some((_, after)) => after,
                    None => rest,
                };
                table = Some(name.to_string());
                values.clear();
            }
        } else if table.is_some() {
            // Later duplicates of a key overwrite earlier ones.
            if let Some((key, value)) = line.split_once(':') {
                values.insert(key.to_string(), value.to_string());
            }
        }
    }

    Ok(backup)
}

fn dispatch(backup: &mut Backup, table: &str, values: &Fields) -> Result<()> {
    match table {
        "currency" => backup.push_currency(values)?,
        "account" => backup.push_account(values)?,
        "payee" => backup.push_payee(values)?,
        "project" => backup.push_project(values)?,
        "category" => backup.push_category(values)?,
        "transactions" => {
            // Templates are never imported.
            if opt_i64(values, "is_template")?.unwrap_or(0) == 0 {
                backup.push_transaction(values)?;
            }
        }
        // Tables with no counterpart here (budget, locations, ...) are skipped.
        _ => {}
    }
    Ok(())
}

impl Backup {
    fn push_currency(&mut self, values: &Fields) -> Result<()> {
        let id = req(values, "_id")?.to_string();
        let code = req(values, "name")?;
        if Currency::from_code(code).is_some() {
            self.currencies.insert(id, code.to_string());
        } else {
            warn!(
                "could not resolve currency code '{code}', accounts using it will default to {FALLBACK_CURRENCY}"
            );
        }
        Ok(())
    }

    fn push_account(&mut self, values: &Fields) -> Result<()> {
        let legacy_type = values.get("type").map(String::as_str).unwrap_or("OTHER");
        let issuer = values.get("card_issuer").map(String::as_str);
        let (account_type, card_type, online_account_type) = map_account_type(legacy_type, issuer);

        self.accounts.push(AccountRecord {
            id: req_i64(values, "_id")?,
            title: values.get("title").cloned().unwrap_or_default(),
            currency_id: values.get("currency_id").cloned(),
            balance: req_i64(values, "total_amount")?,
            account_type,
            card_type,
            online_account_type,
            is_active: req_bool(values, "is_active")?,
            include_in_totals: req_bool(values, "is_include_into_totals")?,
            sort_order: req_i64(values, "sort_order")?,
            note: values.get("note").cloned(),
            created_at: req_i64(values, "creation_date")?,
        });
        Ok(())
    }

    fn push_payee(&mut self, values: &Fields) -> Result<()> {
        let last_category_id = req_i64(values, "last_category_id")?;
        self.payees.push(PayeeRecord {
            id: req_i64(values, "_id")?,
            name: values.get("title").cloned().unwrap_or_default(),
            last_category_id: (last_category_id > 0).then_some(last_category_id),
        });
        Ok(())
    }

    fn push_project(&mut self, values: &Fields) -> Result<()> {
        let id = req_i64(values, "_id")?;
        // id <= 0 is the legacy "no project" sentinel row.
        if id <= 0 {
            return Ok(());
        }
        let updated_at = req_i64(values, "updated_on")?;
        self.projects.push(ProjectRecord {
            id,
            title: values.get("title").cloned().unwrap_or_default(),
            is_active: req_bool(values, "is_active")?,
            updated_at: (updated_at > 0).then_some(updated_at),
        });
        Ok(())
    }

    fn push_category(&mut self, values: &Fields) -> Result<()> {
        self.categories.push(CategoryRecord {
            id: req_i64(values, "_id")?,
            name: values.get("title").cloned().unwrap_or_default(),
            left: req_i64(values, "left")?,
            right: req_i64(values, "right")?,
        });
        Ok(())
    }

    fn push_transaction(&mut self, values: &Fields) -> Result<()> {
        let id = req_i64(values, "_id")?;
        let from_account_id = req_i64(values, "from_account_id")?;
        let from_amount = req_i64(values, "from_amount")?;
        let to_account_id = req_i64(values, "to_account_id")?;
        let to_amount = req_i64(values, "to_amount")?;

        let parent_id = opt_i64(values, "parent_id")?.unwrap_or(0);
        if parent_id != 0 {
            if to_account_id > 0 {
                // A transfer cannot be a split member: re-dispatch as a full
                // top-level transaction. The cleared parent_id guarantees the
                // re-dispatch cannot land here again.
                let mut top_level = values.clone();
                top_level.insert("parent_id".to_string(), "0".to_string());
                return self.push_transaction(&top_level);
            }

            self.splits.entry(parent_id).or_default().push(SplitRecord {
                id,
                // Legacy split amounts are from-perspective; store the debit magnitude.
                amount: -from_amount,
                category_id: opt_ref(values, "category_id")?,
                project_id: opt_ref(values, "project_id")?,
                note: values.get("note").cloned(),
            });
            return Ok(());
        }

        // The legacy format is from-account-centric with signed amounts;
        // normalize to non-negative debit/credit magnitudes.
        let (from, to) = if to_account_id > 0 {
            (
                (Some(from_account_id), Some(-from_amount)),
                (Some(to_account_id), Some(to_amount)),
            )
        } else if from_amount > 0 {
            ((None, None), (Some(from_account_id), Some(from_amount)))
        } else {
            ((Some(from_account_id), Some(-from_amount)), (None, None))
        };

        let original_currency_id = values
            .get("original_currency_id")
            .filter(|v| !v.is_empty() && v.as_str() != "0")
            .cloned();
        let original_amount = match original_currency_id {
            Some(_) => Some(req_i64(values, "original_from_amount")?),
            None => None,
        };

        let occurred_at = req_i64(values, "datetime")?;
        let updated_on = req_i64(values, "updated_on")?;

        self.transactions.push(TransactionRecord {
            id,
            from_account_id: from.0,
            from_amount: from.1,
            to_account_id: to.0,
            to_amount: to.1,
            category_id: opt_ref(values, "category_id")?,
            payee_id: opt_ref(values, "payee_id")?,
            project_id: opt_ref(values, "project_id")?,
            note: values.get("note").cloned(),
            original_currency_id,
            original_amount,
            occurred_at,
            updated_at: (updated_on > 1).then_some(updated_on),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Category tree flattening
// ---------------------------------------------------------------------------

struct FlattenedCategories {
    /// (id, name), already in persistence order (descending name).
    roots: Vec<(i64, String)>,
    /// (id, name, parent id) — parents are always roots.
    children: Vec<(i64, String, i64)>,
    /// Categories nested too deep to keep: their id -> depth-1 ancestor id.
    migrations: HashMap<i64, i64>,
}

/// Collapse the legacy nested-set tree to two levels. A category's ancestors
/// are the records whose [left, right] interval strictly contains its left
/// bound; walking them in ascending `left` goes root-downward. Anything
/// deeper than one level is folded into its depth-1 ancestor via the
/// migration map instead of being materialized.
fn flatten_categories(categories: &[CategoryRecord]) -> FlattenedCategories {
    let mut roots = Vec::new();
    let mut children = Vec::new();
    let mut migrations = HashMap::new();

    for category in categories {
        if category.id <= 0 {
            continue;
        }

        let mut ancestors: Vec<&CategoryRecord> = categories
            .iter()
            .filter(|c| c.left < category.left && category.left < c.right)
            .collect();
        ancestors.sort_by_key(|c| c.left);

        let mut parent_id = 0;
        let mut level = 0;
        for ancestor in &ancestors {
            if level <= 1 {
                parent_id = ancestor.id;
            }
            level += 1;
        }

        if level >= 2 {
            migrations.insert(category.id, parent_id);
        } else if parent_id == 0 {
            roots.push((category.id, category.name.clone()));
        } else {
            children.push((category.id, category.name.clone(), parent_id));
        }
    }

    // Descending name: the creation order of roots drives downstream color
    // assignment, and this ordering is part of the import contract.
    roots.sort_by(|a, b| b.1.cmp(&a.1));

    FlattenedCategories { roots, children, migrations }
}

fn remap_category(migrations: &HashMap<i64, i64>, id: i64) -> i64 {
    *migrations.get(&id).unwrap_or(&id)
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ImportCounts {
    pub accounts: usize,
    pub categories: usize,
    pub payees: usize,
    pub projects: usize,
    pub transactions: usize,
    pub splits: usize,
}

/// Write the accumulated backup into the store. One write transaction per
/// phase: root categories, child categories, accounts, payees, projects,
/// transactions with their splits. References that no longer resolve are
/// stored as NULL; only the phase in flight rolls back on error.
pub fn persist(conn: &mut Connection, backup: &Backup) -> Result<ImportCounts> {
    let mut counts = ImportCounts::default();
    let flattened = flatten_categories(&backup.categories);

    let tx = conn.transaction()?;
    for (id, name) in &flattened.roots {
        store::insert_category(&tx, &Category { id: *id, name: name.clone(), parent_id: None })?;
    }
    tx.commit()?;

    let tx = conn.transaction()?;
    for (id, name, parent_id) in &flattened.children {
        store::insert_category(
            &tx,
            &Category { id: *id, name: name.clone(), parent_id: Some(*parent_id) },
        )?;
    }
    tx.commit()?;
    counts.categories = flattened.roots.len() + flattened.children.len();

    let tx = conn.transaction()?;
    for record in &backup.accounts {
        let currency = record
            .currency_id
            .as_ref()
            .and_then(|id| backup.currencies.get(id))
            .cloned()
            .unwrap_or_else(|| FALLBACK_CURRENCY.to_string());
        store::insert_account(
            &tx,
            &Account {
                id: record.id,
                title: record.title.clone(),
                currency,
                balance: record.balance,
                account_type: record.account_type,
                card_type: record.card_type,
                online_account_type: record.online_account_type,
                is_active: record.is_active,
                include_in_totals: record.include_in_totals,
                sort_order: record.sort_order,
                note: record.note.clone(),
                created_at: record.created_at,
                last_transaction_at: None,
            },
        )?;
    }
    tx.commit()?;
    counts.accounts = backup.accounts.len();

    let tx = conn.transaction()?;
    for record in &backup.payees {
        let mut last_category_id = None;
        if let Some(id) = record.last_category_id {
            let id = remap_category(&flattened.migrations, id);
            if store::category_exists(&tx, id)? {
                last_category_id = Some(id);
            }
        }
        store::insert_payee(
            &tx,
            &Payee { id: record.id, name: record.name.clone(), last_category_id },
        )?;
    }
    tx.commit()?;
    counts.payees = backup.payees.len();

    let tx = conn.transaction()?;
    for record in &backup.projects {
        store::insert_project(
            &tx,
            &Project {
                id: record.id,
                title: record.title.clone(),
                is_active: record.is_active,
                updated_at: record.updated_at,
            },
        )?;
    }
    tx.commit()?;
    counts.projects = backup.projects.len();

    let tx = conn.transaction()?;
    for record in &backup.transactions {
        let from_account_id = match record.from_account_id {
            Some(id) if store::account_exists(&tx, id)? => Some(id),
            _ => None,
        };
        let to_account_id = match record.to_account_id {
            Some(id) if store::account_exists(&tx, id)? => Some(id),
            _ => None,
        };
        let category_id = match record.category_id {
            Some(id) => {
                let id = remap_category(&flattened.migrations, id);
                store::category_exists(&tx, id)?.then_some(id)
            }
            None => None,
        };
        let payee_id = match record.payee_id {
            Some(id) if store::payee_exists(&tx, id)? => Some(id),
            _ => None,
        };
        let project_id = match record.project_id {
            Some(id) if store::project_exists(&tx, id)? => Some(id),
            _ => None,
        };

        let (original_currency, original_amount) = match &record.original_currency_id {
            Some(currency_id) if currency_id != "-1" => match backup.currencies.get(currency_id) {
                Some(code) => (Some(code.clone()), record.original_amount),
                None => {
                    warn!("skipping unknown original currency id {currency_id}");
                    (None, None)
                }
            },
            _ => (None, None),
        };

        let splits = backup.splits.get(&record.id);
        let from_amount = match splits {
            // The split amounts are already debit magnitudes; their sum
            // replaces whatever the top-level record carried.
            Some(splits) => Some(splits.iter().map(|s| s.amount).sum()),
            None => record.from_amount,
        };

        store::insert_transaction(
            &tx,
            &Transaction {
                id: record.id,
                from_account_id,
                from_amount,
                from_running_balance: None,
                to_account_id,
                to_amount: record.to_amount,
                to_running_balance: None,
                payee_id,
                category_id,
                project_id,
                note: record.note.clone(),
                original_currency,
                original_amount,
                occurred_at: record.occurred_at,
                cleared_at: record.occurred_at,
                updated_at: record.updated_at,
            },
        )?;
        counts.transactions += 1;

        if let Some(splits) = splits {
            for split in splits {
                let category_id = match split.category_id {
                    Some(id) => {
                        let id = remap_category(&flattened.migrations, id);
                        store::category_exists(&tx, id)?.then_some(id)
                    }
                    None => None,
                };
                let project_id = match split.project_id {
                    Some(id) if store::project_exists(&tx, id)? => Some(id),
                    _ => None,
                };
                store::insert_split(
                    &tx,
                    &TransactionSplit {
                        id: split.id,
                        transaction_id: record.id,
                        amount: split.amount,
                        category_id,
                        project_id,
                        note: split.note.clone(),
                    },
                )?;
                counts.splits += 1;
            }
        }
    }
    tx.commit()?;

    Ok(counts)
}
