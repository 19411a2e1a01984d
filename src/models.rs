/// Account kinds. Stored as their canonical string; unknown values read back
/// as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountType {
    Cash,
    DebitCard,
    CreditCard,
    Bank,
    Savings,
    Loan,
    Online,
    Other,
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::DebitCard => "DEBIT_CARD",
            Self::CreditCard => "CREDIT_CARD",
            Self::Bank => "BANK",
            Self::Savings => "SAVINGS",
            Self::Loan => "LOAN",
            Self::Online => "ONLINE",
            Self::Other => "OTHER",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "CASH" => Self::Cash,
            "DEBIT_CARD" => Self::DebitCard,
            "CREDIT_CARD" => Self::CreditCard,
            "BANK" => Self::Bank,
            "SAVINGS" => Self::Savings,
            "LOAN" => Self::Loan,
            "ONLINE" => Self::Online,
            _ => Self::Other,
        }
    }
}

/// Card issuer for debit/credit card accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardType {
    Visa,
    VisaElectron,
    Mastercard,
    Maestro,
    AmericanExpress,
    Discover,
    Cirrus,
    Jcb,
    Diners,
    Unionpay,
    Eps,
    Other,
}

impl CardType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Visa => "VISA",
            Self::VisaElectron => "VISA_ELECTRON",
            Self::Mastercard => "MASTERCARD",
            Self::Maestro => "MAESTRO",
            Self::AmericanExpress => "AMERICAN_EXPRESS",
            Self::Discover => "DISCOVER",
            Self::Cirrus => "CIRRUS",
            Self::Jcb => "JCB",
            Self::Diners => "DINERS",
            Self::Unionpay => "UNIONPAY",
            Self::Eps => "EPS",
            Self::Other => "OTHER",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "VISA" => Self::Visa,
            "VISA_ELECTRON" => Self::VisaElectron,
            "MASTERCARD" => Self::Mastercard,
            "MAESTRO" => Self::Maestro,
            "AMERICAN_EXPRESS" => Self::AmericanExpress,
            "DISCOVER" => Self::Discover,
            "CIRRUS" => Self::Cirrus,
            "JCB" => Self::Jcb,
            "DINERS" => Self::Diners,
            "UNIONPAY" => Self::Unionpay,
            "EPS" => Self::Eps,
            _ => Self::Other,
        }
    }
}

/// Provider for online accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnlineAccountType {
    Paypal,
    Amazon,
    GoogleWallet,
    Other,
}

impl OnlineAccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paypal => "PAYPAL",
            Self::Amazon => "AMAZON",
            Self::GoogleWallet => "GOOGLE_WALLET",
            Self::Other => "OTHER",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "PAYPAL" => Self::Paypal,
            "AMAZON" => Self::Amazon,
            "GOOGLE_WALLET" => Self::GoogleWallet,
            _ => Self::Other,
        }
    }
}

/// Amounts are minor currency units (cents); timestamps are epoch
/// milliseconds. `balance` and `last_transaction_at` are derived: the
/// integrity fixer recomputes both from transaction history and is their
/// only writer after import.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub title: String,
    pub currency: String,
    pub balance: i64,
    pub account_type: AccountType,
    pub card_type: Option<CardType>,
    pub online_account_type: Option<OnlineAccountType>,
    pub is_active: bool,
    pub include_in_totals: bool,
    pub sort_order: i64,
    pub note: Option<String>,
    pub created_at: i64,
    pub last_transaction_at: Option<i64>,
}

/// A category's parent, when set, is itself a root category: the tree is at
/// most two levels deep by construction.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct Payee {
    pub id: i64,
    pub name: String,
    /// Cache hint, not authoritative.
    pub last_category_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub is_active: bool,
    pub updated_at: Option<i64>,
}

/// Both accounts set: transfer. Only `from`: debit. Only `to`: credit.
/// At least one side is always set. Amounts carry non-negative magnitudes on
/// their semantic side; running balance snapshots are stamped by the
/// integrity fixer.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: i64,
    pub from_account_id: Option<i64>,
    pub from_amount: Option<i64>,
    pub from_running_balance: Option<i64>,
    pub to_account_id: Option<i64>,
    pub to_amount: Option<i64>,
    pub to_running_balance: Option<i64>,
    pub payee_id: Option<i64>,
    pub category_id: Option<i64>,
    pub project_id: Option<i64>,
    pub note: Option<String>,
    pub original_currency: Option<String>,
    pub original_amount: Option<i64>,
    pub occurred_at: i64,
    pub cleared_at: i64,
    pub updated_at: Option<i64>,
}

/// Sub-allocation of one transaction's amount. When a transaction has
/// splits, the sum of their amounts replaces its debit amount.
#[derive(Debug, Clone)]
pub struct TransactionSplit {
    pub id: i64,
    pub transaction_id: i64,
    pub amount: i64,
    pub category_id: Option<i64>,
    pub project_id: Option<i64>,
    pub note: Option<String>,
}
