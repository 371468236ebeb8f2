use serde::{Deserialize, Serialize};
use std::fmt;

/// A single income or expense record owned by one user.
///
/// The `id` is assigned by the remote store on creation; drafts built on the
/// client never carry one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    /// Short human-readable title (trimmed, at least 3 characters)
    pub title: String,
    /// Transaction amount, always positive; the type carries the sign
    pub amount: f64,
    pub transaction_type: TransactionType,
    /// Category name, normally drawn from the fixed per-type lists
    pub category: String,
    /// Timestamp with timezone (RFC 3339), defaults to creation time
    pub date: String,
    pub notes: Option<String>,
}

/// Whether a transaction adds to or subtracts from the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application-owned profile record associated with a provider identity.
///
/// Distinct from the provider's own account record: the provider issues the
/// `id`, the application owns name and avatar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
}

/// Bearer credential plus expiry issued by the identity provider.
///
/// The client persists this to durable local storage as a cache; the provider
/// remains the source of truth. The payload carries the provider's profile
/// hints so a minimal user can be shown before the profile row loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    /// Provider-issued identifier of the user this session belongs to
    pub user_id: String,
    pub email: String,
    /// Expiry as unix seconds
    pub expires_at: i64,
    /// Display-name hint from provider metadata
    pub name_hint: Option<String>,
    /// Avatar reference hint from provider metadata
    pub avatar_hint: Option<String>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() >= self.expires_at
    }
}

/// Per-category expense summary, derived on demand from the transaction set
/// and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryData {
    pub name: String,
    /// Summed expense amount for this category
    pub amount: f64,
    /// Display color drawn from the fixed chart palette
    pub color: String,
    /// Icon name for the category, `"circle"` when unknown
    pub icon: String,
    /// Share of the total expense sum, in percent
    pub percentage: f64,
}

/// Draft for a new transaction; the store assigns the id on creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    pub title: String,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub category: String,
    /// Optional date override (RFC 3339) - uses current time if not provided
    pub date: Option<String>,
    pub notes: Option<String>,
}

/// Partial update for an existing transaction; `None` fields are unchanged.
/// The store returns the full merged record, which is authoritative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTransactionRequest {
    pub title: Option<String>,
    pub amount: Option<f64>,
    pub transaction_type: Option<TransactionType>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

/// Request for creating a profile row for a provider identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProfileRequest {
    /// Provider-issued user identifier
    pub id: String,
    pub email: String,
    pub name: String,
    pub avatar: Option<String>,
}

/// Partial update for an existing profile; `None` fields are unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

/// State for the add/edit transaction form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionFormState {
    pub title: String,
    pub amount_input: String,
    pub transaction_type: TransactionType,
    pub category: String,
    pub notes: String,
    pub is_submitting: bool,
    pub error_message: Option<String>,
}

/// Validation result for transaction form input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionFormValidation {
    pub is_valid: bool,
    pub errors: Vec<TransactionValidationError>,
    pub cleaned_amount: Option<f64>,
}

/// Field-level validation errors for transaction drafts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransactionValidationError {
    EmptyTitle,
    TitleTooShort(usize),
    TitleTooLong(usize),
    EmptyAmount,
    InvalidAmountFormat(String),
    AmountNotPositive,
    AmountTooLarge(f64),
    AmountPrecisionTooHigh,
    EmptyCategory,
}

impl TransactionValidationError {
    /// The form field this error belongs to
    pub fn field(&self) -> &'static str {
        match self {
            TransactionValidationError::EmptyTitle
            | TransactionValidationError::TitleTooShort(_)
            | TransactionValidationError::TitleTooLong(_) => "title",
            TransactionValidationError::EmptyAmount
            | TransactionValidationError::InvalidAmountFormat(_)
            | TransactionValidationError::AmountNotPositive
            | TransactionValidationError::AmountTooLarge(_)
            | TransactionValidationError::AmountPrecisionTooHigh => "amount",
            TransactionValidationError::EmptyCategory => "category",
        }
    }

    pub fn message(&self) -> String {
        match self {
            TransactionValidationError::EmptyTitle => "Title is required".to_string(),
            TransactionValidationError::TitleTooShort(min) => {
                format!("Title must be at least {} characters", min)
            }
            TransactionValidationError::TitleTooLong(max) => {
                format!("Title cannot exceed {} characters", max)
            }
            TransactionValidationError::EmptyAmount => "Amount is required".to_string(),
            TransactionValidationError::InvalidAmountFormat(detail) => {
                format!("Amount must be a valid number: {}", detail)
            }
            TransactionValidationError::AmountNotPositive => {
                "Amount must be greater than 0".to_string()
            }
            TransactionValidationError::AmountTooLarge(max) => {
                format!("Amount cannot exceed {:.0}", max)
            }
            TransactionValidationError::AmountPrecisionTooHigh => {
                "Use at most 2 decimal places".to_string()
            }
            TransactionValidationError::EmptyCategory => "Category is required".to_string(),
        }
    }
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Policy configuration for transaction form validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionFormConfig {
    pub min_title_length: usize,
    pub max_title_length: usize,
    pub min_amount: f64,
    pub max_amount: f64,
    pub currency_symbol: String,
}

impl Default for TransactionFormConfig {
    fn default() -> Self {
        Self {
            min_title_length: 3,
            max_title_length: 120,
            min_amount: 0.01,
            max_amount: 1_000_000.0,
            currency_symbol: "$".to_string(),
        }
    }
}

/// Color theme preference, persisted as a plain string
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    pub fn from_storage(value: &str) -> Option<Self> {
        match value {
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

/// Fixed category list for expense transactions
pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Food",
    "Transportation",
    "Utilities",
    "Entertainment",
    "Healthcare",
    "Shopping",
    "Education",
    "Other",
];

/// Fixed category list for income transactions
pub const INCOME_CATEGORIES: &[&str] = &[
    "Salary",
    "Freelance",
    "Investment",
    "Business",
    "Gift",
    "Other",
];

/// Chart palette for category breakdowns; assignment wraps by index
pub const CATEGORY_PALETTE: &[&str] = &[
    "#EF4444", "#F59E0B", "#10B981", "#3B82F6", "#8B5CF6", "#F97316", "#EC4899", "#6B7280",
];

/// The category list appropriate for a transaction type
pub fn categories_for(transaction_type: TransactionType) -> &'static [&'static str] {
    match transaction_type {
        TransactionType::Income => INCOME_CATEGORIES,
        TransactionType::Expense => EXPENSE_CATEGORIES,
    }
}

/// Icon name for a category, falling back to a plain circle for freeform
/// categories the client does not know about.
pub fn category_icon(category: &str) -> &'static str {
    match category {
        "Food" => "utensils",
        "Transportation" => "car",
        "Utilities" => "zap",
        "Entertainment" => "gamepad",
        "Healthcare" => "heart",
        "Shopping" => "shopping-bag",
        "Education" => "graduation-cap",
        "Salary" => "banknote",
        "Freelance" => "laptop",
        "Investment" => "trending-up",
        "Business" => "building",
        "Gift" => "gift",
        "Other" => "more-horizontal",
        _ => "circle",
    }
}
