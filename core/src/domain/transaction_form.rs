//! Transaction form handling and validation.
//!
//! All form business rules live here so the UI only handles presentation:
//! raw-input cleaning, amount parsing, the field-level validation the
//! aggregator runs before any remote call, and amount formatting helpers.
//! Validation failures never reach the backend.

use shared::{
    CreateTransactionRequest, TransactionFormConfig, TransactionFormState, TransactionFormValidation,
    TransactionType, TransactionValidationError,
};

/// Service owning transaction form business logic
#[derive(Clone)]
pub struct TransactionFormService {
    config: TransactionFormConfig,
}

impl Default for TransactionFormService {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionFormService {
    pub fn new() -> Self {
        Self {
            config: TransactionFormConfig::default(),
        }
    }

    pub fn with_config(config: TransactionFormConfig) -> Self {
        Self { config }
    }

    /// A blank form for the add-transaction screen
    pub fn create_form_state() -> TransactionFormState {
        TransactionFormState {
            title: String::new(),
            amount_input: String::new(),
            transaction_type: TransactionType::Expense,
            category: String::new(),
            notes: String::new(),
            is_submitting: false,
            error_message: None,
        }
    }

    /// Validate raw form input (title, amount string, category).
    ///
    /// Collects every field error rather than stopping at the first, so the
    /// UI can surface them field by field.
    pub fn validate_form(
        &self,
        title: &str,
        amount_input: &str,
        category: &str,
    ) -> TransactionFormValidation {
        let mut errors = Vec::new();

        self.check_title(title, &mut errors);

        let cleaned_amount = if amount_input.trim().is_empty() {
            errors.push(TransactionValidationError::EmptyAmount);
            None
        } else {
            match self.clean_and_parse_amount(amount_input) {
                Ok(amount) => self.check_amount(amount, &mut errors),
                Err(detail) => {
                    errors.push(TransactionValidationError::InvalidAmountFormat(detail));
                    None
                }
            }
        };

        self.check_category(category, &mut errors);

        TransactionFormValidation {
            is_valid: errors.is_empty(),
            errors,
            cleaned_amount,
        }
    }

    /// Validate a draft that already carries a numeric amount
    pub fn validate_draft(&self, request: &CreateTransactionRequest) -> TransactionFormValidation {
        let mut errors = Vec::new();
        self.check_title(&request.title, &mut errors);
        let cleaned_amount = self.check_amount(request.amount, &mut errors);
        self.check_category(&request.category, &mut errors);

        TransactionFormValidation {
            is_valid: errors.is_empty(),
            errors,
            cleaned_amount,
        }
    }

    fn check_title(&self, title: &str, errors: &mut Vec<TransactionValidationError>) {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            errors.push(TransactionValidationError::EmptyTitle);
        } else if trimmed.chars().count() < self.config.min_title_length {
            errors.push(TransactionValidationError::TitleTooShort(
                self.config.min_title_length,
            ));
        } else if trimmed.chars().count() > self.config.max_title_length {
            errors.push(TransactionValidationError::TitleTooLong(
                self.config.max_title_length,
            ));
        }
    }

    fn check_amount(
        &self,
        amount: f64,
        errors: &mut Vec<TransactionValidationError>,
    ) -> Option<f64> {
        if !amount.is_finite() || amount <= 0.0 {
            errors.push(TransactionValidationError::AmountNotPositive);
            None
        } else if amount > self.config.max_amount {
            errors.push(TransactionValidationError::AmountTooLarge(self.config.max_amount));
            None
        } else if has_too_many_decimal_places(amount) {
            errors.push(TransactionValidationError::AmountPrecisionTooHigh);
            None
        } else {
            Some(amount)
        }
    }

    fn check_category(&self, category: &str, errors: &mut Vec<TransactionValidationError>) {
        if category.trim().is_empty() {
            errors.push(TransactionValidationError::EmptyCategory);
        }
    }

    /// Clean and parse raw amount input (strips the currency symbol,
    /// thousands separators and whitespace)
    pub fn clean_and_parse_amount(&self, amount_input: &str) -> Result<f64, String> {
        let cleaned = amount_input
            .trim()
            .replace(&self.config.currency_symbol, "")
            .replace(',', "")
            .replace(' ', "");

        if cleaned.is_empty() {
            return Err("empty amount after cleaning".to_string());
        }

        cleaned
            .parse::<f64>()
            .map_err(|err| format!("invalid number: {}", err))
    }

    /// Format an amount for display
    pub fn format_amount(&self, amount: f64) -> String {
        format!("{}{:.2}", self.config.currency_symbol, amount)
    }

    /// Format an amount with the sign its type implies
    pub fn format_signed_amount(&self, transaction_type: TransactionType, amount: f64) -> String {
        match transaction_type {
            TransactionType::Income => format!("+{}", self.format_amount(amount)),
            TransactionType::Expense => format!("-{}", self.format_amount(amount)),
        }
    }
}

/// Money amounts carry at most two significant decimal places
fn has_too_many_decimal_places(amount: f64) -> bool {
    let formatted = format!("{:.3}", amount);
    match formatted.split_once('.') {
        Some((_, decimals)) => decimals.len() > 2 && !decimals.ends_with('0'),
        None => false,
    }
}
