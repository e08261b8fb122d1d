use crate::errors::{WalletError, WalletResult};
use regex::Regex;

/// Largest amount accepted for a single investment, in whole units.
const MAX_AMOUNT: f64 = 1_000_000_000.0;

/// Input validation utilities for the wallet
pub struct InputValidator {
    // Compiled regex patterns for performance
    address_pattern: Regex,
    amount_pattern: Regex,
    project_id_pattern: Regex,

    // Blacklisted patterns for security
    malicious_patterns: Vec<Regex>,
}

impl InputValidator {
    pub fn new() -> WalletResult<Self> {
        // Ed25519 account ids: version byte 'G' followed by 55 base32 characters
        let address_pattern = Regex::new(r"^G[A-Z2-7]{55}$")
            .map_err(|e| WalletError::ValidationError(format!("Invalid address regex: {}", e)))?;

        // Native amounts carry at most seven fractional digits (one stroop)
        let amount_pattern = Regex::new(r"^\d+(\.\d{1,7})?$")
            .map_err(|e| WalletError::ValidationError(format!("Invalid amount regex: {}", e)))?;

        let project_id_pattern = Regex::new(r"^[A-Za-z0-9_\-]{1,64}$").map_err(|e| {
            WalletError::ValidationError(format!("Invalid project id regex: {}", e))
        })?;

        // Common malicious patterns to block
        let malicious_patterns = [
            r"<script",
            r"javascript:",
            r"data:text/html",
            r"vbscript:",
            r"onload=",
            r"onerror=",
        ]
        .iter()
        .map(|pattern| {
            Regex::new(pattern)
                .map_err(|e| WalletError::ValidationError(format!("Invalid pattern: {}", e)))
        })
        .collect::<WalletResult<Vec<_>>>()?;

        Ok(InputValidator {
            address_pattern,
            amount_pattern,
            project_id_pattern,
            malicious_patterns,
        })
    }

    /// Validate a ledger account address
    pub fn validate_address(&self, address: &str) -> WalletResult<()> {
        self.check_basic_security(address)?;

        if address.is_empty() {
            return Err(WalletError::ValidationError(
                "Address cannot be empty".to_string(),
            ));
        }

        if !self.address_pattern.is_match(address) {
            return Err(WalletError::InvalidAddress(
                "Address format is invalid".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate an amount string and return its numeric value
    pub fn validate_amount(&self, amount: &str) -> WalletResult<f64> {
        self.check_basic_security(amount)?;

        if amount.is_empty() {
            return Err(WalletError::ValidationError(
                "Amount cannot be empty".to_string(),
            ));
        }

        if !self.amount_pattern.is_match(amount) {
            return Err(WalletError::InvalidAmount(
                "Amount format is invalid".to_string(),
            ));
        }

        let parsed: f64 = amount
            .parse()
            .map_err(|_| WalletError::InvalidAmount("Invalid number format".to_string()))?;

        if parsed <= 0.0 {
            return Err(WalletError::InvalidAmount(
                "Amount must be positive".to_string(),
            ));
        }

        if parsed > MAX_AMOUNT {
            return Err(WalletError::InvalidAmount("Amount too large".to_string()));
        }

        Ok(parsed)
    }

    /// Validate a funding project identifier
    pub fn validate_project_id(&self, project_id: &str) -> WalletResult<()> {
        self.check_basic_security(project_id)?;

        if !self.project_id_pattern.is_match(project_id) {
            return Err(WalletError::ValidationError(
                "Project id contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }

    /// Check for basic security issues in any input
    fn check_basic_security(&self, input: &str) -> WalletResult<()> {
        if input.len() > 1000 {
            return Err(WalletError::ValidationError("Input too long".to_string()));
        }

        let lowered = input.to_lowercase();
        for pattern in &self.malicious_patterns {
            if pattern.is_match(&lowered) {
                return Err(WalletError::ValidationError(
                    "Input contains potentially malicious content".to_string(),
                ));
            }
        }

        Ok(())
    }
}
