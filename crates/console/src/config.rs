use ledgerbus_events::DuplicatePolicy;
use ledgerbus_sales::CustomerAccount;

pub const COMPANY_NAME_ENV: &str = "LEDGERBUS_COMPANY_NAME";
pub const CUSTOMER_ENV: &str = "LEDGERBUS_CUSTOMER";
pub const DEDUPLICATE_ENV: &str = "LEDGERBUS_DEDUPLICATE";

pub const DEFAULT_COMPANY_NAME: &str = "Demo Company";
pub const DEFAULT_CUSTOMER: &str = "ABB001";

/// Harness settings. Missing or unusable values fall back to defaults with a warning.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub company_name: String,
    pub customer: CustomerAccount,
    pub duplicate_policy: DuplicatePolicy,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the process environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let company_name = lookup(COMPANY_NAME_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| {
                tracing::warn!("{COMPANY_NAME_ENV} not set; using '{DEFAULT_COMPANY_NAME}'");
                DEFAULT_COMPANY_NAME.to_string()
            });

        let customer = match lookup(CUSTOMER_ENV).map(CustomerAccount::new) {
            Some(Ok(customer)) => customer,
            Some(Err(err)) => {
                tracing::warn!(error = %err, "{CUSTOMER_ENV} invalid; using '{DEFAULT_CUSTOMER}'");
                default_customer()
            }
            None => default_customer(),
        };

        let duplicate_policy = match lookup(DEDUPLICATE_ENV).as_deref().map(parse_flag) {
            Some(Some(true)) => DuplicatePolicy::Ignore,
            Some(Some(false)) | None => DuplicatePolicy::Allow,
            Some(None) => {
                tracing::warn!("{DEDUPLICATE_ENV} is not a boolean; duplicates allowed");
                DuplicatePolicy::Allow
            }
        };

        Self {
            company_name,
            customer,
            duplicate_policy,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            company_name: DEFAULT_COMPANY_NAME.to_string(),
            customer: default_customer(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

fn default_customer() -> CustomerAccount {
    CustomerAccount::from_static(DEFAULT_CUSTOMER)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
