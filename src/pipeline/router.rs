//! Category → department mailbox routing.

use std::collections::HashMap;

use crate::error::ConfigError;
use crate::pipeline::types::Category;

/// Mailboxes used when no explicit address is configured for a category.
const DEFAULT_ADDRESSES: [(Category, &str); 6] = [
    (Category::Training, "training@example.com"),
    (Category::ItOperations, "it-ops@example.com"),
    (Category::Technology, "tech@example.com"),
    (Category::Hr, "hr@example.com"),
    (Category::Finance, "finance@example.com"),
    (Category::Sales, "sales@example.com"),
];

/// Immutable routing table, built once at startup.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    addresses: HashMap<Category, String>,
    default_address: String,
}

impl RoutingTable {
    /// Build a table from explicit entries plus a fallback address.
    pub fn new(
        entries: impl IntoIterator<Item = (Category, String)>,
        default_address: impl Into<String>,
    ) -> Self {
        Self {
            addresses: entries.into_iter().collect(),
            default_address: default_address.into(),
        }
    }

    /// Build from a key lookup (usually the process environment).
    ///
    /// Each category reads its own key (`TRAINING_EMAIL`, `IT_OPS_EMAIL`, ...)
    /// and falls back to a built-in mailbox. `DEFAULT_TICKET_EMAIL` overrides
    /// the fallback address, which otherwise is `default_address`.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        default_address: &str,
    ) -> Result<Self, ConfigError> {
        let mut addresses = HashMap::with_capacity(DEFAULT_ADDRESSES.len());
        for (category, fallback) in DEFAULT_ADDRESSES {
            let address = lookup(category.env_key()).unwrap_or_else(|| fallback.to_string());
            validate_address(category.env_key(), &address)?;
            addresses.insert(category, address);
        }

        let default_address =
            lookup("DEFAULT_TICKET_EMAIL").unwrap_or_else(|| default_address.to_string());
        validate_address("DEFAULT_TICKET_EMAIL", &default_address)?;

        Ok(Self {
            addresses,
            default_address,
        })
    }

    pub fn default_address(&self) -> &str {
        &self.default_address
    }
}

fn validate_address(key: &str, address: &str) -> Result<(), ConfigError> {
    let trimmed = address.trim();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{address}' is not an email address"),
        });
    }
    Ok(())
}

/// Resolves the destination mailbox for a category.
#[derive(Debug, Clone)]
pub struct TicketRouter {
    table: RoutingTable,
}

impl TicketRouter {
    pub fn new(table: RoutingTable) -> Self {
        Self { table }
    }

    /// Look up the mailbox for `category`, falling back to the default.
    pub fn route(&self, category: Category) -> &str {
        match self.table.addresses.get(&category) {
            Some(address) => address,
            None => {
                tracing::warn!(
                    category = %category,
                    fallback = %self.table.default_address,
                    "No mailbox configured for category, using default"
                );
                &self.table.default_address
            }
        }
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }
}
