//! Request bodies shared by the admin panels and storefront forms.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Validate, ValidationErrors, Validator};
use crate::permissions::is_known_permission;
use crate::types::{ModCategory, TicketCategory, TicketPriority};

const MAX_PRICE: Decimal = Decimal::from_parts(99_999, 0, 0, false, 2);

/// Create/update body for a catalog mod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub discount_price: Option<Decimal>,
    /// Category slug; parsed after validation.
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub download_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    pub version: String,
    #[serde(default)]
    pub changelog: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_subscription_only: bool,
}

impl ModInput {
    /// The parsed category. Only meaningful once [`Validate::validate`] passed.
    #[must_use]
    pub fn category(&self) -> Option<ModCategory> {
        self.category.parse().ok()
    }
}

impl Validate for ModInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let slugs: Vec<&str> = ModCategory::ALL.iter().map(|c| c.slug()).collect();
        let price = self.price;

        let mut v = Validator::new()
            .length("title", &self.title, 3, 120)
            .length("description", &self.description, 0, 5000)
            .range("price", price, Decimal::ZERO, MAX_PRICE)
            .one_of("category", &self.category, &slugs)
            .url("download_url", &self.download_url)
            .length("version", &self.version, 1, 32)
            .optional_length("changelog", self.changelog.as_deref(), 0, 5000)
            .custom("tags", || {
                self.tags
                    .iter()
                    .any(|t| t.trim().is_empty() || t.chars().count() > 32)
                    .then(|| "tags must be 1-32 characters".to_owned())
            });

        if let Some(discount) = self.discount_price {
            v = v.custom("discount_price", || {
                (discount < Decimal::ZERO || discount > price)
                    .then(|| "must be between 0 and the price".to_owned())
            });
        }
        if let Some(thumbnail) = self.thumbnail_url.as_deref() {
            v = v.url("thumbnail_url", thumbnail);
        }
        v.finish()
    }
}

/// Create/update body for a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Validate for RoleInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .length("name", &self.name, 2, 50)
            .optional_length("description", self.description.as_deref(), 0, 255)
            .custom("permissions", || {
                let unknown: Vec<&str> = self
                    .permissions
                    .iter()
                    .map(String::as_str)
                    .filter(|p| !is_known_permission(p))
                    .collect();
                (!unknown.is_empty())
                    .then(|| format!("unknown permissions: {}", unknown.join(", ")))
            })
            .finish()
    }
}

/// Body for opening a support ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketInput {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub category: TicketCategory,
    #[serde(default)]
    pub priority: TicketPriority,
}

impl Validate for TicketInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .length("title", &self.title, 5, 120)
            .length("description", &self.description, 10, 5000)
            .finish()
    }
}

/// Body for starting a forum thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumThreadInput {
    pub title: String,
    pub body: String,
    #[serde(default = "default_forum_category")]
    pub category: String,
}

fn default_forum_category() -> String {
    "general".to_owned()
}

/// Forum boards a thread may be posted to.
pub const FORUM_CATEGORIES: &[&str] = &["general", "help", "showcase", "requests", "bugs"];

impl Validate for ForumThreadInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .length("title", &self.title, 5, 150)
            .length("body", &self.body, 1, 10_000)
            .one_of("category", &self.category, FORUM_CATEGORIES)
            .finish()
    }
}

/// Body for replying in a forum thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumPostInput {
    pub body: String,
}

impl Validate for ForumPostInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new().length("body", &self.body, 1, 10_000).finish()
    }
}

/// Site-wide settings, stored as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub site_name: String,
    pub support_email: String,
    pub maintenance_mode: bool,
    pub maintenance_message: Option<String>,
    /// How many featured mods the storefront highlights.
    pub featured_limit: u32,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: "Modvault".to_owned(),
            support_email: "support@modvault.gg".to_owned(),
            maintenance_mode: false,
            maintenance_message: None,
            featured_limit: 8,
        }
    }
}

impl Validate for SiteSettings {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let limit = self.featured_limit;
        Validator::new()
            .length("site_name", &self.site_name, 1, 80)
            .email("support_email", &self.support_email)
            .optional_length(
                "maintenance_message",
                self.maintenance_message.as_deref(),
                0,
                500,
            )
            .custom("featured_limit", || {
                (!(1..=50).contains(&limit)).then(|| "must be between 1 and 50".to_owned())
            })
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn mod_input() -> ModInput {
        ModInput {
            title: "Tandem Drift Pack".into(),
            description: "Six cars tuned for tandem runs.".into(),
            price: Decimal::new(1999, 2),
            discount_price: Some(Decimal::new(1499, 2)),
            category: "drift".into(),
            tags: vec!["drift".into(), "jdm".into()],
            download_url: "https://cdn.modvault.gg/tandem.zip".into(),
            thumbnail_url: None,
            version: "1.2.0".into(),
            changelog: None,
            is_featured: false,
            is_subscription_only: false,
        }
    }

    #[test]
    fn test_valid_mod() {
        let input = mod_input();
        assert!(input.validate().is_ok());
        assert_eq!(input.category(), Some(ModCategory::Drift));
    }

    #[test]
    fn test_mod_discount_above_price() {
        let input = ModInput {
            discount_price: Some(Decimal::new(2500, 2)),
            ..mod_input()
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.has("discount_price"));
    }

    #[test]
    fn test_mod_reports_all_bad_fields() {
        let input = ModInput {
            title: "ab".into(),
            price: Decimal::new(100_000, 2),
            discount_price: None,
            category: "boats".into(),
            download_url: "file:///etc/passwd".into(),
            version: String::new(),
            ..mod_input()
        };
        let errors = input.validate().unwrap_err();
        for field in ["title", "price", "category", "download_url", "version"] {
            assert!(errors.has(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_role_unknown_permission() {
        let input = RoleInput {
            name: "Moderator".into(),
            description: None,
            permissions: vec!["view_users".into(), "fly".into()],
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.to_string().contains("fly"));
    }

    #[test]
    fn test_ticket_lengths() {
        let input = TicketInput {
            title: "Help".into(),
            description: "short".into(),
            category: TicketCategory::default(),
            priority: TicketPriority::default(),
        };
        assert_eq!(input.validate().unwrap_err().len(), 2);
    }

    #[test]
    fn test_forum_inputs() {
        let thread = ForumThreadInput {
            title: "Best FFB settings?".into(),
            body: "Looking for wheel settings.".into(),
            category: "help".into(),
        };
        assert!(thread.validate().is_ok());
        assert!(ForumPostInput { body: "  ".into() }.validate().is_err());
    }

    #[test]
    fn test_settings() {
        assert!(SiteSettings::default().validate().is_ok());
        let bad = SiteSettings {
            support_email: "nope".into(),
            featured_limit: 0,
            ..SiteSettings::default()
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.has("support_email"));
        assert!(errors.has("featured_limit"));
    }
}
