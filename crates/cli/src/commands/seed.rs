//! Catalog seeding from YAML.
//!
//! ```yaml
//! mods:
//!   - title: Tandem Drift Pack
//!     price: "4.99"
//!     category: drift
//!     download_url: https://cdn.modvault.gg/tandem.zip
//!     version: "1.0.0"
//! tiers:
//!   - name: Pro
//!     price: "9.99"
//!     duration_days: 30
//!     features: [All subscription mods]
//! ```
//!
//! Mods whose title already exists are skipped. Tiers are upserted by name.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{error, info};

use modvault_admin::db::ModRepository;
use modvault_core::validation::{ModInput, Validate};

#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub mods: Vec<ModInput>,
    #[serde(default)]
    pub tiers: Vec<TierSeed>,
}

#[derive(Debug, Deserialize)]
pub struct TierSeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default = "default_duration")]
    pub duration_days: i32,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub sort_order: i32,
}

const fn default_duration() -> i32 {
    30
}

/// Every problem in the file, prefixed with where it was found.
#[must_use]
pub fn validate_catalog(catalog: &CatalogFile) -> Vec<String> {
    let mut problems = Vec::new();
    for (index, input) in catalog.mods.iter().enumerate() {
        if let Err(errors) = input.validate() {
            problems.push(format!("mods[{index}] ({}): {errors}", input.title));
        }
    }
    for (index, tier) in catalog.tiers.iter().enumerate() {
        if tier.name.trim().is_empty() {
            problems.push(format!("tiers[{index}]: name is required"));
        }
        if tier.price <= Decimal::ZERO {
            problems.push(format!("tiers[{index}] ({}): price must be positive", tier.name));
        }
        if tier.duration_days <= 0 {
            problems.push(format!(
                "tiers[{index}] ({}): duration_days must be positive",
                tier.name
            ));
        }
    }
    problems
}

/// Load mods and tiers from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, validation fails,
/// or a database operation fails.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog");
    let content = tokio::fs::read_to_string(path).await?;
    let catalog: CatalogFile = serde_yaml::from_str(&content)?;
    info!(mods = catalog.mods.len(), tiers = catalog.tiers.len(), "Parsed catalog");

    // Validate everything before touching the database
    let problems = validate_catalog(&catalog);
    if !problems.is_empty() {
        error!("Catalog validation failed:");
        for problem in &problems {
            error!("  - {problem}");
        }
        return Err(format!("{} validation errors found", problems.len()).into());
    }

    let pool = super::connect().await?;

    let mut inserted = 0usize;
    let mut skipped = 0usize;
    let mods = ModRepository::new(&pool);
    for input in &catalog.mods {
        if title_exists(&pool, input.title.trim()).await? {
            skipped += 1;
            continue;
        }
        let created = mods.create(input).await?;
        info!(mod_id = %created.id, "Inserted {}", created.title);
        inserted += 1;
    }

    for tier in &catalog.tiers {
        upsert_tier(&pool, tier).await?;
    }

    info!("Seeding complete!");
    info!("  Mods inserted: {inserted}");
    info!("  Mods skipped (already exist): {skipped}");
    info!("  Tiers upserted: {}", catalog.tiers.len());
    Ok(())
}

async fn title_exists(pool: &PgPool, title: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM mods WHERE title = $1)")
        .bind(title)
        .fetch_one(pool)
        .await
}

async fn upsert_tier(pool: &PgPool, tier: &TierSeed) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO subscription_tiers
             (name, description, price, duration_days, features, sort_order)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (name) DO UPDATE
         SET description = EXCLUDED.description,
             price = EXCLUDED.price,
             duration_days = EXCLUDED.duration_days,
             features = EXCLUDED.features,
             sort_order = EXCLUDED.sort_order",
    )
    .bind(tier.name.trim())
    .bind(&tier.description)
    .bind(tier.price)
    .bind(tier.duration_days)
    .bind(&tier.features)
    .bind(tier.sort_order)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
mods:
  - title: Tandem Drift Pack
    price: "4.99"
    category: drift
    download_url: https://cdn.modvault.gg/tandem.zip
    version: "1.0.0"
    tags: [jdm, tandem]
tiers:
  - name: Pro
    price: "9.99"
    features: [All subscription mods]
"#;

    #[test]
    fn test_parses_mods_and_tiers() {
        let catalog: CatalogFile = serde_yaml::from_str(CATALOG).unwrap();
        assert_eq!(catalog.mods.len(), 1);
        assert_eq!(catalog.mods[0].tags, vec!["jdm", "tandem"]);
        assert_eq!(catalog.tiers[0].duration_days, 30);
        assert!(validate_catalog(&catalog).is_empty());
    }

    #[test]
    fn test_reports_bad_entries() {
        let yaml = r#"
mods:
  - title: Broken
    price: "1.00"
    category: hovercraft
    download_url: https://cdn.modvault.gg/broken.zip
    version: "1"
tiers:
  - name: Free
    price: "0"
"#;
        let catalog: CatalogFile = serde_yaml::from_str(yaml).unwrap();
        let problems = validate_catalog(&catalog);
        assert_eq!(problems.len(), 2);
        assert!(problems[0].starts_with("mods[0] (Broken)"));
        assert!(problems[1].contains("price must be positive"));
    }
}
