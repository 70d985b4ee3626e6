//! Tenant lookups and creation

use iview_common::db::Tenant;
use iview_common::{time, Result};
use sqlx::SqlitePool;

use super::new_id;

pub async fn find_by_slug(db: &SqlitePool, slug: &str) -> Result<Option<Tenant>> {
    let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE slug = ?")
        .bind(slug)
        .fetch_optional(db)
        .await?;
    Ok(tenant)
}

pub async fn find_by_id(db: &SqlitePool, id: &str) -> Result<Option<Tenant>> {
    let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(tenant)
}

/// Match a request `Host` (port stripped, case-insensitive) to a custom domain
pub async fn find_by_domain(db: &SqlitePool, host: &str) -> Result<Option<Tenant>> {
    let domain = host.split(':').next().unwrap_or(host).to_lowercase();
    let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE custom_domain = ?")
        .bind(domain)
        .fetch_optional(db)
        .await?;
    Ok(tenant)
}

/// Slugs are `[a-z0-9-]{2,63}` and may not start or end with `-`
pub fn is_valid_slug(slug: &str) -> bool {
    (2..=63).contains(&slug.len())
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
}

pub async fn create(db: &SqlitePool, slug: &str, name: &str) -> Result<Tenant> {
    if !is_valid_slug(slug) {
        return Err(iview_common::Error::InvalidInput(format!(
            "invalid tenant slug '{}'",
            slug
        )));
    }

    let tenant = sqlx::query_as::<_, Tenant>(
        r#"
        INSERT INTO tenants (id, slug, name, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(slug)
    .bind(name)
    .bind(time::now())
    .fetch_one(db)
    .await?;

    Ok(tenant)
}

/// Theme fields; `None` leaves a field unchanged
#[derive(Debug, Default, Clone)]
pub struct ThemeUpdate {
    pub primary_color: Option<String>,
    pub accent_color: Option<String>,
    pub logo_url: Option<String>,
    pub custom_domain: Option<String>,
}

/// `#rrggbb`
fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_valid_domain(value: &str) -> bool {
    value.contains('.')
        && !value.starts_with('.')
        && !value.ends_with('.')
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.')
}

impl ThemeUpdate {
    pub fn is_empty(&self) -> bool {
        self.primary_color.is_none()
            && self.accent_color.is_none()
            && self.logo_url.is_none()
            && self.custom_domain.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(iview_common::Error::InvalidInput(msg));

        let colors = [
            ("primary_color", &self.primary_color),
            ("accent_color", &self.accent_color),
        ];
        for (field, color) in colors {
            if let Some(color) = color {
                if !is_hex_color(color) {
                    return invalid(format!("{} must look like #1a2b3c, got '{}'", field, color));
                }
            }
        }
        if let Some(url) = &self.logo_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return invalid(format!("logo_url must be an http(s) URL, got '{}'", url));
            }
        }
        if let Some(domain) = &self.custom_domain {
            if !is_valid_domain(domain) {
                return invalid(format!("invalid custom domain '{}'", domain));
            }
        }
        Ok(())
    }
}

/// Validate and apply; `Ok(None)` when no tenant has `id`
pub async fn update_theme(
    db: &SqlitePool,
    id: &str,
    update: &ThemeUpdate,
) -> Result<Option<Tenant>> {
    update.validate()?;

    let tenant = sqlx::query_as::<_, Tenant>(
        r#"
        UPDATE tenants SET
            theme_primary_color = COALESCE(?, theme_primary_color),
            theme_accent_color = COALESCE(?, theme_accent_color),
            logo_url = COALESCE(?, logo_url),
            custom_domain = COALESCE(lower(?), custom_domain)
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(&update.primary_color)
    .bind(&update.accent_color)
    .bind(&update.logo_url)
    .bind(&update.custom_domain)
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(tenant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use iview_common::db::connect_in_memory;

    #[test]
    fn test_slug_rules() {
        assert!(is_valid_slug("acme"));
        assert!(is_valid_slug("acme-corp-2"));
        assert!(!is_valid_slug("a"));
        assert!(!is_valid_slug("Acme"));
        assert!(!is_valid_slug("-acme"));
        assert!(!is_valid_slug("acme_corp"));
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = connect_in_memory().await.unwrap();
        let tenant = create(&db, "acme", "Acme Inc").await.unwrap();

        let by_slug = find_by_slug(&db, "acme").await.unwrap().unwrap();
        assert_eq!(by_slug.id, tenant.id);
        assert!(find_by_slug(&db, "other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_custom_domain_lookup_ignores_port_and_case() {
        let db = connect_in_memory().await.unwrap();
        let tenant = create(&db, "acme", "Acme Inc").await.unwrap();
        update_theme(
            &db,
            &tenant.id,
            &ThemeUpdate {
                custom_domain: Some("Jobs.Acme.test".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let found = find_by_domain(&db, "JOBS.acme.test:8443").await.unwrap();
        assert_eq!(found.map(|t| t.id), Some(tenant.id));
    }

    #[tokio::test]
    async fn test_update_theme_merges_fields() {
        let db = connect_in_memory().await.unwrap();
        let tenant = create(&db, "acme", "Acme Inc").await.unwrap();

        let themed = update_theme(
            &db,
            &tenant.id,
            &ThemeUpdate {
                primary_color: Some("#1A2B3C".to_string()),
                logo_url: Some("https://cdn.acme.test/logo.png".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(themed.theme_primary_color.as_deref(), Some("#1A2B3C"));

        let accented = update_theme(
            &db,
            &tenant.id,
            &ThemeUpdate {
                accent_color: Some("#ffffff".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(accented.theme_primary_color.as_deref(), Some("#1A2B3C"));
        assert_eq!(accented.theme_accent_color.as_deref(), Some("#ffffff"));
        assert_eq!(accented.logo_url.as_deref(), Some("https://cdn.acme.test/logo.png"));

        assert!(update_theme(&db, "missing", &ThemeUpdate::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_theme_rejects_bad_values() {
        let db = connect_in_memory().await.unwrap();
        let tenant = create(&db, "acme", "Acme Inc").await.unwrap();

        let bad = [
            ThemeUpdate {
                primary_color: Some("red".to_string()),
                ..Default::default()
            },
            ThemeUpdate {
                accent_color: Some("#12345g".to_string()),
                ..Default::default()
            },
            ThemeUpdate {
                logo_url: Some("javascript:alert(1)".to_string()),
                ..Default::default()
            },
            ThemeUpdate {
                custom_domain: Some("jobs acme".to_string()),
                ..Default::default()
            },
        ];
        for update in &bad {
            let err = update_theme(&db, &tenant.id, update).await.unwrap_err();
            assert!(matches!(err, iview_common::Error::InvalidInput(_)));
        }

        let unchanged = find_by_id(&db, &tenant.id).await.unwrap().unwrap();
        assert!(unchanged.theme_primary_color.is_none());
        assert!(unchanged.custom_domain.is_none());
    }
}
