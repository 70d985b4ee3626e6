//! Tenant users

use iview_common::auth::{hash_password, validate_password};
use iview_common::db::{Role, User};
use iview_common::{time, Result};
use sqlx::SqlitePool;

use super::new_id;

pub async fn create(
    db: &SqlitePool,
    tenant_id: &str,
    email: &str,
    display_name: &str,
    role: Role,
    password: &str,
) -> Result<User> {
    validate_password(password)?;
    let (hash, salt) = hash_password(password);

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users
            (id, tenant_id, email, display_name, role, password_hash, password_salt, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(new_id())
    .bind(tenant_id)
    .bind(email.trim().to_lowercase())
    .bind(display_name)
    .bind(role)
    .bind(hash)
    .bind(salt)
    .bind(time::now())
    .fetch_one(db)
    .await?;

    Ok(user)
}

pub async fn find_by_email(db: &SqlitePool, tenant_id: &str, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE tenant_id = ? AND email = ?")
        .bind(tenant_id)
        .bind(email.trim().to_lowercase())
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn find(db: &SqlitePool, tenant_id: &str, id: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE tenant_id = ? AND id = ?")
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tenants;
    use iview_common::auth::verify_password;
    use iview_common::db::connect_in_memory;

    #[tokio::test]
    async fn test_email_unique_per_tenant_and_lowercased() {
        let db = connect_in_memory().await.unwrap();
        let acme = tenants::create(&db, "acme", "Acme").await.unwrap();
        let globex = tenants::create(&db, "globex", "Globex").await.unwrap();

        let user = create(&db, &acme.id, "Grace@Acme.test", "Grace", Role::Hr, "correct horse")
            .await
            .unwrap();
        assert_eq!(user.email, "grace@acme.test");
        assert!(verify_password("correct horse", &user.password_salt, &user.password_hash));

        assert!(create(&db, &acme.id, "grace@acme.test", "Dup", Role::Hr, "correct horse")
            .await
            .is_err());
        assert!(create(&db, &globex.id, "grace@acme.test", "Other", Role::Admin, "correct horse")
            .await
            .is_ok());

        let found = find_by_email(&db, &acme.id, "GRACE@acme.test").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let db = connect_in_memory().await.unwrap();
        let acme = tenants::create(&db, "acme", "Acme").await.unwrap();
        let result = create(&db, &acme.id, "a@acme.test", "A", Role::Employer, "short").await;
        assert!(matches!(result, Err(iview_common::Error::InvalidInput(_))));
    }
}
