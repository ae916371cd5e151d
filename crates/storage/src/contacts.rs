use {anyhow::Result, sqlx::SqlitePool};

use crate::models::{Contact, Role};

/// Internal row type for sqlx mapping.
#[derive(sqlx::FromRow)]
struct ContactRow {
    id: i64,
    number: String,
    name: String,
    role: String,
    active: bool,
    registered_at: i64,
}

impl From<ContactRow> for Contact {
    fn from(r: ContactRow) -> Self {
        Self {
            id: r.id,
            number: r.number,
            name: r.name,
            // The column carries a CHECK constraint; fall back defensively.
            role: Role::parse(&r.role).unwrap_or(Role::Normal),
            active: r.active,
            registered_at: r.registered_at,
        }
    }
}

/// SQLite-backed contact store.
#[derive(Clone)]
pub struct ContactStore {
    pool: SqlitePool,
}

impl ContactStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, number: &str) -> Result<Option<Contact>> {
        let row = sqlx::query_as::<_, ContactRow>("SELECT * FROM contacts WHERE number = ?")
            .bind(number)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    pub async fn list(&self) -> Result<Vec<Contact>> {
        let rows = sqlx::query_as::<_, ContactRow>("SELECT * FROM contacts ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Case-sensitive substring search over number and name.
    pub async fn search(&self, query: &str) -> Result<Vec<Contact>> {
        let rows = sqlx::query_as::<_, ContactRow>(
            "SELECT * FROM contacts WHERE instr(number, ?1) > 0 OR instr(name, ?1) > 0 ORDER BY id",
        )
        .bind(query)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Insert a new contact. Fails on a duplicate number (UNIQUE constraint);
    /// callers check for duplicates first to produce a friendlier message.
    pub async fn create(&self, number: &str, name: &str, role: Role, now: i64) -> Result<Contact> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO contacts (number, name, role, active, registered_at)
               VALUES (?, ?, ?, 1, ?)
               RETURNING id"#,
        )
        .bind(number)
        .bind(name)
        .bind(role.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(Contact {
            id,
            number: number.to_string(),
            name: name.to_string(),
            role,
            active: true,
            registered_at: now,
        })
    }

    /// Persist every mutable field of an existing contact, by id.
    pub async fn update(&self, contact: &Contact) -> Result<()> {
        sqlx::query("UPDATE contacts SET number = ?, name = ?, role = ?, active = ? WHERE id = ?")
            .bind(&contact.number)
            .bind(&contact.name)
            .bind(contact.role.as_str())
            .bind(contact.active)
            .bind(contact.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, number: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM contacts WHERE number = ?")
            .bind(number)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> ContactStore {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::init(&pool).await.unwrap();
        ContactStore::new(pool)
    }

    #[tokio::test]
    async fn create_and_get() {
        let store = store().await;
        let c = store
            .create("5215511111111", "Juan", Role::Admin, 1000)
            .await
            .unwrap();
        assert!(c.id > 0);
        let found = store.get("5215511111111").await.unwrap().unwrap();
        assert_eq!(found.name, "Juan");
        assert!(found.is_admin());
        assert!(found.active);
    }

    #[tokio::test]
    async fn duplicate_number_rejected_by_schema() {
        let store = store().await;
        store.create("5215511111111", "a", Role::Normal, 0).await.unwrap();
        assert!(store.create("5215511111111", "b", Role::Normal, 0).await.is_err());
    }

    #[tokio::test]
    async fn update_persists_all_fields() {
        let store = store().await;
        let mut c = store.create("111", "Ana", Role::Normal, 0).await.unwrap();
        c.name = "Ana María".into();
        c.role = Role::Admin;
        c.active = false;
        c.number = "222".into();
        store.update(&c).await.unwrap();

        assert!(store.get("111").await.unwrap().is_none());
        let updated = store.get("222").await.unwrap().unwrap();
        assert_eq!(updated.name, "Ana María");
        assert_eq!(updated.role, Role::Admin);
        assert!(!updated.active);
    }

    #[tokio::test]
    async fn search_is_case_sensitive_substring() {
        let store = store().await;
        store.create("5215511111111", "Juan Pérez", Role::Normal, 0).await.unwrap();
        store.create("5215522222222", "maria", Role::Normal, 0).await.unwrap();

        assert_eq!(store.search("Juan").await.unwrap().len(), 1);
        assert_eq!(store.search("juan").await.unwrap().len(), 0);
        assert_eq!(store.search("55222").await.unwrap().len(), 1);
        assert!(store.search("nadie").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_reports_whether_row_existed() {
        let store = store().await;
        store.create("111", "x", Role::Normal, 0).await.unwrap();
        assert!(store.delete("111").await.unwrap());
        assert!(!store.delete("111").await.unwrap());
    }
}
