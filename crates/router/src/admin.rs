//! Contact-administration operations shared by the wizards and the slash
//! commands. User-facing failures are `anyhow` errors carrying the Spanish
//! message; callers render them as `❌ <mensaje>` replies.

use {
    anyhow::{Result, bail},
    portero_common::now_ms,
    portero_storage::{Contact, Role},
    serde_json::json,
    tracing::info,
};

use crate::router::Router;

/// Partial update applied to an existing contact.
#[derive(Debug, Clone, Default)]
pub struct ContactChanges {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

impl ContactChanges {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.role.is_none() && self.active.is_none()
    }
}

impl Router {
    /// Create a contact by explicit admin action. Duplicate numbers fail.
    pub(crate) async fn create_contact_manual(
        &self,
        number: &str,
        name: &str,
        role: Role,
    ) -> Result<Contact> {
        if self.contacts.get(number).await?.is_some() {
            bail!("Usuario ya existe");
        }
        let now = now_ms();
        let contact = self.contacts.create(number, name, role, now).await?;
        self.audit
            .append(
                Some(number),
                "user_create_manual",
                json!({ "number": number, "name": name, "role": role.as_str() }),
                now,
            )
            .await?;
        info!(number, role = role.as_str(), "contact created");
        Ok(contact)
    }

    /// Apply a partial update, auditing before/after.
    pub(crate) async fn update_contact(
        &self,
        number: &str,
        changes: ContactChanges,
    ) -> Result<Contact> {
        if changes.is_empty() {
            bail!("Nada que actualizar");
        }
        let Some(mut contact) = self.contacts.get(number).await? else {
            bail!("Usuario no encontrado");
        };
        let before = json!({
            "name": contact.name,
            "role": contact.role.as_str(),
            "active": contact.active,
        });
        if let Some(name) = changes.name {
            contact.name = name;
        }
        if let Some(role) = changes.role {
            contact.role = role;
        }
        if let Some(active) = changes.active {
            contact.active = active;
        }
        self.contacts.update(&contact).await?;
        let after = json!({
            "name": contact.name,
            "role": contact.role.as_str(),
            "active": contact.active,
        });
        self.audit
            .append(
                Some(number),
                "user_update",
                json!({ "before": before, "after": after }),
                now_ms(),
            )
            .await?;
        Ok(contact)
    }

    /// Move a contact to a new number. The new number must be free.
    pub(crate) async fn rename_contact_number(
        &self,
        old_number: &str,
        new_number: &str,
    ) -> Result<Contact> {
        if self.contacts.get(new_number).await?.is_some() {
            bail!("El nuevo número ya existe");
        }
        let Some(mut contact) = self.contacts.get(old_number).await? else {
            bail!("Usuario no encontrado");
        };
        contact.number = new_number.to_string();
        self.contacts.update(&contact).await?;
        self.audit
            .append(
                Some(new_number),
                "user_update_phone",
                json!({ "before": { "number": old_number }, "after": { "number": new_number } }),
                now_ms(),
            )
            .await?;
        Ok(contact)
    }

    pub(crate) async fn delete_contact(&self, number: &str) -> Result<()> {
        if !self.contacts.delete(number).await? {
            bail!("Usuario no encontrado");
        }
        self.audit
            .append(
                Some(number),
                "user_delete",
                json!({ "number": number }),
                now_ms(),
            )
            .await?;
        info!(number, "contact deleted");
        Ok(())
    }

    /// Remove a number from the denylist. Returns whether an entry existed;
    /// removal of an absent number is not an error here (the interactive
    /// flow tolerates it), the slash command reports it to the admin.
    pub(crate) async fn remove_denylist(&self, number: &str) -> Result<bool> {
        let removed = self.denylist.remove(number).await?;
        if removed {
            self.audit
                .append(
                    None,
                    "denylist_remove",
                    json!({ "number": number }),
                    now_ms(),
                )
                .await?;
            info!(number, "denylist entry removed");
        }
        Ok(removed)
    }
}
