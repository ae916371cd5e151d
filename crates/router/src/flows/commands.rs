//! `!usuario` and `!blacklist` slash commands (admin only).
//!
//! Errors surface as `❌ <mensaje>` replies; unknown subcommands get the
//! help/usage text.

use {
    anyhow::{Result, bail},
    portero_channels::InboundMessage,
    portero_storage::{Contact, Role},
};

use crate::{admin::ContactChanges, menus, router::Router};

impl Router {
    pub(crate) async fn user_command(
        &self,
        msg: &InboundMessage,
        contact: &Contact,
        body: &str,
        _now: i64,
    ) -> Result<()> {
        let number = &contact.number;
        let parts: Vec<&str> = body.split_whitespace().skip(1).collect();
        let text = match self.run_user_command(&parts).await {
            Ok(text) => text,
            Err(e) => format!("❌ {e}"),
        };
        self.reply(&msg.from, number, &text).await
    }

    async fn run_user_command(&self, parts: &[&str]) -> Result<String> {
        match parts.first().copied() {
            Some("alta") => {
                let (Some(new_number), Some(name), Some(role)) =
                    (parts.get(1), parts.get(2), parts.get(3))
                else {
                    bail!("Uso: !usuario alta <numero> <nombre> <admin|normal>");
                };
                let role = if *role == "admin" { Role::Admin } else { Role::Normal };
                self.create_contact_manual(new_number, name, role).await?;
                Ok("✅ Usuario creado".to_string())
            },
            Some("listar") => {
                let all = self.contacts.list().await?;
                if all.is_empty() {
                    Ok("No hay usuarios".to_string())
                } else {
                    Ok(all.iter().map(menus::contact_line).collect::<Vec<_>>().join("\n"))
                }
            },
            Some("actualizar") => {
                let Some(target) = parts.get(1) else {
                    bail!(
                        "Uso: !usuario actualizar <numero> [nombre=..] [rol=admin|normal] [activo=true|false]"
                    );
                };
                let changes = parse_update_tokens(&parts[2..]);
                self.update_contact(target, changes).await?;
                Ok("✅ Usuario actualizado".to_string())
            },
            Some("borrar") => {
                let Some(target) = parts.get(1) else {
                    bail!("Uso: !usuario borrar <numero>");
                };
                self.delete_contact(target).await?;
                Ok("✅ Usuario borrado".to_string())
            },
            _ => Ok(menus::user_admin_help().to_string()),
        }
    }

    pub(crate) async fn blacklist_command(
        &self,
        msg: &InboundMessage,
        contact: &Contact,
        body: &str,
        _now: i64,
    ) -> Result<()> {
        let number = &contact.number;
        let parts: Vec<&str> = body.split_whitespace().skip(1).collect();
        let text = match parts.first().copied() {
            Some("listar") => {
                let entries = self.denylist.list().await?;
                if entries.is_empty() {
                    "Blacklist vacía".to_string()
                } else {
                    let numbers: Vec<&str> = entries.iter().map(|e| e.number.as_str()).collect();
                    format!("*Blacklist*\n{}", numbers.join("\n"))
                }
            },
            Some("remover") => match parts.get(1) {
                Some(target) => {
                    if self.remove_denylist(target).await? {
                        "✅ Número removido del blacklist".to_string()
                    } else {
                        "❌ Número no está en blacklist".to_string()
                    }
                },
                None => "❌ Uso: !blacklist remover <numero>".to_string(),
            },
            _ => "Comandos: !blacklist listar | !blacklist remover <numero>".to_string(),
        };
        self.reply(&msg.from, number, &text).await
    }
}

/// `nombre=..`, `rol=admin|normal`, `activo=true|false`; unknown keys are
/// ignored.
fn parse_update_tokens(tokens: &[&str]) -> ContactChanges {
    let mut changes = ContactChanges::default();
    for token in tokens {
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };
        match key {
            "nombre" => changes.name = Some(value.to_string()),
            "rol" => {
                changes.role = Some(if value == "admin" { Role::Admin } else { Role::Normal });
            },
            "activo" => changes.active = Some(value == "true"),
            _ => {},
        }
    }
    changes
}
