//! User-management flows: the interactive menu, the search prompt, and the
//! create/update/delete wizards.
//!
//! Every step re-checks the sender's role; a revoked admin aborts the flow.
//! Invalid input repeats the current step instead of aborting.

use {
    anyhow::Result,
    portero_channels::InboundMessage,
    portero_storage::{Contact, Role},
};

use crate::{
    admin::ContactChanges,
    menus,
    registry::{CreateState, CreateStep, DeleteState, DeleteStep, UpdateAttr, UpdatePhase, UpdateState},
    route::digits_between,
    router::Router,
};

fn is_cancel(body: &str) -> bool {
    body == "0" || body.eq_ignore_ascii_case("cancelar")
}

/// `si` / `sí` / `no`, lowercased; `None` for anything else.
fn parse_yes_no(body: &str) -> Option<bool> {
    match body.to_lowercase().as_str() {
        "si" | "sí" => Some(true),
        "no" => Some(false),
        _ => None,
    }
}

impl Router {
    pub(crate) async fn user_menu_option(
        &self,
        msg: &InboundMessage,
        contact: &Contact,
        body: &str,
        _now: i64,
    ) -> Result<()> {
        let number = &contact.number;
        if !contact.is_admin() {
            return self.deny_unauthorized(msg, number).await;
        }

        // Search prompt in progress consumes the input first.
        if self.flows.get(number).search {
            return self.search_input(msg, number, body).await;
        }

        match body {
            "1" => {
                self.flows
                    .update(number, |f| f.create = Some(CreateState::default()));
                self.reply(
                    &msg.from,
                    number,
                    "📞 Ingresa el número de teléfono (solo dígitos) o 0 para cancelar:",
                )
                .await
            },
            "2" => {
                let all = self.contacts.list().await?;
                let listing = if all.is_empty() {
                    "No hay usuarios".to_string()
                } else {
                    all.iter().map(menus::contact_line).collect::<Vec<_>>().join("\n")
                };
                self.reply(&msg.from, number, &listing).await?;
                self.reply(&msg.from, number, menus::user_menu()).await
            },
            "3" => {
                self.flows
                    .update(number, |f| f.update = Some(UpdateState::default()));
                self.reply(
                    &msg.from,
                    number,
                    "Ingresa el número del usuario a actualizar o 0 para cancelar:",
                )
                .await
            },
            "4" => {
                self.flows
                    .update(number, |f| f.delete = Some(DeleteState::default()));
                self.reply(
                    &msg.from,
                    number,
                    "Ingresa el número del usuario a borrar o 0 para cancelar:",
                )
                .await
            },
            "5" => {
                self.flows.update(number, |f| f.search = true);
                self.reply(&msg.from, number, "🔍 Ingresa texto / número a buscar (0 cancelar):")
                    .await
            },
            "6" => {
                self.flows.update(number, |f| f.user_menu = false);
                self.reply(&msg.from, number, &menus::main_menu(contact.is_admin()))
                    .await
            },
            _ => self.reply(&msg.from, number, "Opción inválida. Usa 1-6.").await,
        }
    }

    /// Single free-text search phase; always exits back to the menu.
    async fn search_input(&self, msg: &InboundMessage, number: &str, body: &str) -> Result<()> {
        if is_cancel(body) {
            self.flows.update(number, |f| f.search = false);
            self.reply(&msg.from, number, "Búsqueda cancelada.").await?;
            return self.reply(&msg.from, number, menus::user_menu()).await;
        }
        let results = self.contacts.search(body).await?;
        let listing = if results.is_empty() {
            "Sin coincidencias".to_string()
        } else {
            results.iter().map(menus::contact_line).collect::<Vec<_>>().join("\n")
        };
        self.flows.update(number, |f| f.search = false);
        self.reply(&msg.from, number, &listing).await?;
        self.reply(&msg.from, number, menus::user_menu()).await
    }

    pub(crate) async fn create_wizard(
        &self,
        msg: &InboundMessage,
        contact: &Contact,
        body: &str,
        _now: i64,
    ) -> Result<()> {
        let number = &contact.number;
        if !contact.is_admin() {
            return self.deny_unauthorized(msg, number).await;
        }
        if is_cancel(body) {
            self.flows.update(number, |f| f.create = None);
            self.reply(&msg.from, number, "Operación cancelada.").await?;
            return self.reply(&msg.from, number, menus::user_menu()).await;
        }

        let Some(state) = self.flows.get(number).create else {
            return Ok(());
        };
        match state.step {
            CreateStep::Number => {
                if !digits_between(body, 8, 15) {
                    return self
                        .reply(&msg.from, number, "Número inválido. Debe tener 8-15 dígitos.")
                        .await;
                }
                if self.contacts.get(body).await?.is_some() {
                    return self
                        .reply(&msg.from, number, "Ese número ya existe, ingresa otro.")
                        .await;
                }
                self.flows.update(number, |f| {
                    f.create = Some(CreateState {
                        step: CreateStep::Name,
                        number: Some(body.to_string()),
                        name: None,
                    });
                });
                self.reply(&msg.from, number, "📛 Ingresa el nombre de usuario:").await
            },
            CreateStep::Name => {
                if body.chars().count() < 2 {
                    return self.reply(&msg.from, number, "Nombre muy corto.").await;
                }
                self.flows.update(number, |f| {
                    f.create = Some(CreateState {
                        step: CreateStep::Role,
                        number: state.number.clone(),
                        name: Some(body.to_string()),
                    });
                });
                self.reply(&msg.from, number, "👮 ¿Será usuario administrador? (si/no)")
                    .await
            },
            CreateStep::Role => {
                let Some(admin) = parse_yes_no(body) else {
                    return self.reply(&msg.from, number, "Responde si o no.").await;
                };
                let role = if admin { Role::Admin } else { Role::Normal };
                let new_number = state.number.as_deref().unwrap_or_default();
                let new_name = state.name.as_deref().unwrap_or_default();
                let text = match self.create_contact_manual(new_number, new_name, role).await {
                    Ok(_) => "✅ Usuario creado.".to_string(),
                    Err(e) => format!("❌ Error: {e}"),
                };
                self.flows.update(number, |f| f.create = None);
                self.reply(&msg.from, number, &text).await?;
                self.reply(&msg.from, number, menus::user_menu()).await
            },
        }
    }

    pub(crate) async fn update_wizard(
        &self,
        msg: &InboundMessage,
        contact: &Contact,
        body: &str,
        _now: i64,
    ) -> Result<()> {
        let number = &contact.number;
        if !contact.is_admin() {
            return self.deny_unauthorized(msg, number).await;
        }
        if is_cancel(body) {
            self.flows.update(number, |f| f.update = None);
            self.reply(&msg.from, number, "Operación cancelada.").await?;
            return self.reply(&msg.from, number, menus::user_menu()).await;
        }

        let Some(state) = self.flows.get(number).update else {
            return Ok(());
        };
        match state.phase {
            UpdatePhase::AskNumber => {
                if !digits_between(body, 8, 15) {
                    return self.reply(&msg.from, number, "Número inválido.").await;
                }
                if self.contacts.get(body).await?.is_none() {
                    return self
                        .reply(&msg.from, number, "No existe ese usuario. Ingresa otro o 0 para cancelar.")
                        .await;
                }
                self.flows.update(number, |f| {
                    f.update = Some(UpdateState {
                        phase: UpdatePhase::AttrMenu,
                        number: Some(body.to_string()),
                        attr: None,
                    });
                });
                self.reply(
                    &msg.from,
                    number,
                    "¿Qué deseas modificar?\n1️⃣ Nombre\n2️⃣ Rol\n3️⃣ Activo (toggle)\n4️⃣ Teléfono",
                )
                .await
            },
            UpdatePhase::AttrMenu => self.update_attr_menu(msg, number, &state, body).await,
            UpdatePhase::AttrValue => self.update_attr_value(msg, number, &state, body).await,
            UpdatePhase::AttrPhone => {
                if !digits_between(body, 8, 15) {
                    return self.reply(&msg.from, number, "Número inválido.").await;
                }
                let target = state.number.as_deref().unwrap_or_default();
                let text = match self.rename_contact_number(target, body).await {
                    Ok(_) => "Número actualizado.".to_string(),
                    Err(e) => format!("❌ Error: {e}"),
                };
                self.flows.update(number, |f| f.update = None);
                self.reply(&msg.from, number, &text).await?;
                self.reply(&msg.from, number, menus::user_menu()).await
            },
        }
    }

    async fn update_attr_menu(
        &self,
        msg: &InboundMessage,
        number: &str,
        state: &UpdateState,
        body: &str,
    ) -> Result<()> {
        let target = state.number.clone();
        match body {
            "1" => {
                self.flows.update(number, |f| {
                    f.update = Some(UpdateState {
                        phase: UpdatePhase::AttrValue,
                        number: target,
                        attr: Some(UpdateAttr::Name),
                    });
                });
                self.reply(&msg.from, number, "Nuevo nombre:").await
            },
            "2" => {
                self.flows.update(number, |f| {
                    f.update = Some(UpdateState {
                        phase: UpdatePhase::AttrValue,
                        number: target,
                        attr: Some(UpdateAttr::Role),
                    });
                });
                self.reply(&msg.from, number, "Nuevo rol (admin/normal):").await
            },
            "3" => {
                // Immediate toggle, no value step.
                let target = target.unwrap_or_default();
                let text = match self.contacts.get(&target).await? {
                    Some(c) => {
                        let changes = ContactChanges {
                            active: Some(!c.active),
                            ..ContactChanges::default()
                        };
                        match self.update_contact(&target, changes).await {
                            Ok(updated) => format!("Estado activo ahora: {}", updated.active),
                            Err(e) => format!("❌ Error: {e}"),
                        }
                    },
                    None => "Usuario no encontrado".to_string(),
                };
                self.flows.update(number, |f| f.update = None);
                self.reply(&msg.from, number, &text).await?;
                self.reply(&msg.from, number, menus::user_menu()).await
            },
            "4" => {
                self.flows.update(number, |f| {
                    f.update = Some(UpdateState {
                        phase: UpdatePhase::AttrPhone,
                        number: target,
                        attr: None,
                    });
                });
                self.reply(&msg.from, number, "Nuevo número (8-15 dígitos):").await
            },
            _ => self.reply(&msg.from, number, "Selecciona 1-4.").await,
        }
    }

    async fn update_attr_value(
        &self,
        msg: &InboundMessage,
        number: &str,
        state: &UpdateState,
        body: &str,
    ) -> Result<()> {
        let target = state.number.as_deref().unwrap_or_default();
        let text = match state.attr {
            Some(UpdateAttr::Name) => {
                if body.chars().count() < 2 {
                    return self.reply(&msg.from, number, "Nombre muy corto.").await;
                }
                let changes = ContactChanges {
                    name: Some(body.to_string()),
                    ..ContactChanges::default()
                };
                match self.update_contact(target, changes).await {
                    Ok(_) => "Nombre actualizado.".to_string(),
                    Err(e) => format!("❌ Error: {e}"),
                }
            },
            Some(UpdateAttr::Role) => {
                let Some(role) = Role::parse(&body.to_lowercase()) else {
                    return self
                        .reply(&msg.from, number, "Valor inválido. Usa admin o normal.")
                        .await;
                };
                let changes = ContactChanges {
                    role: Some(role),
                    ..ContactChanges::default()
                };
                match self.update_contact(target, changes).await {
                    Ok(_) => "Rol actualizado.".to_string(),
                    Err(e) => format!("❌ Error: {e}"),
                }
            },
            None => return Ok(()),
        };
        self.flows.update(number, |f| f.update = None);
        self.reply(&msg.from, number, &text).await?;
        self.reply(&msg.from, number, menus::user_menu()).await
    }

    pub(crate) async fn delete_wizard(
        &self,
        msg: &InboundMessage,
        contact: &Contact,
        body: &str,
        _now: i64,
    ) -> Result<()> {
        let number = &contact.number;
        if !contact.is_admin() {
            return self.deny_unauthorized(msg, number).await;
        }
        if is_cancel(body) {
            self.flows.update(number, |f| f.delete = None);
            self.reply(&msg.from, number, "Operación cancelada.").await?;
            return self.reply(&msg.from, number, menus::user_menu()).await;
        }

        let Some(state) = self.flows.get(number).delete else {
            return Ok(());
        };
        match state.step {
            DeleteStep::Number => {
                if !digits_between(body, 8, 15) {
                    return self.reply(&msg.from, number, "Número inválido.").await;
                }
                if self.contacts.get(body).await?.is_none() {
                    return self
                        .reply(&msg.from, number, "No existe ese usuario. Ingresa otro o 0 para cancelar.")
                        .await;
                }
                self.flows.update(number, |f| {
                    f.delete = Some(DeleteState {
                        step: DeleteStep::Confirm,
                        number: Some(body.to_string()),
                    });
                });
                self.reply(&msg.from, number, "Confirma eliminación (si/no):").await
            },
            DeleteStep::Confirm => {
                let Some(confirmed) = parse_yes_no(body) else {
                    return self.reply(&msg.from, number, "Responde si o no.").await;
                };
                let text = if confirmed {
                    let target = state.number.as_deref().unwrap_or_default();
                    match self.delete_contact(target).await {
                        Ok(()) => "✅ Usuario eliminado.".to_string(),
                        Err(e) => format!("❌ Error: {e}"),
                    }
                } else {
                    "Eliminación cancelada.".to_string()
                };
                self.flows.update(number, |f| f.delete = None);
                self.reply(&msg.from, number, &text).await?;
                self.reply(&msg.from, number, menus::user_menu()).await
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{is_cancel, parse_yes_no};

    #[test]
    fn cancel_accepts_zero_and_keyword() {
        assert!(is_cancel("0"));
        assert!(is_cancel("cancelar"));
        assert!(is_cancel("CANCELAR"));
        assert!(!is_cancel("00"));
        assert!(!is_cancel("cancel"));
    }

    #[test]
    fn yes_no_accepts_accented_si() {
        assert_eq!(parse_yes_no("si"), Some(true));
        assert_eq!(parse_yes_no("Sí"), Some(true));
        assert_eq!(parse_yes_no("NO"), Some(false));
        assert_eq!(parse_yes_no("tal vez"), None);
    }
}
