//! Interactive blacklist submenu and the removal prompt.

use {anyhow::Result, portero_channels::InboundMessage, portero_storage::Contact};

use crate::{menus, route::digits_between, router::Router};

impl Router {
    pub(crate) async fn blacklist_menu_option(
        &self,
        msg: &InboundMessage,
        contact: &Contact,
        body: &str,
    ) -> Result<()> {
        let number = &contact.number;
        if !contact.is_admin() {
            return self.deny_unauthorized(msg, number).await;
        }
        match body {
            "1" => {
                let entries = self.denylist.list().await?;
                let listing = if entries.is_empty() {
                    "Blacklist vacía".to_string()
                } else {
                    let lines: Vec<String> = entries
                        .iter()
                        .map(|e| {
                            if e.active {
                                e.number.clone()
                            } else {
                                format!("{} (inactivo)", e.number)
                            }
                        })
                        .collect();
                    format!("*Blacklist*\n{}", lines.join("\n"))
                };
                self.reply(&msg.from, number, &listing).await?;
                self.reply(&msg.from, number, menus::blacklist_menu()).await
            },
            "2" => {
                self.flows.update(number, |f| f.blacklist_removal = true);
                self.reply(&msg.from, number, "Envía el número a remover o 0 para cancelar.")
                    .await
            },
            "3" => {
                self.flows.update(number, |f| f.blacklist_menu = false);
                self.reply(&msg.from, number, &menus::main_menu(contact.is_admin()))
                    .await
            },
            _ => self.reply(&msg.from, number, "Opción inválida. Usa 1,2,3.").await,
        }
    }

    /// Removal prompt. Absent numbers are tolerated here; only the slash
    /// command treats them as an error.
    pub(crate) async fn blacklist_removal_input(
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
        if body == "0" {
            self.flows.update(number, |f| f.blacklist_removal = false);
            self.reply(&msg.from, number, "Operación cancelada.").await?;
            return self.reply(&msg.from, number, menus::blacklist_menu()).await;
        }
        if !digits_between(body, 5, 15) {
            return self
                .reply(&msg.from, number, "Formato inválido. Envía solo dígitos o 0 para cancelar.")
                .await;
        }
        self.remove_denylist(body).await?;
        self.flows.update(number, |f| f.blacklist_removal = false);
        self.reply(&msg.from, number, "✅ Número removido (si existía)").await?;
        self.reply(&msg.from, number, menus::blacklist_menu()).await
    }
}
