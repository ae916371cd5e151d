//! Priority-ordered route resolution.
//!
//! The whole precedence chain lives in one function so the order can never
//! drift between handlers: first match wins, every input resolves to exactly
//! one [`Route`]. Denylist and attempt gating run before resolution (they
//! decide whether a contact exists at all).

use portero_storage::AuditContext;

use crate::registry::ContactFlows;

/// The single flow variant an inbound message resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `!ping` liveness probe.
    Ping,
    /// Literal `reset`: clear every flow slot for the contact.
    Reset,
    /// Audit context is awaiting a filter number.
    AuditFilterInput,
    /// Blacklist-removal prompt is awaiting a number.
    BlacklistRemovalInput,
    CreateWizard,
    UpdateWizard,
    DeleteWizard,
    /// Blacklist submenu is active; the handler validates the option.
    BlacklistMenu,
    /// Audit menu is active and the input is a single digit 1–9.
    AuditMenu(u8),
    /// `!usuario …` (admin only).
    UserCommand,
    /// `!blacklist …` (admin only).
    BlacklistCommand,
    /// `menu` / `menú`: clear all slots and show the main menu.
    MenuTrigger,
    /// Main numeric menu option 1–10 (only when no flow slot is active).
    MainMenu(u8),
    /// User-management menu is active; the handler validates the option.
    UserMenu,
    /// Unhandled input is absorbed silently.
    Silent,
}

/// Resolve an inbound body against the contact's current state.
/// `body` must already be trimmed.
pub fn resolve(
    body: &str,
    flows: &ContactFlows,
    audit_ctx: Option<&AuditContext>,
    is_admin: bool,
) -> Route {
    if body == "!ping" {
        return Route::Ping;
    }
    if body.eq_ignore_ascii_case("reset") {
        return Route::Reset;
    }
    if audit_ctx.is_some_and(|c| c.awaiting_filter) {
        return Route::AuditFilterInput;
    }
    if flows.blacklist_removal {
        return Route::BlacklistRemovalInput;
    }
    if flows.create.is_some() {
        return Route::CreateWizard;
    }
    if flows.update.is_some() {
        return Route::UpdateWizard;
    }
    if flows.delete.is_some() {
        return Route::DeleteWizard;
    }
    if flows.blacklist_menu {
        return Route::BlacklistMenu;
    }
    if audit_ctx.is_some() && flows.audit_menu {
        if let Some(d) = single_digit(body) {
            return Route::AuditMenu(d);
        }
    }
    if body.starts_with("!usuario") && is_admin {
        return Route::UserCommand;
    }
    if body.starts_with("!blacklist") && is_admin {
        return Route::BlacklistCommand;
    }
    if is_menu_trigger(body) {
        return Route::MenuTrigger;
    }
    if !flows.any_active() && audit_ctx.is_none() {
        if let Some(n) = main_menu_option(body) {
            return Route::MainMenu(n);
        }
    }
    if flows.user_menu {
        return Route::UserMenu;
    }
    Route::Silent
}

/// `menu` / `menú`, any casing.
fn is_menu_trigger(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower == "menu" || lower == "menú"
}

/// Single digit 1–9.
fn single_digit(body: &str) -> Option<u8> {
    let b = body.as_bytes();
    if b.len() == 1 && (b'1'..=b'9').contains(&b[0]) {
        Some(b[0] - b'0')
    } else {
        None
    }
}

/// Main menu accepts 1–9 plus the loosened two-digit `10`.
fn main_menu_option(body: &str) -> Option<u8> {
    if body == "10" {
        return Some(10);
    }
    single_digit(body)
}

/// Digit string of length `min..=max`. The shared number-validation shape
/// used by every flow that collects a phone number.
pub fn digits_between(s: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}
