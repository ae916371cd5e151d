//! Ephemeral per-contact flow state.
//!
//! An explicit keyed store of tagged flow slots, one slot family per flow
//! type. State lives only in process memory: a restart legitimately drops
//! in-flight menus and wizards. Message handling is run-to-completion per
//! inbound event, so a plain mutex around the map is enough.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

/// Create-user wizard position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CreateStep {
    #[default]
    Number,
    Name,
    Role,
}

#[derive(Debug, Clone, Default)]
pub struct CreateState {
    pub step: CreateStep,
    pub number: Option<String>,
    pub name: Option<String>,
}

/// Update-user wizard position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdatePhase {
    #[default]
    AskNumber,
    AttrMenu,
    AttrValue,
    AttrPhone,
}

/// Attribute collected in the `AttrValue` phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAttr {
    Name,
    Role,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateState {
    pub phase: UpdatePhase,
    pub number: Option<String>,
    pub attr: Option<UpdateAttr>,
}

/// Delete-user wizard position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeleteStep {
    #[default]
    Number,
    Confirm,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteState {
    pub step: DeleteStep,
    pub number: Option<String>,
}

/// All flow slots for one contact. A contact can hold an ephemeral menu flag
/// and a wizard state at the same time; the router's precedence order
/// resolves the ambiguity deterministically.
#[derive(Debug, Clone, Default)]
pub struct ContactFlows {
    pub blacklist_menu: bool,
    pub blacklist_removal: bool,
    pub audit_menu: bool,
    pub user_menu: bool,
    pub search: bool,
    pub create: Option<CreateState>,
    pub update: Option<UpdateState>,
    pub delete: Option<DeleteState>,
}

impl ContactFlows {
    /// True when any slot is occupied; the main numeric menu is reachable
    /// only when this is false.
    #[must_use]
    pub fn any_active(&self) -> bool {
        self.blacklist_menu
            || self.blacklist_removal
            || self.audit_menu
            || self.user_menu
            || self.search
            || self.create.is_some()
            || self.update.is_some()
            || self.delete.is_some()
    }
}

/// Process-local registry of flow slots, keyed by contact number.
#[derive(Default)]
pub struct FlowRegistry {
    inner: Mutex<HashMap<String, ContactFlows>>,
}

impl FlowRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a contact's slots (default when the contact has none).
    #[must_use]
    pub fn get(&self, number: &str) -> ContactFlows {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(number)
            .cloned()
            .unwrap_or_default()
    }

    /// Mutate a contact's slots in place. Entries with no active slot are
    /// pruned so the map only holds contacts mid-flow.
    pub fn update(&self, number: &str, f: impl FnOnce(&mut ContactFlows)) {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let flows = map.entry(number.to_string()).or_default();
        f(flows);
        if !flows.any_active() {
            map.remove(number);
        }
    }

    /// Drop every slot for a contact.
    pub fn clear(&self, number: &str) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(number);
    }
}
