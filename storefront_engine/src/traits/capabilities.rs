use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::UserId;

/// Privileged actions that are gated behind a capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Move an order along its fulfillment status flow.
    UpdateOrderStatus,
    /// Read an order that belongs to someone else.
    ViewOrder,
}

impl Action {
    /// The permission codename that grants this action.
    pub fn codename(&self) -> &'static str {
        match self {
            Action::UpdateOrderStatus => "update_order_status",
            Action::ViewOrder => "view_order",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.codename())
    }
}

/// An authenticated caller, as vouched for by the identity collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub is_staff: bool,
    pub permissions: Vec<String>,
}

impl Actor {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id, is_staff: false, permissions: Vec::new() }
    }

    pub fn staff(user_id: UserId) -> Self {
        Self { user_id, is_staff: true, permissions: Vec::new() }
    }

    pub fn with_permission<S: Into<String>>(mut self, permission: S) -> Self {
        self.permissions.push(permission.into());
        self
    }

    pub fn has_permission(&self, codename: &str) -> bool {
        self.permissions.iter().any(|p| p == codename)
    }
}

/// Answers "may this actor perform this action?".
///
/// Implemented by whatever authorization system sits in front of the engine. The engine never inspects roles itself.
pub trait CapabilityCheck {
    fn has_capability(&self, actor: &Actor, action: Action) -> bool;
}

/// Staff members hold every capability. Everyone else needs the matching permission codename on their identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionCapabilities;

impl CapabilityCheck for PermissionCapabilities {
    fn has_capability(&self, actor: &Actor, action: Action) -> bool {
        actor.is_staff || actor.has_permission(action.codename())
    }
}
