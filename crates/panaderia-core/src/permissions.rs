//! # Role Permissions
//!
//! Static role → module → action permission table. Permissions are derived
//! from the role alone, never stored per-user, so there is nothing to
//! migrate when the table changes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::EmployeeRole;

// =============================================================================
// Modules and Actions
// =============================================================================

/// Functional areas the permission table covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Dashboard,
    Products,
    Categories,
    Inventory,
    Sales,
    Employees,
    Reports,
    Settings,
}

impl Module {
    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Dashboard => "dashboard",
            Module::Products => "products",
            Module::Categories => "categories",
            Module::Inventory => "inventory",
            Module::Sales => "sales",
            Module::Employees => "employees",
            Module::Reports => "reports",
            Module::Settings => "settings",
        }
    }
}

/// Actions a role may be granted on a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Export,
}

/// Module → allowed actions, sorted for stable serialization.
pub type PermissionSet = BTreeMap<Module, Vec<Action>>;

// =============================================================================
// Permission Table
// =============================================================================

/// Returns the full permission set for a role.
///
/// Cashier and sales share a grant; baker gets the read-only floor.
pub fn permissions_for_role(role: EmployeeRole) -> PermissionSet {
    use Action::*;
    use Module::*;

    let mut perms = PermissionSet::new();
    match role {
        EmployeeRole::Admin => {
            perms.insert(Dashboard, vec![Read]);
            perms.insert(Products, vec![Create, Read, Update, Delete]);
            perms.insert(Categories, vec![Create, Read, Update, Delete]);
            perms.insert(Inventory, vec![Create, Read, Update, Delete]);
            perms.insert(Sales, vec![Create, Read, Update, Delete]);
            perms.insert(Employees, vec![Create, Read, Update, Delete]);
            perms.insert(Reports, vec![Read, Export]);
            perms.insert(Settings, vec![Read, Update]);
        }
        EmployeeRole::Manager => {
            perms.insert(Dashboard, vec![Read]);
            perms.insert(Products, vec![Create, Read, Update]);
            perms.insert(Categories, vec![Read]);
            perms.insert(Inventory, vec![Read, Update]);
            perms.insert(Sales, vec![Create, Read, Update]);
            perms.insert(Employees, vec![Read]);
            perms.insert(Reports, vec![Read, Export]);
            perms.insert(Settings, vec![Read]);
        }
        EmployeeRole::Cashier | EmployeeRole::Sales => {
            perms.insert(Dashboard, vec![Read]);
            perms.insert(Products, vec![Read]);
            perms.insert(Categories, vec![Read]);
            perms.insert(Inventory, vec![Read]);
            perms.insert(Sales, vec![Create, Read]);
            perms.insert(Reports, vec![Read]);
        }
        EmployeeRole::Baker => {
            perms.insert(Dashboard, vec![Read]);
            perms.insert(Products, vec![Read]);
            perms.insert(Sales, vec![Read]);
        }
    }
    perms
}

/// Checks a single module/action grant for a role.
pub fn role_allows(role: EmployeeRole, module: Module, action: Action) -> bool {
    permissions_for_role(role)
        .get(&module)
        .map(|actions| actions.contains(&action))
        .unwrap_or(false)
}

// =============================================================================
// Unit Tests
// =============================================================================
