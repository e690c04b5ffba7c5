//! Permission Definitions
//!
//! Scopes carried in the token's `permissions` claim. Reading the public
//! menu needs none of them.

/// Full drink details, ingredient names included
pub const READ_DETAIL: &str = "read:detail";

/// Add a drink to the menu
pub const CREATE_ITEM: &str = "create:item";

/// Change a drink's title or recipe
pub const UPDATE_ITEM: &str = "update:item";

/// Remove a drink from the menu
pub const DELETE_ITEM: &str = "delete:item";

pub const ALL_PERMISSIONS: &[&str] = &[READ_DETAIL, CREATE_ITEM, UPDATE_ITEM, DELETE_ITEM];

/// Validate if a permission string is one this service checks
pub fn is_valid_permission(permission: &str) -> bool {
    ALL_PERMISSIONS.contains(&permission)
}
