//! Permission catalog and admin menu filtering.
//!
//! Permissions are a fixed catalog compiled into the binary. Roles are stored
//! in the database as sets of catalog IDs; a user's effective permissions are
//! the union over their roles. Users flagged `is_admin` bypass every check.
//!
//! The admin navigation is a static tree. [`filter_menu`] prunes it down to the
//! entries a user can actually reach.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// An entry in the permission catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Permission {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub action: &'static str,
}

const fn perm(
    id: &'static str,
    name: &'static str,
    category: &'static str,
    action: &'static str,
) -> Permission {
    Permission {
        id,
        name,
        category,
        action,
    }
}

/// Every permission the admin API knows about.
pub static PERMISSIONS: &[Permission] = &[
    perm("view_users", "View users", "users", "view"),
    perm("manage_users", "Edit users", "users", "manage"),
    perm("ban_users", "Ban users", "users", "ban"),
    perm("delete_users", "Delete users", "users", "delete"),
    perm("view_roles", "View roles", "roles", "view"),
    perm("manage_roles", "Manage roles", "roles", "manage"),
    perm("view_mods", "View mods", "mods", "view"),
    perm("manage_mods", "Manage mods", "mods", "manage"),
    perm("view_tickets", "View support tickets", "tickets", "view"),
    perm("manage_tickets", "Handle support tickets", "tickets", "manage"),
    perm("view_settings", "View site settings", "settings", "view"),
    perm("manage_system", "Manage site settings", "settings", "manage"),
    perm("view_analytics", "View analytics", "analytics", "view"),
    perm("moderate_forum", "Moderate forum", "forum", "moderate"),
];

/// Catalog grouped by category, categories in alphabetical order.
#[must_use]
pub fn permissions_by_category() -> BTreeMap<&'static str, Vec<&'static Permission>> {
    let mut grouped: BTreeMap<&'static str, Vec<&'static Permission>> = BTreeMap::new();
    for permission in PERMISSIONS {
        grouped.entry(permission.category).or_default().push(permission);
    }
    grouped
}

#[must_use]
pub fn find_permission(id: &str) -> Option<&'static Permission> {
    PERMISSIONS.iter().find(|p| p.id == id)
}

#[must_use]
pub fn is_known_permission(id: &str) -> bool {
    find_permission(id).is_some()
}

/// A user's effective access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissions {
    pub is_admin: bool,
    pub permissions: BTreeSet<String>,
}

impl UserPermissions {
    /// Full access.
    #[must_use]
    pub fn admin() -> Self {
        Self {
            is_admin: true,
            permissions: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn new<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            is_admin: false,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the user holds `id`. Admins hold everything.
    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.is_admin || self.permissions.contains(id)
    }

    /// Whether the user holds at least one of `ids`.
    ///
    /// This does not special-case an empty list; callers decide what "no
    /// requirement" means.
    #[must_use]
    pub fn has_any(&self, ids: &[String]) -> bool {
        self.is_admin || ids.iter().any(|id| self.permissions.contains(id))
    }
}

/// A node in the admin navigation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<MenuItem>>,
}

impl MenuItem {
    fn leaf(id: &str, label: &str, path: &str, permissions: &[&str]) -> Self {
        Self {
            id: id.to_owned(),
            label: label.to_owned(),
            path: Some(path.to_owned()),
            permissions: if permissions.is_empty() {
                None
            } else {
                Some(permissions.iter().map(|p| (*p).to_owned()).collect())
            },
            children: None,
        }
    }

    fn group(id: &str, label: &str, children: Vec<Self>) -> Self {
        Self {
            id: id.to_owned(),
            label: label.to_owned(),
            path: None,
            permissions: None,
            children: Some(children),
        }
    }

    /// `Some(true)` if the user holds one of the listed permissions,
    /// `Some(false)` if they hold none, `None` if nothing is required.
    fn direct_match(&self, user: &UserPermissions) -> Option<bool> {
        self.permissions
            .as_deref()
            .filter(|required| !required.is_empty())
            .map(|required| user.has_any(required))
    }
}

/// The admin navigation tree.
#[must_use]
pub fn admin_menu() -> Vec<MenuItem> {
    vec![
        MenuItem::leaf("dashboard", "Dashboard", "/admin", &[]),
        MenuItem::group(
            "people",
            "People",
            vec![
                MenuItem::leaf("users", "Users", "/admin/users", &["view_users", "manage_users"]),
                MenuItem::leaf("roles", "Roles", "/admin/roles", &["view_roles", "manage_roles"]),
            ],
        ),
        MenuItem::group(
            "catalog",
            "Catalog",
            vec![MenuItem::leaf("mods", "Mods", "/admin/mods", &["view_mods", "manage_mods"])],
        ),
        MenuItem::group(
            "support",
            "Support",
            vec![
                MenuItem::leaf(
                    "support-tickets",
                    "Support Tickets",
                    "/admin/support-tickets",
                    &["view_tickets", "manage_tickets"],
                ),
                MenuItem::leaf("forum", "Forum", "/admin/forum", &["moderate_forum"]),
            ],
        ),
        MenuItem::leaf("analytics", "Analytics", "/admin/analytics", &["view_analytics"]),
        MenuItem::leaf("settings", "Settings", "/admin/settings", &["manage_system"]),
    ]
}

/// Prune `items` down to what `user` can reach.
///
/// Admins get the tree unchanged. Otherwise a leaf survives when it has no
/// requirement or the user holds one of its permissions. A parent survives
/// when it matches directly or keeps at least one child.
#[must_use]
pub fn filter_menu(items: &[MenuItem], user: &UserPermissions) -> Vec<MenuItem> {
    if user.is_admin {
        return items.to_vec();
    }
    items.iter().filter_map(|item| prune(item, user)).collect()
}

fn prune(item: &MenuItem, user: &UserPermissions) -> Option<MenuItem> {
    let direct = item.direct_match(user);

    let Some(children) = item.children.as_deref() else {
        return direct.unwrap_or(true).then(|| item.clone());
    };

    let kept: Vec<MenuItem> = children.iter().filter_map(|c| prune(c, user)).collect();
    if kept.is_empty() && direct != Some(true) {
        return None;
    }

    Some(MenuItem {
        children: Some(kept),
        ..item.clone()
    })
}
