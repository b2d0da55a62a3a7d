//! Navigable routes and the guards that gate them.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Signup,
    Dashboard,
    /// `/dashboard/lists/:listId/items`
    ListItems(String),
    Profile,
    /// `/share/:listId`, readable without a session
    Share(String),
}

/// Who may render a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    AuthenticatedOnly,
    /// Pages that make no sense once logged in (login, signup)
    GuestOnly,
}

/// Outcome of evaluating a guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
}

impl Route {
    /// Match a path. Trailing slashes are ignored; unknown paths give `None`.
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Self::Home),
            ["login"] => Some(Self::Login),
            ["signup"] => Some(Self::Signup),
            ["dashboard"] => Some(Self::Dashboard),
            ["dashboard", "lists", list_id, "items"] => Some(Self::ListItems(list_id.to_string())),
            ["profile"] => Some(Self::Profile),
            ["share", list_id] => Some(Self::Share(list_id.to_string())),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Login => "/login".to_string(),
            Self::Signup => "/signup".to_string(),
            Self::Dashboard => "/dashboard".to_string(),
            Self::ListItems(list_id) => format!("/dashboard/lists/{}/items", list_id),
            Self::Profile => "/profile".to_string(),
            Self::Share(list_id) => format!("/share/{}", list_id),
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Self::Home | Self::Share(_) => Access::Public,
            Self::Login | Self::Signup => Access::GuestOnly,
            Self::Dashboard | Self::ListItems(_) | Self::Profile => Access::AuthenticatedOnly,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Decide whether `route` renders for the current session or where to send
/// the visitor instead
pub fn guard(route: Route, has_user: bool) -> Navigation {
    match (route.access(), has_user) {
        (Access::AuthenticatedOnly, false) => Navigation::Redirect(Route::Login),
        (Access::GuestOnly, true) => Navigation::Redirect(Route::Dashboard),
        _ => Navigation::Render(route),
    }
}
