//! Role-gated route access for dashboard views.
//!
//! The guard is a pure function of the session's authentication flag, its
//! role and the path being visited. It never touches the network; the
//! server still enforces roles on every API call.

use instar_platform_access::Role;
use tracing::debug;

/// Outcome of a route check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectToLogin,
    RedirectToHome,
}

impl Decision {
    /// Where the user is sent instead, if anywhere.
    #[must_use]
    pub fn redirect_path(self) -> Option<&'static str> {
        match self {
            Self::Allow => None,
            Self::RedirectToLogin => Some(LOGIN_PATH),
            Self::RedirectToHome => Some(HOME_PATH),
        }
    }

    #[must_use]
    pub fn is_allowed(self) -> bool {
        self == Self::Allow
    }
}

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

/// Decides whether a session may view a route requiring `required`.
///
/// A role mismatch sends the user home rather than to the login form:
/// they are signed in, just not allowed here.
#[must_use]
pub fn decide(authenticated: bool, current_role: Option<Role>, required: Option<Role>) -> Decision {
    if !authenticated {
        return Decision::RedirectToLogin;
    }
    match required {
        None => Decision::Allow,
        Some(required) if current_role == Some(required) => Decision::Allow,
        Some(_) => Decision::RedirectToHome,
    }
}

/// Access requirement attached to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No guard; anyone may visit.
    Public,
    /// Any signed-in user.
    Authenticated,
    /// Signed-in users holding exactly this role.
    Role(Role),
}

#[derive(Debug, Clone)]
struct RouteEntry {
    segments: Vec<Segment>,
    access: Access,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
}

impl RouteEntry {
    fn parse(pattern: &str, access: Access) -> Self {
        let segments = split(pattern)
            .map(|s| {
                if s.starts_with(':') {
                    Segment::Param
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();
        Self { segments, access }
    }

    fn matches(&self, path: &[&str]) -> bool {
        self.segments.len() == path.len()
            && self.segments.iter().zip(path).all(|(seg, part)| match seg {
                Segment::Param => !part.is_empty(),
                Segment::Literal(lit) => lit == part,
            })
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    // Query strings and fragments never affect access.
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').filter(|s| !s.is_empty())
}

/// Static map from path patterns to access requirements.
///
/// Patterns are matched in insertion order. Paths that match nothing fall
/// back to [`Access::Authenticated`].
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    fallback: Access,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::dashboard()
    }
}

impl RouteTable {
    /// An empty table with the given fallback.
    #[must_use]
    pub fn new(fallback: Access) -> Self {
        Self {
            entries: Vec::new(),
            fallback,
        }
    }

    /// The dashboard's own routes.
    #[must_use]
    pub fn dashboard() -> Self {
        Self::new(Access::Authenticated)
            .route("/login", Access::Public)
            .route("/signup", Access::Public)
            .route("/products", Access::Authenticated)
            .route("/sales", Access::Authenticated)
            .route("/statistics", Access::Role(Role::User))
            .route("/dashboard", Access::Role(Role::Admin))
            .route("/list", Access::Role(Role::Admin))
            .route("/details/:userId", Access::Role(Role::Admin))
    }

    /// Adds a route pattern; `:name` segments match any single segment.
    #[must_use]
    pub fn route(mut self, pattern: &str, access: Access) -> Self {
        self.entries.push(RouteEntry::parse(pattern, access));
        self
    }

    /// Looks up the access requirement for a concrete path.
    #[must_use]
    pub fn access_for(&self, path: &str) -> Access {
        let parts: Vec<&str> = split(path).collect();
        self.entries
            .iter()
            .find(|entry| entry.matches(&parts))
            .map_or(self.fallback, |entry| entry.access)
    }
}

/// Applies [`decide`] to paths through a [`RouteTable`].
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    table: RouteTable,
}

impl RouteGuard {
    #[must_use]
    pub fn new(table: RouteTable) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Checks whether a session may view `path`.
    #[must_use]
    pub fn check(&self, authenticated: bool, role: Option<Role>, path: &str) -> Decision {
        let decision = match self.table.access_for(path) {
            Access::Public => Decision::Allow,
            Access::Authenticated => decide(authenticated, role, None),
            Access::Role(required) => decide(authenticated, role, Some(required)),
        };
        debug!(path, authenticated, ?role, ?decision, "route check");
        decision
    }
}

/// Result of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The cursor moved to this path.
    Moved(String),
    /// The step was refused; the cursor stayed and the user is sent here.
    Redirected(&'static str),
    /// There was no history in that direction.
    Unchanged,
}

/// Browser-style history that consults the guard on every step.
///
/// Back and forward are checked too, so a session that lost its role or
/// expired cannot walk back into a protected view.
#[derive(Debug, Clone)]
pub struct Navigator {
    guard: RouteGuard,
    history: Vec<String>,
    cursor: usize,
}

impl Navigator {
    /// Starts with a single entry at `start`, which is not checked.
    #[must_use]
    pub fn new(guard: RouteGuard, start: impl Into<String>) -> Self {
        Self {
            guard,
            history: vec![start.into()],
            cursor: 0,
        }
    }

    /// The path under the cursor.
    #[must_use]
    pub fn current(&self) -> &str {
        &self.history[self.cursor]
    }

    /// Visits a new path, discarding any forward history.
    pub fn push(&mut self, authenticated: bool, role: Option<Role>, path: &str) -> Navigation {
        match self.guard.check(authenticated, role, path).redirect_path() {
            Some(redirect) => Navigation::Redirected(redirect),
            None => {
                self.history.truncate(self.cursor + 1);
                self.history.push(path.to_string());
                self.cursor += 1;
                Navigation::Moved(path.to_string())
            }
        }
    }

    pub fn back(&mut self, authenticated: bool, role: Option<Role>) -> Navigation {
        if self.cursor == 0 {
            return Navigation::Unchanged;
        }
        self.step_to(self.cursor - 1, authenticated, role)
    }

    pub fn forward(&mut self, authenticated: bool, role: Option<Role>) -> Navigation {
        if self.cursor + 1 >= self.history.len() {
            return Navigation::Unchanged;
        }
        self.step_to(self.cursor + 1, authenticated, role)
    }

    fn step_to(&mut self, index: usize, authenticated: bool, role: Option<Role>) -> Navigation {
        let target = &self.history[index];
        match self.guard.check(authenticated, role, target).redirect_path() {
            Some(redirect) => Navigation::Redirected(redirect),
            None => {
                self.cursor = index;
                Navigation::Moved(target.clone())
            }
        }
    }
}
