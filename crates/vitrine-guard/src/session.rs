//! Authentication gating for protected pages.
//!
//! The identity backend is opaque and reached through [`IdentityService`].
//! Pending redirects live in the host's session storage.

use crate::store::Storage;
use crate::validate;

/// Session storage key holding the page to return to after login.
pub const REDIRECT_KEY: &str = "redirect_after_login";

pub const LOGIN_PAGE: &str = "login.html";
pub const ADMIN_PAGE: &str = "admin.html";
pub const HOME_PAGE: &str = "index.html";

/// Role value granting admin access.
pub const ADMIN_ROLE: &str = "admin";

/// Errors from the identity backend or the login form.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("Identity service error: {0}")]
    Identity(String),

    #[error("Invalid email address")]
    InvalidEmail,
}

/// A signed-in user as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    /// Role from user-editable metadata
    pub user_role: Option<String>,
    /// Role from application metadata
    pub app_role: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.user_role.as_deref() == Some(ADMIN_ROLE) || self.app_role.as_deref() == Some(ADMIN_ROLE)
    }
}

/// The remote identity service.
pub trait IdentityService {
    /// Whether a session is currently active.
    fn has_session(&self) -> Result<bool, GuardError>;

    /// The signed-in user, if any.
    fn current_user(&self) -> Result<Option<User>, GuardError>;

    fn sign_in(&mut self, email: &str, password: &str) -> Result<User, GuardError>;

    fn sign_out(&mut self) -> Result<(), GuardError>;
}

/// Outcome of a page guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Show the page
    Allow,

    /// Send the visitor to [`LOGIN_PAGE`]
    RedirectToLogin,

    /// Signed in without the admin role; send them to [`HOME_PAGE`]
    Deny,
}

impl Access {
    /// Page to navigate to, if the guard refused.
    pub fn destination(self) -> Option<&'static str> {
        match self {
            Access::Allow => None,
            Access::RedirectToLogin => Some(LOGIN_PAGE),
            Access::Deny => Some(HOME_PAGE),
        }
    }
}

/// Whether a session is active. Backend errors count as signed out.
pub fn is_authenticated(identity: &impl IdentityService) -> bool {
    identity.has_session().unwrap_or_else(|e| {
        tracing::warn!("Authentication check failed: {}", e);
        false
    })
}

/// Whether the signed-in user is an admin. Backend errors count as no.
pub fn is_admin(identity: &impl IdentityService) -> bool {
    match identity.current_user() {
        Ok(user) => user.is_some_and(|u| u.is_admin()),
        Err(e) => {
            tracing::warn!("Admin check failed: {}", e);
            false
        }
    }
}

/// Remember `current_url` and send the visitor to the login page.
pub fn redirect_to_login(session: &mut impl Storage, current_url: &str) -> Access {
    session.set(REDIRECT_KEY, current_url.to_string());
    Access::RedirectToLogin
}

/// Guard for pages requiring a session.
pub fn require_auth(
    identity: &impl IdentityService,
    session: &mut impl Storage,
    current_url: &str,
) -> Access {
    if is_authenticated(identity) {
        Access::Allow
    } else {
        redirect_to_login(session, current_url)
    }
}

/// Guard for admin-only pages.
pub fn require_admin(
    identity: &impl IdentityService,
    session: &mut impl Storage,
    current_url: &str,
) -> Access {
    match require_auth(identity, session, current_url) {
        Access::Allow if is_admin(identity) => Access::Allow,
        Access::Allow => Access::Deny,
        redirect => redirect,
    }
}

/// Sign in after checking the email's shape.
pub fn login(
    identity: &mut impl IdentityService,
    email: &str,
    password: &str,
) -> Result<User, GuardError> {
    if !validate::email(email) {
        return Err(GuardError::InvalidEmail);
    }
    identity.sign_in(email, password)
}

/// Where to go after a successful login: the remembered page unless it is
/// the current one, else the admin page. The remembered page is consumed.
pub fn after_login(session: &mut impl Storage, current_url: &str) -> String {
    let remembered = session.get(REDIRECT_KEY);
    session.remove(REDIRECT_KEY);

    match remembered {
        Some(url) if url != current_url => url,
        _ => ADMIN_PAGE.to_string(),
    }
}

/// Sign out and wipe the session storage. Returns the page to show next.
pub fn logout(
    identity: &mut impl IdentityService,
    session: &mut impl Storage,
) -> Result<&'static str, GuardError> {
    identity.sign_out()?;
    session.clear();
    Ok(HOME_PAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct FakeIdentity {
        user: Option<User>,
        failing: bool,
    }

    impl FakeIdentity {
        fn signed_in(role: Option<&str>) -> Self {
            Self {
                user: Some(User {
                    id: "u1".to_string(),
                    email: Some("garage@example.be".to_string()),
                    app_role: role.map(String::from),
                    ..Default::default()
                }),
                failing: false,
            }
        }
    }

    impl IdentityService for FakeIdentity {
        fn has_session(&self) -> Result<bool, GuardError> {
            if self.failing {
                return Err(GuardError::Identity("offline".to_string()));
            }
            Ok(self.user.is_some())
        }

        fn current_user(&self) -> Result<Option<User>, GuardError> {
            if self.failing {
                return Err(GuardError::Identity("offline".to_string()));
            }
            Ok(self.user.clone())
        }

        fn sign_in(&mut self, email: &str, password: &str) -> Result<User, GuardError> {
            if password != "secret" {
                return Err(GuardError::Identity("Invalid login credentials".to_string()));
            }
            let user = User {
                id: "u1".to_string(),
                email: Some(email.to_string()),
                ..Default::default()
            };
            self.user = Some(user.clone());
            Ok(user)
        }

        fn sign_out(&mut self) -> Result<(), GuardError> {
            self.user = None;
            Ok(())
        }
    }

    #[test]
    fn anonymous_visitor_is_sent_to_login() {
        let identity = FakeIdentity::default();
        let mut session = MemoryStorage::new();

        let access = require_auth(&identity, &mut session, "https://site/devis.html");

        assert_eq!(access, Access::RedirectToLogin);
        assert_eq!(access.destination(), Some(LOGIN_PAGE));
        assert_eq!(
            session.get(REDIRECT_KEY).as_deref(),
            Some("https://site/devis.html")
        );
    }

    #[test]
    fn backend_errors_count_as_signed_out() {
        let identity = FakeIdentity {
            failing: true,
            ..FakeIdentity::signed_in(Some("admin"))
        };
        let mut session = MemoryStorage::new();

        assert_eq!(
            require_admin(&identity, &mut session, "admin.html"),
            Access::RedirectToLogin
        );
    }

    #[test]
    fn admin_pages_need_the_admin_role() {
        let mut session = MemoryStorage::new();

        let admin = FakeIdentity::signed_in(Some("admin"));
        assert_eq!(require_admin(&admin, &mut session, "admin.html"), Access::Allow);

        let member = FakeIdentity::signed_in(None);
        assert_eq!(
            require_admin(&member, &mut session, "admin.html"),
            Access::Deny
        );
        assert_eq!(Access::Deny.destination(), Some(HOME_PAGE));
    }

    #[test]
    fn user_metadata_role_also_grants_admin() {
        let user = User {
            user_role: Some("admin".to_string()),
            ..Default::default()
        };

        assert!(user.is_admin());
    }

    #[test]
    fn login_checks_email_shape_first() {
        let mut identity = FakeIdentity::default();

        assert!(matches!(
            login(&mut identity, "not-an-email", "secret"),
            Err(GuardError::InvalidEmail)
        ));
        assert!(login(&mut identity, "garage@example.be", "wrong").is_err());
        assert!(login(&mut identity, "garage@example.be", "secret").is_ok());
        assert!(is_authenticated(&identity));
    }

    #[test]
    fn after_login_returns_to_remembered_page_once() {
        let mut session = MemoryStorage::new();
        session.set(REDIRECT_KEY, "devis.html".to_string());

        assert_eq!(after_login(&mut session, "login.html"), "devis.html");
        assert_eq!(after_login(&mut session, "login.html"), ADMIN_PAGE);
    }

    #[test]
    fn after_login_ignores_self_redirect() {
        let mut session = MemoryStorage::new();
        session.set(REDIRECT_KEY, "login.html".to_string());

        assert_eq!(after_login(&mut session, "login.html"), ADMIN_PAGE);
    }

    #[test]
    fn logout_clears_session() {
        let mut identity = FakeIdentity::signed_in(None);
        let mut session = MemoryStorage::new();
        session.set("csrf_token", "abc".to_string());

        let next = logout(&mut identity, &mut session).unwrap();

        assert_eq!(next, HOME_PAGE);
        assert!(session.is_empty());
        assert!(!is_authenticated(&identity));
    }
}
