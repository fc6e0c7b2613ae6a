//! Caller identity extracted from transport headers.

/// Who is making a request: the tenant and the optional acting user.
///
/// The transport authenticates the caller and fills this in; handlers
/// trust it. Only `app_id` affects routing, the user fields exist for
/// request logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    /// Application (tenant) id every table and lock is scoped by.
    pub app_id: String,
    /// Acting user's email, when the transport supplied one.
    pub user_email: Option<String>,
    /// Acting user's display name.
    pub nickname: Option<String>,
    /// Authentication domain of the acting user.
    pub auth_domain: Option<String>,
}

impl CallerContext {
    /// Creates an app-only context with no acting user.
    #[must_use]
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            user_email: None,
            nickname: None,
            auth_domain: None,
        }
    }

    /// Attaches the acting user.
    #[must_use]
    pub fn with_user(
        mut self,
        email: impl Into<String>,
        nickname: impl Into<String>,
        auth_domain: impl Into<String>,
    ) -> Self {
        self.user_email = Some(email.into());
        self.nickname = Some(nickname.into());
        self.auth_domain = Some(auth_domain.into());
        self
    }
}
