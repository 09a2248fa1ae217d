//! Account records and session bookkeeping. Password hashing and token
//! signing happen in the API layer; this module only stores their results.

use std::sync::LazyLock;

use rand::Rng;
use rand::distr::Alphanumeric;
use regex::Regex;
use tracing::info;
use uuid::Uuid;

use treats_types::models::UserId;

use crate::error::{Result, TreatsError};
use crate::stats::initial_user_stats;
use crate::workspace::{Permission, User, Workspace};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_NAME_LEN: usize = 50;
pub const MAX_HANDLE_LEN: usize = 20;
const RESET_CODE_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

pub fn validate_email(email: &str) -> Result<()> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(TreatsError::input(format!("'{}' is not a valid email", email)))
    }
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(TreatsError::input(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub fn validate_name(first: &str, last: &str) -> Result<()> {
    let ok = |s: &str| (1..=MAX_NAME_LEN).contains(&s.chars().count());
    if ok(first) && ok(last) {
        Ok(())
    } else {
        Err(TreatsError::input(format!(
            "names must be between 1 and {} characters",
            MAX_NAME_LEN
        )))
    }
}

impl Workspace {
    pub(crate) fn email_taken(&self, email: &str) -> bool {
        self.users.values().any(|u| !u.removed && u.email == email)
    }

    pub(crate) fn handle_taken(&self, handle: &str) -> bool {
        self.users.values().any(|u| !u.removed && u.handle_str == handle)
    }

    /// Lowercase alphanumerics of the full name, cut to 20 characters, with
    /// the smallest free numeric suffix appended on collision.
    fn generate_handle(&self, name_first: &str, name_last: &str) -> String {
        let base: String = name_first
            .chars()
            .chain(name_last.chars())
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .take(MAX_HANDLE_LEN)
            .collect();

        if !self.handle_taken(&base) {
            return base;
        }
        let mut suffix = 0u32;
        loop {
            let candidate = format!("{}{}", base, suffix);
            if !self.handle_taken(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Create an account and open its first session. The first account in
    /// the workspace becomes a global owner.
    pub fn register(
        &mut self,
        email: &str,
        password_hash: String,
        name_first: &str,
        name_last: &str,
    ) -> Result<(UserId, Uuid)> {
        validate_email(email)?;
        validate_name(name_first, name_last)?;
        if self.email_taken(email) {
            return Err(TreatsError::input(format!("email {} is already registered", email)));
        }

        let handle_str = self.generate_handle(name_first, name_last);
        let permission = if self.users.is_empty() {
            Permission::GlobalOwner
        } else {
            Permission::Member
        };
        if self.users.is_empty() {
            self.init_workspace_stats();
        }

        let u_id = self.alloc_user_id();
        let session = Uuid::new_v4();
        self.users.insert(
            u_id,
            User {
                u_id,
                email: email.to_string(),
                name_first: name_first.to_string(),
                name_last: name_last.to_string(),
                handle_str: handle_str.clone(),
                password_hash,
                permission,
                sessions: vec![session],
                reset_codes: Vec::new(),
                removed: false,
                notifications: Vec::new(),
                stats: initial_user_stats(),
            },
        );

        info!(u_id, handle = %handle_str, "user registered");
        Ok((u_id, session))
    }

    pub fn user_by_email(&self, email: &str) -> Result<&User> {
        self.users
            .values()
            .find(|u| !u.removed && u.email == email)
            .ok_or_else(|| TreatsError::input("email does not belong to a user"))
    }

    pub fn open_session(&mut self, u_id: UserId) -> Result<Uuid> {
        let session = Uuid::new_v4();
        self.user_mut(u_id)?.sessions.push(session);
        Ok(session)
    }

    pub fn close_session(&mut self, u_id: UserId, session: Uuid) -> Result<()> {
        let user = self.user_mut(u_id)?;
        user.sessions.retain(|s| *s != session);
        Ok(())
    }

    /// Resolve a session to its user. Dead sessions and removed users are
    /// rejected as an auth failure.
    pub fn authenticate(&self, u_id: UserId, session: Uuid) -> Result<UserId> {
        match self.users.get(&u_id) {
            Some(u) if !u.removed && u.sessions.contains(&session) => Ok(u_id),
            _ => Err(TreatsError::auth("token is invalid")),
        }
    }

    /// Issue a reset code and log the user out everywhere. Unknown emails are
    /// silently ignored.
    pub fn issue_reset_code(&mut self, email: &str) -> Option<String> {
        let user = self.users.values_mut().find(|u| !u.removed && u.email == email)?;
        let code: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(RESET_CODE_LEN)
            .map(char::from)
            .collect();
        user.reset_codes.push(code.clone());
        user.sessions.clear();
        Some(code)
    }

    pub fn reset_password(&mut self, reset_code: &str, password_hash: String) -> Result<()> {
        let user = self
            .users
            .values_mut()
            .find(|u| u.reset_codes.iter().any(|c| c == reset_code))
            .ok_or_else(|| TreatsError::input("reset code is invalid"))?;
        user.password_hash = password_hash;
        user.reset_codes.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(ws: &mut Workspace, email: &str, first: &str, last: &str) -> UserId {
        ws.register(email, "hash".into(), first, last).unwrap().0
    }

    #[test]
    fn test_handles_get_numeric_suffixes() {
        let mut ws = Workspace::new();
        let a = register(&mut ws, "a@example.com", "John", "Smith");
        let b = register(&mut ws, "b@example.com", "John", "Smith");
        let c = register(&mut ws, "c@example.com", "John", "Smith");
        assert_eq!(ws.user(a).unwrap().handle_str, "johnsmith");
        assert_eq!(ws.user(b).unwrap().handle_str, "johnsmith0");
        assert_eq!(ws.user(c).unwrap().handle_str, "johnsmith1");
    }

    #[test]
    fn test_handle_is_truncated_and_stripped() {
        let mut ws = Workspace::new();
        let u = register(&mut ws, "a@example.com", "Abcdefghij-klm", "Nopqrstuvwxyz");
        assert_eq!(ws.user(u).unwrap().handle_str, "abcdefghijklmnopqrst");
    }

    #[test]
    fn test_first_user_is_global_owner() {
        let mut ws = Workspace::new();
        let a = register(&mut ws, "a@example.com", "Ann", "Lee");
        let b = register(&mut ws, "b@example.com", "Bob", "Lee");
        assert!(ws.user(a).unwrap().is_global_owner());
        assert!(!ws.user(b).unwrap().is_global_owner());
    }

    #[test]
    fn test_register_rejects_bad_input() {
        let mut ws = Workspace::new();
        assert!(ws.register("not-an-email", "h".into(), "A", "B").is_err());
        assert!(ws.register("a@example.com", "h".into(), "", "B").is_err());
        register(&mut ws, "a@example.com", "A", "B");
        assert!(ws.register("a@example.com", "h".into(), "C", "D").is_err());
    }

    #[test]
    fn test_sessions() {
        let mut ws = Workspace::new();
        let (u, first) = ws.register("a@example.com", "h".into(), "A", "B").unwrap();
        let second = ws.open_session(u).unwrap();
        assert_eq!(ws.authenticate(u, first), Ok(u));

        ws.close_session(u, first).unwrap();
        assert!(matches!(ws.authenticate(u, first), Err(TreatsError::Auth(_))));
        assert_eq!(ws.authenticate(u, second), Ok(u));
    }

    #[test]
    fn test_reset_code_logs_out_everywhere() {
        let mut ws = Workspace::new();
        let (u, session) = ws.register("a@example.com", "old".into(), "A", "B").unwrap();
        let code = ws.issue_reset_code("a@example.com").unwrap();
        assert!(ws.authenticate(u, session).is_err());

        ws.reset_password(&code, "new".into()).unwrap();
        assert_eq!(ws.user(u).unwrap().password_hash, "new");
        assert!(ws.reset_password(&code, "again".into()).is_err());
        assert!(ws.issue_reset_code("nobody@example.com").is_none());
    }
}
