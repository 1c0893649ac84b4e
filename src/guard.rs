use crate::models::{AccountState, CurrentUser, Decision, RouteRule, Session};

/// The one destination an inactive (or unresolved) account can still open.
pub const PROFILE_PATH: &str = Decision::PROFILE_PATH;

/// evaluate
///
/// Decides whether the requester may view `requested_path`, governed by `rule`.
///
/// The checks run in a fixed order and the first match wins:
/// 1. No session token: `RedirectLogin`.
/// 2. Account inactive: `Allow` for `/profile`, `RedirectProfile` for anything else.
/// 3. Role-gated rule that does not list the user's role: `RedirectHome`.
/// 4. Otherwise `Allow`.
///
/// A token without a resolvable `CurrentUser` has unknown role and activation.
/// Such a requester may open `/profile` and any rule with an empty role set;
/// every role-gated destination redirects to the profile, as for an inactive account.
///
/// Pure: no I/O, no hidden state, total over its inputs.
pub fn evaluate(
    session: &Session,
    current_user: Option<&CurrentUser>,
    rule: &RouteRule,
    requested_path: &str,
) -> Decision {
    if !session.has_token() {
        return Decision::RedirectLogin;
    }

    let Some(user) = current_user else {
        if requested_path == PROFILE_PATH || !rule.is_role_gated() {
            return Decision::Allow;
        }
        return Decision::RedirectProfile;
    };

    if !user.is_active {
        if requested_path == PROFILE_PATH {
            return Decision::Allow;
        }
        return Decision::RedirectProfile;
    }

    if !rule.permits(user.role) {
        return Decision::RedirectHome;
    }

    Decision::Allow
}

/// account_state
///
/// Projects the same inputs onto the login/activation state machine.
/// An unresolved user behind a live token counts as inactive.
pub fn account_state(session: &Session, current_user: Option<&CurrentUser>) -> AccountState {
    if !session.has_token() {
        return AccountState::LoggedOut;
    }
    match current_user {
        Some(user) if user.is_active => AccountState::LoggedInActive,
        _ => AccountState::LoggedInInactive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn user(role: Role, is_active: bool) -> CurrentUser {
        CurrentUser {
            id: Some("USR-000001".to_string()),
            username: format!("{}_user", role),
            role,
            is_active,
        }
    }

    fn token() -> Session {
        Session::new("abc")
    }

    #[test]
    fn no_token_always_redirects_to_login() {
        let rules = [
            RouteRule::new("/admin/users", [Role::Admin]),
            RouteRule::any_role("/"),
            RouteRule::any_role("/profile"),
        ];
        let users = [None, Some(user(Role::Admin, true)), Some(user(Role::Patient, false))];

        for rule in &rules {
            for u in &users {
                let decision = evaluate(&Session::anonymous(), u.as_ref(), rule, &rule.path);
                assert_eq!(decision, Decision::RedirectLogin, "rule {}", rule.path);
            }
        }
    }

    #[test]
    fn blank_token_is_not_a_session() {
        let rule = RouteRule::any_role("/");
        let decision = evaluate(&Session::new("   "), Some(&user(Role::Admin, true)), &rule, "/");
        assert_eq!(decision, Decision::RedirectLogin);
    }

    #[test]
    fn active_user_with_listed_role_is_allowed() {
        let rule = RouteRule::new("/doctor/tests", [Role::Doctor]);
        let decision = evaluate(&token(), Some(&user(Role::Doctor, true)), &rule, "/doctor/tests");
        assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn active_user_with_other_role_goes_home() {
        let rule = RouteRule::new("/admin/users", [Role::Admin]);
        for role in Role::ALL.into_iter().filter(|r| *r != Role::Admin) {
            let decision = evaluate(&token(), Some(&user(role, true)), &rule, "/admin/users");
            assert_eq!(decision, Decision::RedirectHome, "role {}", role);
        }
    }

    #[test]
    fn empty_role_set_admits_every_active_role() {
        let rule = RouteRule::any_role("/");
        for role in Role::ALL {
            let decision = evaluate(&token(), Some(&user(role, true)), &rule, "/");
            assert_eq!(decision, Decision::Allow);
        }
    }

    #[test]
    fn inactive_user_is_sent_to_profile_regardless_of_role() {
        let rules = [
            RouteRule::new("/patient/billing", [Role::Patient]),
            RouteRule::new("/admin/users", [Role::Admin]),
            RouteRule::any_role("/"),
        ];
        for role in Role::ALL {
            for rule in &rules {
                let decision = evaluate(&token(), Some(&user(role, false)), rule, &rule.path);
                assert_eq!(decision, Decision::RedirectProfile);
            }
        }
    }

    #[test]
    fn inactive_user_keeps_profile() {
        let rule = RouteRule::any_role("/profile");
        let decision = evaluate(&token(), Some(&user(Role::Patient, false)), &rule, "/profile");
        assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn inactive_check_runs_before_role_check() {
        // A patient-only rule would send a cashier home, but inactivity wins.
        let rule = RouteRule::new("/patient/billing", [Role::Patient]);
        let decision = evaluate(&token(), Some(&user(Role::Cashier, false)), &rule, "/patient/billing");
        assert_eq!(decision, Decision::RedirectProfile);
    }

    #[test]
    fn unresolved_user_is_denied_role_gated_routes() {
        let gated = RouteRule::new("/admin/users", [Role::Admin]);
        assert_eq!(evaluate(&token(), None, &gated, "/admin/users"), Decision::RedirectProfile);

        let open = RouteRule::any_role("/");
        assert_eq!(evaluate(&token(), None, &open, "/"), Decision::Allow);

        let profile = RouteRule::any_role("/profile");
        assert_eq!(evaluate(&token(), None, &profile, "/profile"), Decision::Allow);
    }

    #[test]
    fn evaluation_is_repeatable() {
        let rule = RouteRule::new("/doctor/tests", [Role::Doctor]);
        let session = token();
        let u = user(Role::Radiologist, true);
        let first = evaluate(&session, Some(&u), &rule, "/doctor/tests");
        let second = evaluate(&session, Some(&u), &rule, "/doctor/tests");
        assert_eq!(first, second);
        assert_eq!(u, user(Role::Radiologist, true));
    }

    #[test]
    fn account_state_follows_token_and_activation() {
        assert_eq!(account_state(&Session::anonymous(), None), AccountState::LoggedOut);
        assert_eq!(
            account_state(&token(), Some(&user(Role::Doctor, true))),
            AccountState::LoggedInActive
        );
        assert_eq!(
            account_state(&token(), Some(&user(Role::Doctor, false))),
            AccountState::LoggedInInactive
        );
        assert_eq!(account_state(&token(), None), AccountState::LoggedInInactive);
    }
}
