use crate::{
    guard,
    models::{CurrentUser, Role, RouteRule, Session},
};

/// RouteTable
///
/// The static set of protected UI destinations. Built once at startup and
/// shared read-only through `AppState`.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// ims
    ///
    /// The destinations of the Image Management System frontend, grouped by the
    /// role that owns them. Detail views use `:param` segments.
    pub fn ims() -> Self {
        use Role::*;

        Self::new(vec![
            // Shared
            RouteRule::any_role("/"),
            RouteRule::any_role("/profile"),
            // Administration
            RouteRule::new("/admin/users", [Admin]),
            RouteRule::new("/admin/users/:id", [Admin]),
            RouteRule::new("/admin/patients", [Admin]),
            RouteRule::new("/admin/medical-staff", [Admin]),
            RouteRule::new("/admin/workflow", [Admin]),
            RouteRule::new("/admin/statistics", [Admin]),
            // Patient portal
            RouteRule::new("/patient/medical-images", [Patient]),
            RouteRule::new("/patient/reports", [Patient]),
            RouteRule::new("/patient/billing", [Patient]),
            // Doctor workspace
            RouteRule::new("/doctor/tests", [Doctor]),
            RouteRule::new("/doctor/tests/:id", [Doctor]),
            RouteRule::new("/doctor/reports", [Doctor]),
            RouteRule::new("/doctor/patients", [Doctor]),
            // Radiology
            RouteRule::new("/radiologist/images", [Radiologist]),
            RouteRule::new("/radiologist/images/upload", [Radiologist]),
            RouteRule::new("/radiologist/reports", [Radiologist]),
            // Billing desk
            RouteRule::new("/cashier/billing", [Cashier]),
            RouteRule::new("/cashier/billing/:id", [Cashier]),
            // Cross-role detail views
            RouteRule::new("/reports/:id", [Doctor, Radiologist, Admin]),
            RouteRule::new("/medical-images/:id", [Patient, Doctor, Radiologist, Admin]),
        ])
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// resolve
    ///
    /// Finds the rule governing an already-normalized path. A literal pattern
    /// beats a `:param` pattern; among param patterns the one with the most
    /// literal segments wins, then table order.
    pub fn resolve(&self, path: &str) -> Option<&RouteRule> {
        if let Some(rule) = self.rules.iter().find(|r| r.path == path) {
            return Some(rule);
        }

        let segments: Vec<&str> = split_segments(path).collect();
        self.rules
            .iter()
            .filter_map(|rule| match_score(&rule.path, &segments).map(|score| (score, rule)))
            // max_by_key keeps the last maximum; reverse so the earliest rule wins ties.
            .rev()
            .max_by_key(|(score, _)| *score)
            .map(|(_, rule)| rule)
    }

    /// reachable
    ///
    /// Every destination the requester would be allowed to open, in table order.
    /// Param routes are listed with their pattern.
    pub fn reachable(&self, session: &Session, current_user: Option<&CurrentUser>) -> Vec<RouteRule> {
        self.rules
            .iter()
            .filter(|rule| guard::evaluate(session, current_user, rule, &rule.path).is_allowed())
            .cloned()
            .collect()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::ims()
    }
}

/// normalize_path
///
/// Canonical form used for matching: query and fragment removed, single
/// leading slash, no empty segments, no trailing slash (root stays `/`).
pub fn normalize_path(raw: &str) -> String {
    let without_fragment = raw.split('#').next().unwrap_or_default();
    let without_query = without_fragment.split('?').next().unwrap_or_default();

    let segments: Vec<&str> = split_segments(without_query.trim()).collect();
    if segments.is_empty() {
        return "/".to_string();
    }
    format!("/{}", segments.join("/"))
}

fn split_segments(path: &str) -> impl DoubleEndedIterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Number of literal segments matched, or `None` if the pattern does not fit.
fn match_score(pattern: &str, segments: &[&str]) -> Option<usize> {
    let pattern_segments: Vec<&str> = split_segments(pattern).collect();
    if pattern_segments.len() != segments.len() {
        return None;
    }

    let mut literals = 0;
    for (expected, actual) in pattern_segments.iter().zip(segments) {
        if expected.starts_with(':') {
            continue;
        }
        if expected != actual {
            return None;
        }
        literals += 1;
    }
    Some(literals)
}
