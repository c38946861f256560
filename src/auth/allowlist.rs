use std::collections::HashSet;

/// The set of e-mail addresses admitted to the admin surface.
///
/// Comparison is case-insensitive. An empty allowlist admits nobody.
#[derive(Debug, Clone, Default)]
pub struct AdminAllowlist {
    emails: HashSet<String>,
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AdminAllowlist {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            emails: emails
                .into_iter()
                .map(|e| normalize(e.as_ref()))
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn is_admin(&self, email: &str) -> bool {
        let email = normalize(email);
        !email.is_empty() && self.emails.contains(&email)
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}
