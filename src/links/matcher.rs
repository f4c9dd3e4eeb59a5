/// A list of domain substrings matched against whole links
///
/// Matching is a case-insensitive substring test against the full link
/// string, so `example.com` matches `https://blog.EXAMPLE.com/post` and also
/// `https://other.org/?ref=example.com`. Entries are lowercased once on
/// construction.
///
/// # Examples
///
/// ```
/// use link_digest::links::DomainRules;
///
/// let rules = DomainRules::new(["Medium.com"]);
/// assert!(rules.matches("https://medium.com/@someone/post"));
/// assert!(rules.matches("HTTPS://MEDIUM.COM/"));
/// assert!(!rules.matches("https://example.org/"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainRules {
    patterns: Vec<String>,
}

impl DomainRules {
    /// Builds a rule set from configured entries, skipping blank ones
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { patterns }
    }

    /// Returns true if any entry occurs in the link
    pub fn matches(&self, link: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let link = link.to_lowercase();
        self.patterns.iter().any(|p| link.contains(p.as_str()))
    }

    /// Returns true if the rule set has no entries
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Number of entries in the rule set
    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}
