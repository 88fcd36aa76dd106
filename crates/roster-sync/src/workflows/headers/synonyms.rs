use super::normalizer::normalize_header;
use std::collections::HashSet;

/// Canonical header key -> alternates, tried in declaration order.
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    entries: Vec<(String, Vec<String>)>,
}

impl SynonymTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers alternates for `canonical`. Both sides are normalized; an alternate
    /// equal to the key is dropped, and repeated registrations append to the existing list.
    pub fn with<I, S>(mut self, canonical: &str, alternates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let key = normalize_header(canonical);
        let normalized: Vec<String> = alternates
            .into_iter()
            .map(|alt| normalize_header(alt.as_ref()))
            .filter(|alt| !alt.is_empty() && *alt != key)
            .collect();

        let index = match self.entries.iter().position(|(existing, _)| *existing == key) {
            Some(index) => index,
            None => {
                self.entries.push((key, Vec::new()));
                self.entries.len() - 1
            }
        };
        let list = &mut self.entries[index].1;
        for alt in normalized {
            if !list.contains(&alt) {
                list.push(alt);
            }
        }
        self
    }

    pub fn alternates(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(canonical, _)| canonical == key)
            .map(|(_, list)| list.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Field names seen across the student roster exports.
    pub fn roster() -> Self {
        Self::new()
            .with(
                "registrationnumber",
                [
                    "registerno",
                    "regno",
                    "registrationno",
                    "regnumber",
                    "regdno",
                    "regid",
                ],
            )
            .with(
                "geeksforgeekslink",
                [
                    "gfglink",
                    "geeksforgeeks",
                    "gfgurl",
                    "geeksforgeeksurl",
                    "gfgprofile",
                    "gfg",
                ],
            )
            .with(
                "leetcodelink",
                [
                    "leetcode",
                    "leetcodeurl",
                    "leetcodeprofile",
                    "leetcodeid",
                ],
            )
            .with(
                "codecheflink",
                ["codechef", "codechefurl", "codechefprofile"],
            )
            .with(
                "name",
                [
                    "studentname",
                    "fullname",
                    "candidate",
                    "applicant",
                ],
            )
    }
}

/// A required column described by every header spelling that may carry it.
#[derive(Debug, Clone)]
pub struct AliasSet {
    pub label: &'static str,
    aliases: HashSet<String>,
}

impl AliasSet {
    pub fn new<I, S>(label: &'static str, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            label,
            aliases: aliases
                .into_iter()
                .map(|alias| normalize_header(alias.as_ref()))
                .filter(|alias| !alias.is_empty())
                .collect(),
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        !key.is_empty() && self.aliases.contains(key)
    }

    pub fn registration_number() -> Self {
        Self::new(
            "registration number",
            ["registernumber", "registrationnumber", "regno", "registerno"],
        )
    }

    pub fn name() -> Self {
        Self::new("name", ["name", "studentname", "fullname"])
    }
}
