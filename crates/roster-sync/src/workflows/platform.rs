use super::headers::AliasSet;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Coding-profile sites whose links are tracked per student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfilePlatform {
    #[default]
    LeetCode,
    GeeksforGeeks,
    CodeChef,
}

impl ProfilePlatform {
    pub fn label(self) -> &'static str {
        match self {
            ProfilePlatform::LeetCode => "LeetCode",
            ProfilePlatform::GeeksforGeeks => "GeeksforGeeks",
            ProfilePlatform::CodeChef => "CodeChef",
        }
    }

    /// Header spellings that carry this platform's profile link.
    pub fn link_aliases(self) -> AliasSet {
        match self {
            ProfilePlatform::LeetCode => AliasSet::new(
                "LeetCode link",
                ["leetcodelink", "leetcode", "leetcodeprofile", "leetcodelinkurl"],
            ),
            ProfilePlatform::GeeksforGeeks => AliasSet::new(
                "GeeksforGeeks link",
                [
                    "geeksforgeekslink",
                    "geeksforgeeks",
                    "gfglink",
                    "gfg",
                    "gfgprofile",
                    "gfgurl",
                ],
            ),
            ProfilePlatform::CodeChef => AliasSet::new(
                "CodeChef link",
                ["codecheflink", "codechef", "codechefprofile", "codechefurl"],
            ),
        }
    }
}

impl fmt::Display for ProfilePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProfilePlatform {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "leetcode" | "lc" => Ok(Self::LeetCode),
            "geeksforgeeks" | "gfg" => Ok(Self::GeeksforGeeks),
            "codechef" | "cc" => Ok(Self::CodeChef),
            other => Err(format!(
                "unknown platform '{other}' (expected leetcode, gfg or codechef)"
            )),
        }
    }
}
