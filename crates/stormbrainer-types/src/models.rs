use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of galaxy categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Math,
    Logic,
    Programming,
    Riddles,
    General,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Math,
        Category::Logic,
        Category::Programming,
        Category::Riddles,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Math => "Math",
            Category::Logic => "Logic",
            Category::Programming => "Programming",
            Category::Riddles => "Riddles",
            Category::General => "General",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Which galaxies `GET /galaxies` returns.
///
/// `Public` lists every public galaxy plus the private ones the caller has
/// joined; `Joined` lists only galaxies with a membership row for the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GalaxyFilter {
    #[default]
    Public,
    Joined,
}

impl GalaxyFilter {
    /// Unknown values browse public galaxies.
    pub fn parse_lossy(s: Option<&str>) -> Self {
        match s {
            Some("joined") => GalaxyFilter::Joined,
            _ => GalaxyFilter::Public,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_known_names() {
        for c in Category::ALL {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), c);
        }
        assert!("Poetry".parse::<Category>().is_err());
        assert!("math".parse::<Category>().is_err());
    }

    #[test]
    fn category_serializes_as_name() {
        let json = serde_json::to_string(&Category::Riddles).unwrap();
        assert_eq!(json, "\"Riddles\"");
    }

    #[test]
    fn filter_falls_back_to_public() {
        assert_eq!(GalaxyFilter::parse_lossy(None), GalaxyFilter::Public);
        assert_eq!(GalaxyFilter::parse_lossy(Some("joined")), GalaxyFilter::Joined);
        assert_eq!(GalaxyFilter::parse_lossy(Some("everything")), GalaxyFilter::Public);
    }
}
