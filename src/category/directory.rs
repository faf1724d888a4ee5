use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::RegistryError;

/// Internal tag for a mapping index.
///
/// The numeric codes are what persisted records carry; the names are what
/// callers type. `Unknown` is the sentinel for any name the directory does
/// not recognize and is never a valid index.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum CategoryTag {
    Unknown,
    Sports,
    Rounds,
    Teams,
    Tournaments,
    IndividualSports,
    Contenders,
}

impl CategoryTag {
    /// Every valid (non-sentinel) tag, in code order.
    pub const ALL: [CategoryTag; 6] = [
        CategoryTag::Sports,
        CategoryTag::Rounds,
        CategoryTag::Teams,
        CategoryTag::Tournaments,
        CategoryTag::IndividualSports,
        CategoryTag::Contenders,
    ];

    /// Total lookup from an external name; unrecognized names yield `Unknown`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "sports" => CategoryTag::Sports,
            "rounds" => CategoryTag::Rounds,
            "teams" => CategoryTag::Teams,
            "tournaments" => CategoryTag::Tournaments,
            "individualSports" => CategoryTag::IndividualSports,
            "contenders" => CategoryTag::Contenders,
            _ => CategoryTag::Unknown,
        }
    }

    pub fn to_name(self) -> &'static str {
        match self {
            CategoryTag::Unknown => "unknown",
            CategoryTag::Sports => "sports",
            CategoryTag::Rounds => "rounds",
            CategoryTag::Teams => "teams",
            CategoryTag::Tournaments => "tournaments",
            CategoryTag::IndividualSports => "individualSports",
            CategoryTag::Contenders => "contenders",
        }
    }

    pub fn code(self) -> u8 {
        match self {
            CategoryTag::Unknown => 0,
            CategoryTag::Sports => 1,
            CategoryTag::Rounds => 2,
            CategoryTag::Teams => 3,
            CategoryTag::Tournaments => 4,
            CategoryTag::IndividualSports => 5,
            CategoryTag::Contenders => 6,
        }
    }

    pub fn from_code(code: u8) -> Self {
        CategoryTag::ALL
            .into_iter()
            .find(|tag| tag.code() == code)
            .unwrap_or(CategoryTag::Unknown)
    }

    pub fn is_known(self) -> bool {
        self != CategoryTag::Unknown
    }
}

/// Map a caller-supplied index name to its tag, rejecting anything that does
/// not round-trip (`to_name(from_name(s)) == s`) or lands on the sentinel.
pub fn resolve_category(name: &str) -> Result<CategoryTag, RegistryError> {
    let tag = CategoryTag::from_name(name);
    if !tag.is_known() || tag.to_name() != name {
        return Err(RegistryError::InvalidCategory(name.to_string()));
    }
    Ok(tag)
}

// Records carry the numeric code so renaming an index never rewrites data.
impl Serialize for CategoryTag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for CategoryTag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = u8::deserialize(deserializer)?;
        Ok(Self::from_code(code))
    }
}
