//! Enumerations shared by the data model

use serde::{Deserialize, Serialize};

/// Kind of recurring charge a pattern represents
///
/// Values the dashboard does not know yet are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PatternType {
    Subscription,
    Recurring,
    Periodic,
    Other(String),
}

impl PatternType {
    pub fn as_str(&self) -> &str {
        match self {
            PatternType::Subscription => "SUBSCRIPTION",
            PatternType::Recurring => "RECURRING",
            PatternType::Periodic => "PERIODIC",
            PatternType::Other(value) => value,
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &str {
        match self {
            PatternType::Subscription => "Subscription",
            PatternType::Recurring => "Recurring",
            PatternType::Periodic => "Periodic",
            PatternType::Other(value) => value,
        }
    }
}

impl From<String> for PatternType {
    fn from(value: String) -> Self {
        match value.to_uppercase().as_str() {
            "SUBSCRIPTION" => PatternType::Subscription,
            "RECURRING" => PatternType::Recurring,
            "PERIODIC" => PatternType::Periodic,
            _ => PatternType::Other(value),
        }
    }
}

impl From<PatternType> for String {
    fn from(value: PatternType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How often a recurring charge is expected
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
    Irregular,
    Other(String),
}

impl Frequency {
    pub fn as_str(&self) -> &str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Biweekly => "BIWEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Quarterly => "QUARTERLY",
            Frequency::Yearly => "YEARLY",
            Frequency::Irregular => "IRREGULAR",
            Frequency::Other(value) => value,
        }
    }

    /// Approximate period in days, if the frequency is regular
    pub fn period_days(&self) -> Option<u32> {
        match self {
            Frequency::Daily => Some(1),
            Frequency::Weekly => Some(7),
            Frequency::Biweekly => Some(14),
            Frequency::Monthly => Some(30),
            Frequency::Quarterly => Some(91),
            Frequency::Yearly => Some(365),
            Frequency::Irregular | Frequency::Other(_) => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Frequency::Other(value) => value.clone(),
            known => {
                let s = known.as_str().to_lowercase();
                let mut chars = s.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => s,
                }
            }
        }
    }
}

impl From<String> for Frequency {
    fn from(value: String) -> Self {
        match value.to_uppercase().as_str() {
            "DAILY" => Frequency::Daily,
            "WEEKLY" => Frequency::Weekly,
            "BIWEEKLY" => Frequency::Biweekly,
            "MONTHLY" => Frequency::Monthly,
            "QUARTERLY" => Frequency::Quarterly,
            "YEARLY" | "ANNUAL" => Frequency::Yearly,
            "IRREGULAR" => Frequency::Irregular,
            _ => Frequency::Other(value),
        }
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transaction list sort column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    Date,
    Amount,
    Merchant,
    Category,
}

impl std::str::FromStr for SortBy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date" => Ok(SortBy::Date),
            "amount" => Ok(SortBy::Amount),
            "merchant" => Ok(SortBy::Merchant),
            "category" => Ok(SortBy::Category),
            _ => Err(format!("Invalid sort column: {}", s)),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Desc
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("Invalid sort order: {}", s)),
        }
    }
}
