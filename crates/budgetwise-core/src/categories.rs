//! Category registry
//!
//! The set of categories is closed. Display metadata lives on the variants
//! and is resolved by exhaustive matching, so adding a category forces every
//! lookup to handle it.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Groceries,
    Shopping,
    Transport,
    Entertainment,
    Housing,
    Health,
    Work,
    Education,
    Gifts,
    Travel,
    Other,
    /// Reserved for income transactions; never budgeted
    Income,
}

/// Display metadata for a category
#[derive(Debug, Clone, Serialize)]
pub struct CategoryInfo {
    pub category: Category,
    pub label: &'static str,
    pub icon: &'static str,
    pub budgetable: bool,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::Groceries,
        Category::Shopping,
        Category::Transport,
        Category::Entertainment,
        Category::Housing,
        Category::Health,
        Category::Work,
        Category::Education,
        Category::Gifts,
        Category::Travel,
        Category::Other,
        Category::Income,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groceries => "Groceries",
            Self::Shopping => "Shopping",
            Self::Transport => "Transport",
            Self::Entertainment => "Entertainment",
            Self::Housing => "Housing",
            Self::Health => "Health",
            Self::Work => "Work",
            Self::Education => "Education",
            Self::Gifts => "Gifts",
            Self::Travel => "Travel",
            Self::Other => "Other",
            Self::Income => "Income",
        }
    }

    /// Icon name (lucide naming) used by clients
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Groceries => "utensils-crossed",
            Self::Shopping => "shopping-bag",
            Self::Transport => "car",
            Self::Entertainment => "ticket",
            Self::Housing => "home",
            Self::Health => "heart-pulse",
            Self::Work => "briefcase",
            Self::Education => "graduation-cap",
            Self::Gifts => "gift",
            Self::Travel => "plane",
            Self::Other => "more-horizontal",
            Self::Income => "circle-dollar-sign",
        }
    }

    /// Whether a monthly budget can be set for this category
    pub fn is_budgetable(&self) -> bool {
        !matches!(self, Self::Income)
    }

    pub fn info(&self) -> CategoryInfo {
        CategoryInfo {
            category: *self,
            label: self.as_str(),
            icon: self.icon(),
            budgetable: self.is_budgetable(),
        }
    }

    /// Categories a user can budget for, in display order
    pub fn budgetable() -> impl Iterator<Item = Category> {
        Self::ALL.into_iter().filter(|c| c.is_budgetable())
    }

    /// Registry listing with metadata, in display order
    pub fn registry() -> Vec<CategoryInfo> {
        Self::ALL.iter().map(|c| c.info()).collect()
    }
}

impl std::str::FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidData(format!("Unknown category: {}", s)))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
