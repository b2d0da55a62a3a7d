//! Filtered and sorted views over cached items.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::{ShoppingItem, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Category,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort order written as `field.direction`, e.g. `name.asc`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    /// Newest first
    fn default() -> Self {
        Self {
            field: SortField::Date,
            direction: SortDirection::Desc,
        }
    }
}

impl FromStr for SortSpec {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ValidationError::UnknownSort(s.to_string());
        let (field, direction) = s.trim().split_once('.').ok_or_else(unknown)?;

        let field = match field {
            "name" => SortField::Name,
            "category" => SortField::Category,
            "date" => SortField::Date,
            _ => return Err(unknown()),
        };
        let direction = match direction {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return Err(unknown()),
        };

        Ok(Self { field, direction })
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            SortField::Name => "name",
            SortField::Category => "category",
            SortField::Date => "date",
        };
        let direction = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{}.{}", field, direction)
    }
}

impl SortSpec {
    /// Parse a spec coming from a URL or a saved preference, falling back to
    /// the default for anything unrecognised
    pub fn parse_or_default(s: Option<&str>) -> Self {
        s.and_then(|s| s.parse().ok()).unwrap_or_default()
    }

    fn compare(&self, a: &ShoppingItem, b: &ShoppingItem) -> Ordering {
        let ordering = match self.field {
            SortField::Name => compare_text(&a.name, &b.name),
            SortField::Category => compare_text(
                a.category.as_deref().unwrap_or(""),
                b.category.as_deref().unwrap_or(""),
            ),
            SortField::Date => a.created_at.cmp(&b.created_at),
        };

        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Case- and accent-insensitive. Accents are folded for Latin letters only;
/// other scripts still compare by code point.
fn compare_text(a: &str, b: &str) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}

fn sort_key(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'à'..='å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'ď' => 'd',
        'è'..='ë' | 'ē' | 'ė' | 'ę' | 'ě' => 'e',
        'ì'..='ï' | 'ī' | 'į' => 'i',
        'ł' => 'l',
        'ñ' | 'ń' | 'ň' => 'n',
        'ò'..='ö' | 'ø' | 'ō' | 'ő' => 'o',
        'ř' => 'r',
        'ś' | 'š' => 's',
        'ť' => 't',
        'ù'..='ü' | 'ū' | 'ů' | 'ű' => 'u',
        'ý' | 'ÿ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        _ => c,
    }
}

/// Keep items whose name contains `term`, ignoring case. A blank term keeps
/// everything in its original order.
pub fn filter_by_name<'a, I>(items: I, term: &str) -> Vec<&'a ShoppingItem>
where
    I: IntoIterator<Item = &'a ShoppingItem>,
{
    let needle = term.trim().to_lowercase();
    items
        .into_iter()
        .filter(|item| needle.is_empty() || item.name.to_lowercase().contains(&needle))
        .collect()
}

/// Filter by name, then sort. The sort is stable, so items with equal keys
/// keep their cached order.
pub fn filter_and_sort<'a, I>(items: I, term: &str, spec: SortSpec) -> Vec<&'a ShoppingItem>
where
    I: IntoIterator<Item = &'a ShoppingItem>,
{
    let mut view = filter_by_name(items, term);
    view.sort_by(|a, b| spec.compare(a, b));
    view
}

/// Sum of quantities, shown on the public share page
pub fn total_quantity<'a, I>(items: I) -> u64
where
    I: IntoIterator<Item = &'a ShoppingItem>,
{
    items.into_iter().map(|item| u64::from(item.quantity)).sum()
}
