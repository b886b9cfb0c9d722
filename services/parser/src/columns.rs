//! Header label → semantic field identification
//!
//! Labels are free text written by people, mostly in Japanese business
//! spreadsheets. Matching is deliberately loose: a label matches a synonym when
//! they are equal or either one contains the other. Short synonyms therefore
//! produce false positives ("username" reads as a product column); the tests
//! below pin that behavior.

use serde::Serialize;

/// The four columns the dashboard understands. Declaration order is the
/// matching order: the first field with a matching synonym wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SemanticField {
    Product,
    LastYear,
    Target,
    Actual,
}

impl SemanticField {
    pub const ALL: [SemanticField; 4] = [
        SemanticField::Product,
        SemanticField::LastYear,
        SemanticField::Target,
        SemanticField::Actual,
    ];

    /// Lowercase synonyms, tried in order.
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            SemanticField::Product => PRODUCT_SYNONYMS,
            SemanticField::LastYear => LAST_YEAR_SYNONYMS,
            SemanticField::Target => TARGET_SYNONYMS,
            SemanticField::Actual => ACTUAL_SYNONYMS,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            SemanticField::Product => "product",
            SemanticField::LastYear => "lastYear",
            SemanticField::Target => "target",
            SemanticField::Actual => "actual",
        }
    }
}

const PRODUCT_SYNONYMS: &[&str] = &[
    "商品名", "主力商品名", "商品", "product", "name", "品名", "アイテム", "item", "製品名", "製品",
];
const LAST_YEAR_SYNONYMS: &[&str] = &[
    "前年", "前年売上", "昨年", "last_year", "previous", "前年度", "昨年度", "去年",
];
const TARGET_SYNONYMS: &[&str] = &[
    "予定", "目標", "予算", "target", "plan", "計画", "目標値", "予定値", "budget",
];
const ACTUAL_SYNONYMS: &[&str] = &[
    "実績", "売上", "実売", "actual", "sales", "実績値", "売上実績", "成果", "結果",
];

/// Find the semantic field a header label refers to, if any.
pub fn identify_column(header: &str) -> Option<SemanticField> {
    let normalized = header.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    SemanticField::ALL.into_iter().find(|field| {
        field.synonyms().iter().any(|synonym| {
            normalized == *synonym || normalized.contains(synonym) || synonym.contains(normalized.as_str())
        })
    })
}

/// Semantic field → zero-based column index within the grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMap {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_year: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<usize>,
}

impl ColumnMap {
    pub fn get(&self, field: SemanticField) -> Option<usize> {
        match field {
            SemanticField::Product => self.product,
            SemanticField::LastYear => self.last_year,
            SemanticField::Target => self.target,
            SemanticField::Actual => self.actual,
        }
    }

    /// Assign a column; a later assignment for the same field replaces the earlier one.
    pub fn set(&mut self, field: SemanticField, column: usize) {
        let slot = match field {
            SemanticField::Product => &mut self.product,
            SemanticField::LastYear => &mut self.last_year,
            SemanticField::Target => &mut self.target,
            SemanticField::Actual => &mut self.actual,
        };
        *slot = Some(column);
    }

    pub fn has_product(&self) -> bool {
        self.product.is_some()
    }

    /// How many of last year / target / actual are mapped.
    pub fn figure_columns(&self) -> usize {
        [self.last_year, self.target, self.actual]
            .iter()
            .filter(|c| c.is_some())
            .count()
    }
}
