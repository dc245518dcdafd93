//! Fee calculation for a single student.
//!
//! Picks each head's amount for the student's class, zeroes tuition and
//! development fees for SC/ST students, and totals the heads by the fund they
//! are tagged with.

use crate::core::fee_structure::{FeeHead, FundType};

/// Head ids that SC/ST students are exempt from (tuition, development).
pub const EXEMPT_HEAD_IDS: [u32; 2] = [2, 3];

/// Caste categories eligible for the exemption.
const EXEMPT_CASTES: [&str; 2] = ["sc", "st"];

/// Which column of a fee head applies to a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassBucket {
    /// Class 9
    Class9,
    /// Class 10
    Class10,
    /// Class 11, arts or commerce
    Class11ArtsCommerce,
    /// Class 11, science
    Class11Science,
    /// Class 12, arts or commerce
    Class12ArtsCommerce,
    /// Class 12, science
    Class12Science,
}

impl ClassBucket {
    /// Maps a class label such as `"9"`, `"X"`, `"10th"`, `"11 Science"` or
    /// `"class 12-commerce"` onto its bucket. `None` if the label names no
    /// class from 9 to 12.
    #[must_use]
    pub fn parse_class_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_lowercase();
        let normalized = normalized.strip_prefix("class").unwrap_or(&normalized);
        let mut parts = normalized
            .split(|c: char| c.is_whitespace() || c == '-' || c == '_' || c == '/')
            .filter(|p| !p.is_empty());
        let grade = parts.next().map(strip_ordinal)?;
        let science = parts.any(|p| p.starts_with("sci"));

        match (grade, science) {
            ("9" | "ix", _) => Some(Self::Class9),
            ("10" | "x", _) => Some(Self::Class10),
            ("11" | "xi", false) => Some(Self::Class11ArtsCommerce),
            ("11" | "xi", true) => Some(Self::Class11Science),
            ("12" | "xii", false) => Some(Self::Class12ArtsCommerce),
            ("12" | "xii", true) => Some(Self::Class12Science),
            _ => None,
        }
    }

    /// Like [`ClassBucket::parse_class_label`], with anything unrecognised
    /// charged as class 9.
    #[must_use]
    pub fn from_class_label(label: &str) -> Self {
        Self::parse_class_label(label).unwrap_or(Self::Class9)
    }

    /// Bucket for an admission's stored class and stream.
    #[must_use]
    pub fn for_admission(class_name: &str, stream: Option<&str>) -> Self {
        match stream {
            Some(stream) => Self::from_class_label(&format!("{class_name} {stream}")),
            None => Self::from_class_label(class_name),
        }
    }
}

/// `"10th"` -> `"10"`. Roman numerals and bare numbers pass through.
fn strip_ordinal(grade: &str) -> &str {
    ["th", "st", "nd", "rd"]
        .iter()
        .find_map(|suffix| grade.strip_suffix(*suffix))
        .filter(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(grade)
}

/// Whether a caste category is exempt from tuition and development fees.
#[must_use]
pub fn is_exempt_caste(caste: &str) -> bool {
    let caste = caste.trim().to_lowercase();
    EXEMPT_CASTES.contains(&caste.as_str())
}

/// One head on a student's bill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeLine {
    /// Head id
    pub id: u32,
    /// English name
    pub name: String,
    /// Hindi name
    pub name_hi: String,
    /// Amount charged, in whole rupees
    pub amount: u32,
    /// Whether the amount was zeroed by the caste exemption
    pub exempted: bool,
}

/// A student's bill split by fund.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeeBreakdown {
    /// Student Fund lines, in head order
    pub student_fund_items: Vec<FeeLine>,
    /// Development Fund lines, in head order
    pub development_fund_items: Vec<FeeLine>,
    /// Sum of the Student Fund lines
    pub student_fund_total: u64,
    /// Sum of the Development Fund lines
    pub development_fund_total: u64,
    /// Sum of both funds
    pub total_fee: u64,
}

impl FeeBreakdown {
    /// Every line, Student Fund first.
    pub fn all_items(&self) -> impl Iterator<Item = &FeeLine> {
        self.student_fund_items
            .iter()
            .chain(self.development_fund_items.iter())
    }
}

/// Computes the fees a student pays.
#[must_use]
pub fn calculate_fees(student_class: &str, caste: &str, heads: &[FeeHead]) -> FeeBreakdown {
    calculate_fees_for_bucket(ClassBucket::from_class_label(student_class), caste, heads)
}

/// Same as [`calculate_fees`] with the class bucket already decided.
#[must_use]
pub fn calculate_fees_for_bucket(
    bucket: ClassBucket,
    caste: &str,
    heads: &[FeeHead],
) -> FeeBreakdown {
    let exempt = is_exempt_caste(caste);
    let mut breakdown = FeeBreakdown::default();

    for head in heads {
        let exempted = exempt && EXEMPT_HEAD_IDS.contains(&head.id);
        let amount = if exempted { 0 } else { head.amounts.get(bucket) };
        let line = FeeLine {
            id: head.id,
            name: head.name.clone(),
            name_hi: head.name_hi.clone(),
            amount,
            exempted,
        };
        match head.fund {
            FundType::StudentFund => {
                breakdown.student_fund_total += u64::from(amount);
                breakdown.student_fund_items.push(line);
            }
            FundType::DevelopmentFund => {
                breakdown.development_fund_total += u64::from(amount);
                breakdown.development_fund_items.push(line);
            }
        }
    }

    breakdown.total_fee = breakdown.student_fund_total + breakdown.development_fund_total;
    breakdown
}
