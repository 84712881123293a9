use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_AGE, MAX_TERM_YEARS, MIN_TERM_YEARS};
use crate::error::CoreError;

// ── Enumerations ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male = 0,
    Female = 1,
}

impl Gender {
    pub fn from_u8(v: u8) -> Result<Self, CoreError> {
        match v {
            0 => Ok(Gender::Male),
            1 => Ok(Gender::Female),
            other => Err(CoreError::InvalidEnumValue {
                field: "gender",
                value: other as u32,
            }),
        }
    }

    /// Parse the loose string forms accepted by the mortality indexing
    /// protocol and CSV loaders ("M"/"Male"/"0", "F"/"Female"/"1"/"2").
    pub fn from_str_loose(s: &str) -> Result<Self, CoreError> {
        match s {
            "M" | "Male" | "male" | "0" => Ok(Gender::Male),
            "F" | "Female" | "female" | "1" | "2" => Ok(Gender::Female),
            other => Err(CoreError::InvalidAttribute {
                attribute: "gender",
                detail: other.to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductType {
    Term = 0,
    WholeLife = 1,
    Endowment = 2,
}

impl ProductType {
    pub fn from_u8(v: u8) -> Result<Self, CoreError> {
        match v {
            0 => Ok(ProductType::Term),
            1 => Ok(ProductType::WholeLife),
            2 => Ok(ProductType::Endowment),
            other => Err(CoreError::InvalidEnumValue {
                field: "product_type",
                value: other as u32,
            }),
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s {
            "Term" | "0" => ProductType::Term,
            "WholeLife" | "1" => ProductType::WholeLife,
            _ => ProductType::Endowment,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnderwritingClass {
    Standard = 0,
    Smoker = 1,
    NonSmoker = 2,
    Preferred = 3,
    Substandard = 4,
}

impl UnderwritingClass {
    pub fn from_u8(v: u8) -> Result<Self, CoreError> {
        match v {
            0 => Ok(UnderwritingClass::Standard),
            1 => Ok(UnderwritingClass::Smoker),
            2 => Ok(UnderwritingClass::NonSmoker),
            3 => Ok(UnderwritingClass::Preferred),
            4 => Ok(UnderwritingClass::Substandard),
            other => Err(CoreError::InvalidEnumValue {
                field: "underwriting_class",
                value: other as u32,
            }),
        }
    }
}

// ── Policy ───────────────────────────────────────────────────────────────────

/// An immutable life-insurance policy record.
///
/// Once constructed via [`Policy::new`], a policy's fields never change —
/// the valuation kernel only ever reads through shared references.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Policy {
    pub policy_id: u64,
    pub age: u8,
    pub gender: Gender,
    pub sum_assured: f64,
    pub premium: f64,
    pub term: u8,
    pub product_type: ProductType,
    pub underwriting_class: UnderwritingClass,
    pub attributes: HashMap<String, String>,
}

impl Policy {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        policy_id: u64,
        age: u8,
        gender: Gender,
        sum_assured: f64,
        premium: f64,
        term: u8,
        product_type: ProductType,
        underwriting_class: UnderwritingClass,
    ) -> Result<Self, CoreError> {
        if age > MAX_AGE {
            return Err(CoreError::InvalidAttribute {
                attribute: "age",
                detail: format!("{age} exceeds maximum of {MAX_AGE}"),
            });
        }
        if sum_assured < 0.0 {
            return Err(CoreError::InvalidAttribute {
                attribute: "sum_assured",
                detail: "must be non-negative".into(),
            });
        }
        if premium < 0.0 {
            return Err(CoreError::InvalidAttribute {
                attribute: "premium",
                detail: "must be non-negative".into(),
            });
        }
        if term < MIN_TERM_YEARS || term > MAX_TERM_YEARS {
            return Err(CoreError::InvalidAttribute {
                attribute: "term",
                detail: format!("must be within [{MIN_TERM_YEARS}, {MAX_TERM_YEARS}]"),
            });
        }
        Ok(Self {
            policy_id,
            age,
            gender,
            sum_assured,
            premium,
            term,
            product_type,
            underwriting_class,
            attributes: HashMap::new(),
        })
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// A read-only collection of policies, loaded once per run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PolicySet {
    policies: Vec<Policy>,
}

impl PolicySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            policies: Vec::with_capacity(cap),
        }
    }

    pub fn add(&mut self, policy: Policy) {
        self.policies.push(policy);
    }

    pub fn get(&self, index: usize) -> Option<&Policy> {
        self.policies.get(index)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Policy> {
        self.policies.iter()
    }

    pub fn as_slice(&self) -> &[Policy] {
        &self.policies
    }
}

impl FromIterator<Policy> for PolicySet {
    fn from_iter<T: IntoIterator<Item = Policy>>(iter: T) -> Self {
        Self {
            policies: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PolicySet {
    type Item = &'a Policy;
    type IntoIter = std::slice::Iter<'a, Policy>;

    fn into_iter(self) -> Self::IntoIter {
        self.policies.iter()
    }
}
