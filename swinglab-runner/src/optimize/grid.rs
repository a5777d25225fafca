//! Parameter sets and cartesian grid enumeration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ids::ParamSetId;

/// One algo parameter value. Untagged so TOML scalars deserialize
/// naturally: `true`, `8`, `0.7`, `"swing"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Str(v) => f.write_str(v),
        }
    }
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            ParamValue::Int(v) => Some(v as f64),
            ParamValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_usize(&self) -> Option<usize> {
        match *self {
            ParamValue::Int(v) if v >= 0 => Some(v as usize),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            ParamValue::Bool(v) => Some(v),
            _ => None,
        }
    }
}

/// Parameter space: each key maps to the candidate values to trial.
/// BTreeMap keeps enumeration lexicographic by key name.
pub type ParamSpace = BTreeMap<String, Vec<ParamValue>>;

/// An immutable set of algo parameters with a content-addressed id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSet {
    pub id: ParamSetId,
    params: BTreeMap<String, ParamValue>,
}

impl ParamSet {
    pub fn new(params: BTreeMap<String, ParamValue>) -> Self {
        let canonical = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(";");
        Self {
            id: ParamSetId::from_bytes(canonical.as_bytes()),
            params,
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    pub fn f64_or(&self, key: &str, default: f64) -> f64 {
        self.get(key).and_then(ParamValue::as_f64).unwrap_or(default)
    }

    pub fn usize_or(&self, key: &str, default: usize) -> usize {
        self.get(key).and_then(ParamValue::as_usize).unwrap_or(default)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(ParamValue::as_bool).unwrap_or(default)
    }

    /// Key-sorted iteration, for deterministic CSV emission.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.params.iter()
    }

    /// Canonical `k=v;k=v` rendering used in exports.
    pub fn render(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Cartesian product of the space, lexicographic by key name and then by
/// value order within each list. Deterministic by construction.
pub fn enumerate_space(space: &ParamSpace) -> Vec<ParamSet> {
    let keys: Vec<&String> = space.keys().collect();
    let lists: Vec<&Vec<ParamValue>> = space.values().collect();
    if lists.iter().any(|l| l.is_empty()) {
        return Vec::new();
    }

    let total: usize = lists.iter().map(|l| l.len()).product();
    let mut sets = Vec::with_capacity(total);
    let mut indices = vec![0usize; keys.len()];

    for _ in 0..total {
        let params: BTreeMap<String, ParamValue> = keys
            .iter()
            .enumerate()
            .map(|(pos, &k)| (k.clone(), lists[pos][indices[pos]].clone()))
            .collect();
        sets.push(ParamSet::new(params));

        // Odometer: the last key cycles fastest.
        for pos in (0..indices.len()).rev() {
            indices[pos] += 1;
            if indices[pos] < lists[pos].len() {
                break;
            }
            indices[pos] = 0;
        }
    }

    sets
}
