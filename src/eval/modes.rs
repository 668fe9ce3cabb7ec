//! Evaluation modes and per-mention judgement types.
//!
//! # The Three Strictness Policies
//!
//! Benchmarks annotate mentions the system cannot reasonably be required to
//! link: quantities, dates, explicitly optional mentions, and mentions whose
//! referent is unknown ("Unknown" sentinel entities). The three modes differ
//! in what they demand for those:
//!
//! | Mode | Optional labels | Unknown ground truth |
//! |------|-----------------|----------------------|
//! | `Ignored` | contribute nothing | contribute nothing ("in-KB" scoring) |
//! | `Optional` | skipped only if unmatched | always required |
//! | `Required` | must be matched | must be matched |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Strictness policy for optional and unknown ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalMode {
    /// "In-KB" scoring: unknown ground truth and optional labels contribute
    /// nothing.
    Ignored,
    /// Optional labels may be skipped only if unmatched; unknown ground
    /// truth is always required.
    Optional,
    /// Everything must be matched.
    Required,
}

impl EvalMode {
    /// All modes, in reporting order.
    pub const ALL: [EvalMode; 3] = [EvalMode::Ignored, EvalMode::Optional, EvalMode::Required];

    /// Stable label for reports.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            EvalMode::Ignored => "ignored",
            EvalMode::Optional => "optional",
            EvalMode::Required => "required",
        }
    }

    fn index(self) -> usize {
        match self {
            EvalMode::Ignored => 0,
            EvalMode::Optional => 1,
            EvalMode::Required => 2,
        }
    }
}

impl fmt::Display for EvalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Per-mention judgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EvalType {
    /// True positive.
    TP,
    /// False positive.
    FP,
    /// False negative.
    FN,
}

/// A small set of [`EvalType`] values.
///
/// Stored as a fixed-size bitset; serialized as a list of names so dumped
/// cases stay readable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EvalTypeSet(u8);

impl EvalTypeSet {
    /// The empty set (the mention contributes nothing in this mode).
    pub const EMPTY: EvalTypeSet = EvalTypeSet(0);

    fn bit(t: EvalType) -> u8 {
        match t {
            EvalType::TP => 1,
            EvalType::FP => 2,
            EvalType::FN => 4,
        }
    }

    /// Build a set from the given types.
    #[must_use]
    pub fn of(types: &[EvalType]) -> Self {
        let mut set = EvalTypeSet::EMPTY;
        for &t in types {
            set.insert(t);
        }
        set
    }

    /// Insert a judgement.
    pub fn insert(&mut self, t: EvalType) {
        self.0 |= Self::bit(t);
    }

    /// True if the judgement is in the set.
    #[must_use]
    pub fn contains(&self, t: EvalType) -> bool {
        self.0 & Self::bit(t) != 0
    }

    /// True if the mention contributes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate the contained judgements in TP, FP, FN order.
    pub fn iter(&self) -> impl Iterator<Item = EvalType> + '_ {
        [EvalType::TP, EvalType::FP, EvalType::FN]
            .into_iter()
            .filter(|&t| self.contains(t))
    }
}

impl FromIterator<EvalType> for EvalTypeSet {
    fn from_iter<I: IntoIterator<Item = EvalType>>(iter: I) -> Self {
        let mut set = EvalTypeSet::EMPTY;
        for t in iter {
            set.insert(t);
        }
        set
    }
}

impl Serialize for EvalTypeSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for EvalTypeSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let types = Vec::<EvalType>::deserialize(deserializer)?;
        Ok(types.into_iter().collect())
    }
}

/// A value per evaluation mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerMode<T> {
    /// Value under [`EvalMode::Ignored`].
    pub ignored: T,
    /// Value under [`EvalMode::Optional`].
    pub optional: T,
    /// Value under [`EvalMode::Required`].
    pub required: T,
}

impl<T> Index<EvalMode> for PerMode<T> {
    type Output = T;

    fn index(&self, mode: EvalMode) -> &T {
        match mode.index() {
            0 => &self.ignored,
            1 => &self.optional,
            _ => &self.required,
        }
    }
}

impl<T> IndexMut<EvalMode> for PerMode<T> {
    fn index_mut(&mut self, mode: EvalMode) -> &mut T {
        match mode.index() {
            0 => &mut self.ignored,
            1 => &mut self.optional,
            _ => &mut self.required,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_operations() {
        let mut set = EvalTypeSet::EMPTY;
        assert!(set.is_empty());
        set.insert(EvalType::TP);
        set.insert(EvalType::FN);
        assert!(set.contains(EvalType::TP));
        assert!(!set.contains(EvalType::FP));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![EvalType::TP, EvalType::FN]);
    }

    #[test]
    fn test_set_serde_roundtrip() {
        let set = EvalTypeSet::of(&[EvalType::FN, EvalType::FP]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["FP","FN"]"#);
        let back: EvalTypeSet = serde_json::from_str(&json).unwrap();
        assert_eq!(set, back);
    }

    #[test]
    fn test_per_mode_indexing() {
        let mut per_mode: PerMode<u32> = PerMode::default();
        per_mode[EvalMode::Optional] = 7;
        assert_eq!(per_mode[EvalMode::Ignored], 0);
        assert_eq!(per_mode[EvalMode::Optional], 7);
        for mode in EvalMode::ALL {
            let _ = per_mode[mode];
        }
    }
}
