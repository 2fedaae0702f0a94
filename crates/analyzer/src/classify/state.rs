//! Reference types and other mutable-state operations.

use super::{round_to, Category, Classifier, ClassifierRule, Tally};
use crate::types::ClassifiedOccurrence;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateCategory {
    Atoms,
    RefsStm,
    Agents,
    Vars,
    Volatiles,
    DelaysPromises,
    Transients,
}

impl Category for StateCategory {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Atoms => "atoms",
            Self::RefsStm => "refs_stm",
            Self::Agents => "agents",
            Self::Vars => "vars",
            Self::Volatiles => "volatiles",
            Self::DelaysPromises => "delays_promises",
            Self::Transients => "transients",
        }
    }

    fn weight(&self) -> u32 {
        match self {
            Self::Atoms => 2,
            Self::RefsStm => 4,
            Self::Agents => 3,
            Self::Vars => 1,
            Self::Volatiles => 2,
            Self::DelaysPromises => 2,
            Self::Transients => 1,
        }
    }
}

pub type StateOccurrence = ClassifiedOccurrence<StateCategory>;

const RULES: &[ClassifierRule<StateCategory>] = {
    use StateCategory::*;
    &[
        ClassifierRule::new("atom", "atom_creation", Atoms),
        ClassifierRule::new("swap!", "atom_swap", Atoms).mutating(),
        ClassifierRule::new("reset!", "atom_reset", Atoms).mutating(),
        ClassifierRule::new("compare-and-set!", "atom_cas", Atoms).mutating(),
        ClassifierRule::new("ref", "ref_creation", RefsStm),
        ClassifierRule::new("alter", "ref_alter", RefsStm).mutating(),
        ClassifierRule::new("ref-set", "ref_set", RefsStm).mutating(),
        ClassifierRule::new("commute", "ref_commute", RefsStm).mutating(),
        ClassifierRule::new("ensure", "ref_ensure", RefsStm),
        ClassifierRule::new("dosync", "stm_transaction", RefsStm),
        ClassifierRule::new("agent", "agent_creation", Agents),
        ClassifierRule::new("send", "agent_send", Agents).mutating(),
        ClassifierRule::new("send-off", "agent_send_off", Agents).mutating(),
        ClassifierRule::new("await", "agent_await", Agents),
        ClassifierRule::new("await-for", "agent_await_for", Agents),
        ClassifierRule::new("agent-error", "agent_error", Agents),
        ClassifierRule::new("restart-agent", "agent_restart", Agents).mutating(),
        ClassifierRule::new("set-error-handler!", "agent_error_handler", Agents),
        ClassifierRule::new("set-error-mode!", "agent_error_mode", Agents),
        ClassifierRule::new("def", "var_definition", Vars),
        ClassifierRule::new("defonce", "var_defonce", Vars),
        ClassifierRule::new("declare", "var_declare", Vars),
        ClassifierRule::new("alter-var-root", "var_alter", Vars).mutating(),
        ClassifierRule::new("with-redefs", "var_rebind_temp", Vars),
        ClassifierRule::new("binding", "var_binding", Vars),
        ClassifierRule::new("volatile!", "volatile_creation", Volatiles),
        ClassifierRule::new("vreset!", "volatile_reset", Volatiles).mutating(),
        ClassifierRule::new("vswap!", "volatile_swap", Volatiles).mutating(),
        ClassifierRule::new("delay", "delay_creation", DelaysPromises),
        ClassifierRule::new("force", "delay_force", DelaysPromises),
        ClassifierRule::new("promise", "promise_creation", DelaysPromises),
        ClassifierRule::new("deliver", "promise_deliver", DelaysPromises).mutating(),
        ClassifierRule::new("transient", "transient_creation", Transients),
        ClassifierRule::new("persistent!", "transient_persist", Transients),
        ClassifierRule::new("conj!", "transient_conj", Transients).mutating(),
        ClassifierRule::new("assoc!", "transient_assoc", Transients).mutating(),
        ClassifierRule::new("dissoc!", "transient_dissoc", Transients).mutating(),
    ]
};

pub(crate) static CLASSIFIER: Lazy<Classifier<StateCategory>> =
    Lazy::new(|| Classifier::new(RULES).expect("valid state keyword table"));

/// Aggregate state-management usage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSummary {
    pub total_operations: usize,
    pub categories: BTreeMap<String, usize>,
    pub has_state_management: bool,
    pub mutations: usize,
    pub mutation_ratio: f64,
    pub complexity_score: u32,
    pub state_intensity: f64,
    pub operation_types: Vec<String>,
}

impl StateSummary {
    pub fn from_occurrences(occurrences: &[StateOccurrence]) -> Self {
        let tally = Tally::of(occurrences);
        let mutation_ratio = if tally.total == 0 {
            0.0
        } else {
            round_to(tally.mutations as f64 / tally.total as f64, 2)
        };
        Self {
            total_operations: tally.total,
            categories: tally.categories,
            has_state_management: tally.total > 0,
            mutations: tally.mutations,
            mutation_ratio,
            complexity_score: tally.complexity_score,
            state_intensity: tally.intensity,
            operation_types: tally.pattern_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceText;
    use pretty_assertions::assert_eq;

    const CODE: &str = r#"(def counter (atom 0))

(defn bump! []
  (swap! counter inc)
  (dosync
    (alter accounts assoc :a 1)))"#;

    #[test]
    fn test_classifies_state_operations() {
        let source = SourceText::new(CODE);
        let found = CLASSIFIER.classify(&source, None);
        let types: Vec<_> = found.iter().map(|o| o.pattern_type.as_str()).collect();
        assert_eq!(
            types,
            vec![
                "var_definition",
                "atom_creation",
                "atom_swap",
                "stm_transaction",
                "ref_alter"
            ]
        );
        let mutating: Vec<_> = found.iter().filter(|o| o.is_mutation).map(|o| o.keyword.as_str()).collect();
        assert_eq!(mutating, vec!["swap!", "alter"]);
    }

    #[test]
    fn test_summary() {
        let source = SourceText::new(CODE);
        let summary = StateSummary::from_occurrences(&CLASSIFIER.classify(&source, None));
        assert_eq!(summary.total_operations, 5);
        assert_eq!(summary.mutations, 2);
        assert_eq!(summary.mutation_ratio, 0.4);
        // def 1, atom 2, swap! 2, dosync 4, alter 4
        assert_eq!(summary.complexity_score, 13);
        assert_eq!(summary.state_intensity, 2.6);
        assert_eq!(summary.categories["refs_stm"], 2);
    }

    #[test]
    fn test_empty_summary_has_zero_ratio() {
        let summary = StateSummary::from_occurrences(&[]);
        assert_eq!(summary.mutation_ratio, 0.0);
        assert!(!summary.has_state_management);
    }
}
