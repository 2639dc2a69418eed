use std::sync::LazyLock;

use goldrock_core::models::tree::DecisionTree;

use super::{decision, outcome};

pub const ID: &str = "septic_shock";

/// Septic shock from a urinary source. No nominal path length; scoring
/// self-normalizes.
pub fn tree() -> &'static DecisionTree {
    static TREE: LazyLock<DecisionTree> = LazyLock::new(|| DecisionTree {
        id: ID.to_string(),
        title: "Suspected Septic Shock".to_string(),
        specialty: "internal_medicine".to_string(),
        category: "infectious_disease".to_string(),
        difficulty: 3,
        root_node_id: "triage".to_string(),
        optimal_path_length: None,
        nodes: vec![
            decision(
                "triage",
                "Triage",
                "A 72-year-old woman is brought in confused. T 38.9 °C, HR 118, \
                 BP 84/50, RR 26. Her daughter reports dysuria for three days.",
                &[
                    (
                        "Start the sepsis bundle: cultures, lactate, antibiotics, 30 mL/kg fluid",
                        "bundle",
                    ),
                    ("Order a CT head for the confusion first", "ct_head"),
                ],
            ),
            decision(
                "ct_head",
                "CT head",
                "The CT head is unremarkable. Ninety minutes have passed; BP is now 78/40.",
                &[
                    ("Start the sepsis bundle now", "bundle"),
                    ("Admit to the ward for observation", "ward"),
                ],
            ),
            decision(
                "bundle",
                "Reassessment",
                "After 2 L of crystalloid the MAP is 58 mmHg and lactate is 4.8 mmol/L.",
                &[
                    ("Start norepinephrine and refer to ICU", "icu"),
                    ("Give a further 3 L fluid bolus", "fluid_overload"),
                ],
            ),
            outcome(
                "icu",
                "ICU with vasopressors",
                "MAP rises above 65 on norepinephrine and lactate clears over 12 hours.",
                true,
                "Hypotension persisting after adequate fluid resuscitation defines \
                 septic shock and calls for vasopressors.",
            ),
            outcome(
                "fluid_overload",
                "Pulmonary oedema",
                "She develops pulmonary oedema and needs non-invasive ventilation.",
                false,
                "Further fluid without reassessing responsiveness risks overload; \
                 start vasopressors once MAP stays below 65.",
            ),
            outcome(
                "ward",
                "Deterioration on the ward",
                "A rapid response call is made two hours later for a MAP of 50.",
                false,
                "Delaying antibiotics in septic shock raises mortality with every hour.",
            ),
        ],
    });
    &TREE
}
