use std::sync::LazyLock;

use goldrock_core::models::tree::DecisionTree;

use super::{decision, outcome, with_info};

pub const ID: &str = "acute_chest_pain";

/// Acute chest pain with inferior ST elevation.
/// Best route: ECG within 10 minutes, then primary PCI (3 nodes).
pub fn tree() -> &'static DecisionTree {
    static TREE: LazyLock<DecisionTree> = LazyLock::new(|| DecisionTree {
        id: ID.to_string(),
        title: "Acute Chest Pain".to_string(),
        specialty: "emergency_medicine".to_string(),
        category: "cardiology".to_string(),
        difficulty: 2,
        root_node_id: "presentation".to_string(),
        optimal_path_length: Some(3),
        nodes: vec![
            with_info(
                decision(
                    "presentation",
                    "Presentation",
                    "A 58-year-old man arrives with 40 minutes of crushing central chest \
                     pain radiating to the jaw. He is diaphoretic. BP 138/86, HR 92.",
                    &[
                        ("Obtain a 12-lead ECG within 10 minutes", "ecg"),
                        ("Order a chest X-ray and wait for the result", "cxr"),
                        ("Reassure and discharge with antacids", "discharged"),
                    ],
                ),
                "History: smoker, type 2 diabetes, hypertension.",
            ),
            decision(
                "cxr",
                "Chest X-ray",
                "The chest X-ray is unremarkable. Twenty-five minutes have passed and \
                 the pain persists.",
                &[
                    ("Obtain a 12-lead ECG now", "ecg"),
                    ("Discharge with outpatient follow-up", "discharged"),
                ],
            ),
            decision(
                "ecg",
                "ECG",
                "The ECG shows 3 mm ST elevation in II, III and aVF with reciprocal \
                 depression in I and aVL. A PCI-capable lab is on site.",
                &[
                    ("Activate the cath lab for primary PCI", "primary_pci"),
                    ("Give thrombolysis", "thrombolysis"),
                    ("Repeat troponin in 3 hours before deciding", "troponin_delay"),
                ],
            ),
            outcome(
                "primary_pci",
                "Primary PCI",
                "The right coronary artery is stented with a door-to-balloon time of \
                 62 minutes.",
                true,
                "Inferior STEMI with an on-site lab: primary PCI within 90 minutes is \
                 the reperfusion strategy of choice.",
            ),
            outcome(
                "thrombolysis",
                "Thrombolysis",
                "Thrombolysis is given. The patient reperfuses but needs transfer for \
                 angiography the next day.",
                false,
                "Thrombolysis is reserved for when PCI cannot be delivered within 120 \
                 minutes. Here the lab was available.",
            ),
            outcome(
                "troponin_delay",
                "Delayed reperfusion",
                "While waiting for troponin the patient develops complete heart block.",
                false,
                "ST elevation meeting STEMI criteria needs immediate reperfusion; \
                 troponin adds nothing to the decision.",
            ),
            outcome(
                "discharged",
                "Missed STEMI",
                "The patient re-presents six hours later in cardiogenic shock.",
                false,
                "Every patient with possible ACS needs an ECG within 10 minutes of \
                 arrival.",
            ),
        ],
    });
    &TREE
}
