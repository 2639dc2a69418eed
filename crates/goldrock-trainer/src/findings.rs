//! Rule-based clinical findings for teaching cases.
//!
//! Maps a free-text diagnosis to canned history, examination, laboratory and
//! imaging text. Rules are checked in order and the first rule with a
//! keyword contained in the diagnosis wins; matching is case-insensitive.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClinicalFindings {
    pub diagnosis: String,
    /// Id of the rule that produced the text, `None` for the generic fallback.
    pub rule_id: Option<String>,
    pub history: String,
    pub physical_exam: String,
    pub labs: Vec<String>,
    pub imaging: Vec<String>,
}

struct FindingsRule {
    id: &'static str,
    keywords: &'static [&'static str],
    history: &'static str,
    physical_exam: &'static str,
    labs: &'static [&'static str],
    imaging: &'static [&'static str],
}

static RULES: LazyLock<Vec<FindingsRule>> = LazyLock::new(|| {
    vec![
        FindingsRule {
            id: "acute_coronary_syndrome",
            keywords: &["myocardial infarction", "stemi", "acute coronary", "mi", "angina"],
            history: "Central chest pressure radiating to the left arm or jaw, with \
                      diaphoresis and nausea. Risk factors include smoking, diabetes and \
                      hypertension.",
            physical_exam: "Anxious and diaphoretic. Tachycardic; heart sounds normal \
                            without murmur. Lungs clear.",
            labs: &[
                "High-sensitivity troponin elevated and rising",
                "CK-MB elevated",
                "Lipid panel: LDL 4.2 mmol/L",
            ],
            imaging: &[
                "ECG: ST elevation in contiguous leads",
                "Echocardiogram: regional wall motion abnormality",
            ],
        },
        FindingsRule {
            id: "pneumonia",
            keywords: &["pneumonia", "lower respiratory"],
            history: "Three days of productive cough, fever and pleuritic chest pain with \
                      increasing breathlessness.",
            physical_exam: "Febrile and tachypnoeic. Dullness to percussion with bronchial \
                            breathing and crackles at the right base.",
            labs: &[
                "WBC 16.2 x10^9/L with neutrophilia",
                "CRP 182 mg/L",
                "Urea 8.1 mmol/L",
            ],
            imaging: &["Chest X-ray: right lower lobe consolidation"],
        },
        FindingsRule {
            id: "diabetic_ketoacidosis",
            keywords: &["ketoacidosis", "dka"],
            history: "Two days of polyuria, polydipsia, abdominal pain and vomiting in a \
                      patient with type 1 diabetes who missed insulin doses.",
            physical_exam: "Dehydrated with dry mucous membranes. Kussmaul respiration and a \
                            ketotic breath odour.",
            labs: &[
                "Glucose 28 mmol/L",
                "Venous pH 7.12, bicarbonate 9 mmol/L",
                "Blood ketones 5.8 mmol/L",
                "Potassium 5.6 mmol/L",
            ],
            imaging: &[],
        },
        FindingsRule {
            id: "stroke",
            keywords: &["stroke", "cerebrovascular", "cva"],
            history: "Sudden onset of right-sided weakness and slurred speech 90 minutes \
                      ago, witnessed by family.",
            physical_exam: "Right facial droop, right arm and leg weakness (power 2/5) and \
                            expressive dysphasia. NIHSS 14.",
            labs: &["Capillary glucose 6.4 mmol/L", "INR 1.0", "Platelets 240 x10^9/L"],
            imaging: &[
                "Non-contrast CT head: no haemorrhage",
                "CT angiogram: left M1 occlusion",
            ],
        },
        FindingsRule {
            id: "appendicitis",
            keywords: &["appendicitis"],
            history: "Periumbilical pain migrating to the right iliac fossa over 18 hours, \
                      with anorexia and one episode of vomiting.",
            physical_exam: "Low-grade fever. Tenderness and guarding at McBurney's point \
                            with a positive Rovsing's sign.",
            labs: &["WBC 14.1 x10^9/L", "CRP 64 mg/L", "Urinalysis negative"],
            imaging: &["Ultrasound: non-compressible appendix, 9 mm diameter"],
        },
        FindingsRule {
            id: "sepsis",
            keywords: &["sepsis", "septic"],
            history: "Fever, rigors and confusion developing over 24 hours, with a \
                      suspected urinary or respiratory source.",
            physical_exam: "Febrile, tachycardic and hypotensive, with delayed capillary \
                            refill and mottled peripheries.",
            labs: &[
                "Lactate 4.8 mmol/L",
                "WBC 21 x10^9/L",
                "Creatinine 168 umol/L",
                "Blood cultures pending",
            ],
            imaging: &["Chest X-ray: no focal consolidation"],
        },
    ]
});

const GENERIC_LABS: &[&str] = &["Full blood count", "Urea and electrolytes", "CRP"];

/// Produce findings for a diagnosis.
///
/// Single-word keywords such as `mi` only match whole words, so
/// "mitral stenosis" does not trigger the coronary rule.
pub fn clinical_findings(diagnosis: &str) -> ClinicalFindings {
    let normalized = diagnosis.trim().to_lowercase();

    let Some(rule) = RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| matches_keyword(&normalized, k)))
    else {
        return generic(diagnosis.trim());
    };

    ClinicalFindings {
        diagnosis: diagnosis.trim().to_string(),
        rule_id: Some(rule.id.to_string()),
        history: rule.history.to_string(),
        physical_exam: rule.physical_exam.to_string(),
        labs: rule.labs.iter().map(|s| s.to_string()).collect(),
        imaging: rule.imaging.iter().map(|s| s.to_string()).collect(),
    }
}

fn matches_keyword(diagnosis: &str, keyword: &str) -> bool {
    if keyword.contains(' ') {
        return diagnosis.contains(keyword);
    }
    diagnosis
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == keyword)
}

fn generic(diagnosis: &str) -> ClinicalFindings {
    let label = if diagnosis.is_empty() {
        "the presenting condition"
    } else {
        diagnosis
    };
    ClinicalFindings {
        diagnosis: diagnosis.to_string(),
        rule_id: None,
        history: format!("The patient presents with symptoms consistent with {label}."),
        physical_exam: format!("Examination findings are in keeping with {label}."),
        labs: GENERIC_LABS.iter().map(|s| s.to_string()).collect(),
        imaging: Vec::new(),
    }
}
