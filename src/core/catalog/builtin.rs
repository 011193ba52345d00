//! Built-in rule definitions and rule sets
//!
//! Criteria are simplified renditions of the 2011 Meaningful Use measures:
//! the populations, measure codes and plan groupings are the reported ones,
//! the code lists cover the common cases.

use crate::domain::{
    Criterion, EntryKind, MeasureCodes, Numerator, Plan, PlanId, Population, RuleAction,
    RuleCategory, RuleDefinition, RuleId, RuleSet, RuleSetId, VitalField, Window,
};

pub const CQM_2011: &str = "cqm_2011";
pub const AMC_2011: &str = "amc_2011";

const DIABETES: &[&str] = &["ICD9:250*"];
const HYPERTENSION: &[&str] = &["ICD9:401*", "ICD9:402*", "ICD9:403*", "ICD9:404*"];
const PREGNANCY: &[&str] = &["ICD9:V22*", "ICD9:V23*"];
const INFLUENZA_VACCINES: &[&str] = &[
    "CVX:15", "CVX:16", "CVX:88", "CVX:111", "CVX:135", "CVX:140", "CVX:141",
];
const PNEUMOCOCCAL_VACCINES: &[&str] = &["CVX:33", "CVX:100", "CVX:109", "CVX:133"];

fn codes(pqri: Option<&str>, nqf: Option<&str>, amc: Option<&str>) -> MeasureCodes {
    MeasureCodes {
        pqri: pqri.map(str::to_string),
        nqf: nqf.map(str::to_string),
        amc: amc.map(str::to_string),
    }
}

fn numerator(label: &str, criterion: Criterion) -> Numerator {
    Numerator {
        label: label.to_string(),
        criterion,
    }
}

/// A single-population rule
fn simple_population(
    initial: Criterion,
    denominator: Criterion,
    exclusion: Option<Criterion>,
    numerator_criterion: Criterion,
) -> Vec<Population> {
    vec![Population {
        label: String::new(),
        initial,
        denominator,
        exclusion,
        numerators: vec![numerator("", numerator_criterion)],
    }]
}

fn cqm(id: &'static str, title: &str, codes: MeasureCodes, populations: Vec<Population>) -> RuleDefinition {
    RuleDefinition {
        id: RuleId::from_static(id),
        category: RuleCategory::Cqm,
        title: title.to_string(),
        codes,
        populations,
        actions: Vec::new(),
    }
}

fn amc(id: &'static str, title: &str, code: &str, populations: Vec<Population>) -> RuleDefinition {
    RuleDefinition {
        id: RuleId::from_static(id),
        category: RuleCategory::Amc,
        title: title.to_string(),
        codes: codes(None, None, Some(code)),
        populations,
        actions: Vec::new(),
    }
}

fn adult_with_visits(visits: usize) -> Criterion {
    Criterion::all(vec![Criterion::age(Some(18), None), Criterion::encounters(visits)])
}

fn diabetic_adult() -> Criterion {
    Criterion::all(vec![
        Criterion::age(Some(18), Some(75)),
        Criterion::entry(EntryKind::Problem, DIABETES, Window::ActiveInPeriod),
        Criterion::encounters(1),
    ])
}

fn diabetes_exclusion() -> Criterion {
    Criterion::entry(
        EntryKind::Problem,
        &["ICD9:256.4", "ICD9:648.8*", "ICD9:249*", "ICD9:251.8", "ICD9:962.0"],
        Window::ActiveInPeriod,
    )
}

fn bmi_between(min: f64, max: f64) -> Criterion {
    Criterion::Vital {
        field: VitalField::Bmi,
        window: Window::MonthsBeforeEnd(6),
        min: Some(min),
        max: Some(max),
    }
}

fn vital_max(field: VitalField, max: f64) -> Criterion {
    Criterion::Vital {
        field,
        window: Window::MeasurementPeriod,
        min: None,
        max: Some(max),
    }
}

/// Clinical quality measure rules
pub fn cqm_rules() -> Vec<RuleDefinition> {
    let tobacco_user =
        Criterion::entry(EntryKind::Tobacco, &["current*"], Window::MonthsBeforeEnd(24));
    let cessation_counseling = Criterion::entry(
        EntryKind::Intervention,
        &["tobacco_counseling*"],
        Window::MonthsBeforeEnd(24),
    );
    let cessation_medication = Criterion::entry(
        EntryKind::Medication,
        &["RXNORM:151226", "RXNORM:198029", "RXNORM:636671"],
        Window::MonthsBeforeEnd(24),
    );
    let weight_follow_up =
        Criterion::entry(EntryKind::Intervention, &["wt_followup*"], Window::MonthsBeforeEnd(6));

    let mut tobacco_cessation = cqm(
        "rule_tob_cess_inter_cqm",
        "Tobacco Use Assessment and Cessation: Cessation Intervention",
        codes(Some("115"), Some("0028b"), None),
        simple_population(
            adult_with_visits(2),
            tobacco_user,
            None,
            Criterion::any(vec![cessation_counseling.clone(), cessation_medication.clone()]),
        ),
    );
    tobacco_cessation.actions = vec![
        RuleAction {
            category: "Intervention".to_string(),
            item: "Tobacco Cessation Counseling".to_string(),
            criterion: cessation_counseling,
        },
        RuleAction {
            category: "Medication".to_string(),
            item: "Tobacco Cessation Pharmacotherapy".to_string(),
            criterion: cessation_medication,
        },
    ];

    vec![
        cqm(
            "rule_htn_bp_measure_cqm",
            "Hypertension: Blood Pressure Measurement",
            codes(None, Some("0013"), None),
            simple_population(
                Criterion::all(vec![
                    Criterion::age(Some(18), None),
                    Criterion::entry(EntryKind::Problem, HYPERTENSION, Window::ActiveInPeriod),
                    Criterion::encounters(2),
                ]),
                Criterion::Always,
                None,
                Criterion::all(vec![
                    Criterion::vital(VitalField::Bps, Window::MeasurementPeriod),
                    Criterion::vital(VitalField::Bpd, Window::MeasurementPeriod),
                ]),
            ),
        ),
        cqm(
            "rule_tob_use_assess_cqm",
            "Tobacco Use Assessment and Cessation: Tobacco Use Assessment",
            codes(Some("114"), Some("0028a"), None),
            simple_population(
                adult_with_visits(2),
                Criterion::Always,
                None,
                Criterion::entry(EntryKind::Tobacco, &[], Window::MonthsBeforeEnd(24)),
            ),
        ),
        tobacco_cessation,
        cqm(
            "rule_adult_wt_screen_fu_cqm",
            "Adult Weight Screening and Follow-Up",
            codes(Some("128"), Some("0421"), None),
            vec![
                Population {
                    label: "Population Criteria 1".to_string(),
                    initial: adult_with_visits(1),
                    denominator: Criterion::age(Some(65), None),
                    exclusion: Some(Criterion::entry(
                        EntryKind::Problem,
                        PREGNANCY,
                        Window::ActiveInPeriod,
                    )),
                    numerators: vec![numerator(
                        "Numerator 1",
                        Criterion::any(vec![bmi_between(22.0, 30.0), weight_follow_up.clone()]),
                    )],
                },
                Population {
                    label: "Population Criteria 2".to_string(),
                    initial: adult_with_visits(1),
                    denominator: Criterion::age(Some(18), Some(64)),
                    exclusion: Some(Criterion::entry(
                        EntryKind::Problem,
                        PREGNANCY,
                        Window::ActiveInPeriod,
                    )),
                    numerators: vec![numerator(
                        "Numerator 2",
                        Criterion::any(vec![bmi_between(18.5, 25.0), weight_follow_up]),
                    )],
                },
            ],
        ),
        cqm(
            "rule_influenza_ge_50_cqm",
            "Preventive Care and Screening: Influenza Immunization for Patients >= 50 Years Old",
            codes(Some("110"), Some("0041"), None),
            simple_population(
                Criterion::all(vec![Criterion::age(Some(50), None), Criterion::encounters(1)]),
                Criterion::Always,
                Some(Criterion::entry(
                    EntryKind::Allergy,
                    &["egg*", "influenza_vaccine*"],
                    Window::Ever,
                )),
                Criterion::entry(EntryKind::Immunization, INFLUENZA_VACCINES, Window::MeasurementPeriod),
            ),
        ),
        cqm(
            "rule_pneumovacc_ge_65_cqm",
            "Pneumonia Vaccination Status for Older Adults",
            codes(Some("111"), Some("0043"), None),
            simple_population(
                Criterion::all(vec![Criterion::age(Some(64), None), Criterion::encounters(1)]),
                Criterion::Always,
                None,
                Criterion::entry(EntryKind::Immunization, PNEUMOCOCCAL_VACCINES, Window::Ever),
            ),
        ),
        cqm(
            "rule_dm_eye_cqm",
            "Diabetes: Eye Exam",
            codes(Some("117"), Some("0055"), None),
            simple_population(
                diabetic_adult(),
                Criterion::Always,
                Some(diabetes_exclusion()),
                Criterion::entry(
                    EntryKind::Procedure,
                    &["CPT:2022F", "CPT:2024F", "CPT:2026F", "CPT:67028", "CPT:92002*", "CPT:92004"],
                    Window::MeasurementPeriod,
                ),
            ),
        ),
        cqm(
            "rule_dm_foot_cqm",
            "Diabetes: Foot Exam",
            codes(Some("163"), Some("0056"), None),
            simple_population(
                diabetic_adult(),
                Criterion::Always,
                Some(diabetes_exclusion()),
                Criterion::any(vec![
                    Criterion::entry(EntryKind::Procedure, &["CPT:2028F"], Window::MeasurementPeriod),
                    Criterion::entry(EntryKind::Intervention, &["foot_exam*"], Window::MeasurementPeriod),
                ]),
            ),
        ),
        cqm(
            "rule_dm_bp_control_cqm",
            "Diabetes: Blood Pressure Management",
            codes(Some("3"), Some("0061"), None),
            simple_population(
                diabetic_adult(),
                Criterion::Always,
                Some(diabetes_exclusion()),
                Criterion::all(vec![
                    vital_max(VitalField::Bps, 139.0),
                    vital_max(VitalField::Bpd, 89.0),
                ]),
            ),
        ),
    ]
}

/// Automated measure calculation rules
pub fn amc_rules() -> Vec<RuleDefinition> {
    let seen = Criterion::encounters(1);

    vec![
        amc(
            "problem_list_amc",
            "Maintain an up-to-date problem list of current and active diagnoses",
            "170.302(c)",
            simple_population(
                seen.clone(),
                Criterion::Always,
                None,
                Criterion::entry(EntryKind::Problem, &[], Window::Ever),
            ),
        ),
        amc(
            "med_list_amc",
            "Maintain active medication list",
            "170.302(d)",
            simple_population(
                seen.clone(),
                Criterion::Always,
                None,
                Criterion::entry(EntryKind::Medication, &[], Window::Ever),
            ),
        ),
        amc(
            "med_allergy_list_amc",
            "Maintain active medication allergy list",
            "170.302(e)",
            simple_population(
                seen.clone(),
                Criterion::Always,
                None,
                Criterion::entry(EntryKind::Allergy, &[], Window::Ever),
            ),
        ),
        amc(
            "record_vitals_amc",
            "Record and chart changes in vital signs",
            "170.302(f)",
            simple_population(
                Criterion::all(vec![Criterion::age(Some(2), None), seen.clone()]),
                Criterion::Always,
                None,
                Criterion::all(vec![
                    Criterion::vital(VitalField::Height, Window::MeasurementPeriod),
                    Criterion::vital(VitalField::Weight, Window::MeasurementPeriod),
                    Criterion::vital(VitalField::Bps, Window::MeasurementPeriod),
                    Criterion::vital(VitalField::Bpd, Window::MeasurementPeriod),
                ]),
            ),
        ),
        amc(
            "record_smoke_amc",
            "Record smoking status for patients 13 years old or older",
            "170.302(g)",
            simple_population(
                Criterion::all(vec![Criterion::age(Some(13), None), seen]),
                Criterion::Always,
                None,
                Criterion::entry(EntryKind::Tobacco, &[], Window::Ever),
            ),
        ),
    ]
}

/// Clinical decision support rules; registered but not reportable
pub fn standard_rules() -> Vec<RuleDefinition> {
    vec![RuleDefinition {
        id: RuleId::from_static("rule_influenza_ge_50"),
        category: RuleCategory::Standard,
        title: "Influenza Immunization Reminder".to_string(),
        codes: MeasureCodes::default(),
        populations: simple_population(
            Criterion::age(Some(50), None),
            Criterion::Always,
            None,
            Criterion::entry(EntryKind::Immunization, INFLUENZA_VACCINES, Window::MeasurementPeriod),
        ),
        actions: Vec::new(),
    }]
}

fn ids(rules: &[RuleDefinition]) -> Vec<RuleId> {
    rules.iter().map(|r| r.id.clone()).collect()
}

/// Built-in rule sets over the given rules
pub fn rule_sets(cqm_rules: &[RuleDefinition], amc_rules: &[RuleDefinition]) -> Vec<RuleSet> {
    vec![
        RuleSet {
            id: RuleSetId::from_static(CQM_2011),
            title: "Clinical Quality Measures (2011)".to_string(),
            rules: ids(cqm_rules),
            plans: vec![
                Plan {
                    id: PlanId::from_static("dm_plan_cqm"),
                    title: "Diabetes Mellitus".to_string(),
                    measure_group: "A".to_string(),
                    rules: vec![
                        RuleId::from_static("rule_dm_eye_cqm"),
                        RuleId::from_static("rule_dm_foot_cqm"),
                        RuleId::from_static("rule_dm_bp_control_cqm"),
                    ],
                },
                Plan {
                    id: PlanId::from_static("prevent_plan_cqm"),
                    title: "Preventative Care".to_string(),
                    measure_group: "D".to_string(),
                    rules: vec![
                        RuleId::from_static("rule_influenza_ge_50_cqm"),
                        RuleId::from_static("rule_pneumovacc_ge_65_cqm"),
                        RuleId::from_static("rule_tob_use_assess_cqm"),
                        RuleId::from_static("rule_tob_cess_inter_cqm"),
                        RuleId::from_static("rule_adult_wt_screen_fu_cqm"),
                    ],
                },
            ],
        },
        RuleSet {
            id: RuleSetId::from_static(AMC_2011),
            title: "Automated Measure Calculations (2011)".to_string(),
            rules: ids(amc_rules),
            plans: Vec::new(),
        },
    ]
}
