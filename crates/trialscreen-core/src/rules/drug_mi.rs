//! Drug-name + MI pattern annotation.
//!
//! Flags records naming a specific cardiovascular drug together with an MI
//! indicator, for independent human review. Never changes a decision.

use lazy_static::lazy_static;

use crate::extractors::patterns::join_first;
use crate::extractors::PatternSet;

lazy_static! {
    static ref DRUG_NAMES: PatternSet = PatternSet::phrases(&[
        "aspirin", "clopidogrel", "prasugrel", "ticagrelor", "cangrelor", "vorapaxar",
        "atorvastatin", "simvastatin", "pravastatin", "rosuvastatin", "lovastatin",
        "metoprolol", "carvedilol", "bisoprolol", "atenolol", "propranolol",
        "lisinopril", "enalapril", "ramipril", "captopril", "perindopril",
        "losartan", "valsartan", "candesartan", "irbesartan", "telmisartan",
        "ezetimibe", "niacin", "gemfibrozil", "fenofibrate", "colesevelam",
        "warfarin", "dabigatran", "rivaroxaban", "apixaban", "edoxaban",
        "nitroglycerin", "isosorbide", "amlodipine", "nifedipine", "diltiazem",
        "verapamil", "digoxin", "furosemide", "spironolactone", "eplerenone",
        "morphine", "fentanyl", "midazolam", "propofol", "diazepam",
        "heparin", "bivalirudin", "eptifibatide", "tirofiban", "abciximab",
        "alteplase", "tenecteplase", "reteplase", "streptokinase",
        "omeprazole", "pantoprazole", "lansoprazole", "esomeprazole",
        "metformin", "insulin", "glipizide", "glyburide", "pioglitazone",
    ]);

    static ref MI_INDICATORS: PatternSet = PatternSet::phrases(&[
        "mi", "myocardial infarction", "heart attack", "stemi", "nstemi",
        "acute coronary syndrome", "acs", "acute mi", "post-mi",
        "post-myocardial infarction",
    ]);
}

/// `"Drugs: a, b | MI: c, d"` when both a drug name and an MI indicator occur.
pub fn detect(text: &str) -> Option<String> {
    let drugs = DRUG_NAMES.labels(text);
    let mi = MI_INDICATORS.labels(text);

    if drugs.is_empty() || mi.is_empty() {
        return None;
    }

    Some(format!(
        "Drugs: {} | MI: {}",
        join_first(&drugs, 3),
        join_first(&mi, 3)
    ))
}
