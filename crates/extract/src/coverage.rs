use serde::Serialize;
use serde_json::Value;

use crate::schema::Record;

/// Coverage flags the extraction model was trained to emit, with their labels.
pub const COVERAGE_KEYS: &[(&str, &str)] = &[
    ("specialistvård", "specialistvård"),
    ("sjukhusvård", "sjukhusvård"),
    ("operationer", "operationer"),
    ("psykologbesök", "psykologbesök"),
    ("fysioterapi", "fysioterapi"),
    ("tandvård", "tandvård"),
    ("receptbelagd_medicin", "receptbelagda mediciner"),
    ("graviditetsrelaterad_vård", "vård relaterad till graviditet"),
    ("rehabilitering", "rehabilitering"),
    ("vård_kroniska_sjukdomar", "vård av kroniska sjukdomar"),
    ("cancerbehandlingar", "cancerbehandlingar"),
    ("neurologiska_sjukdomar", "vård vid neurologiska sjukdomar"),
    ("logoped_talterapi", "logoped-/talterapi"),
    ("smärtbehandling", "smärtbehandling"),
    ("snabb_vårdgaranti_inom_7d", "snabb vårdgaranti inom 7 dagar"),
    ("väntetid_specialist_inom_14d", "väntetid till specialist inom 14 dagar"),
    ("väntetid_operation_inom_30d", "väntetid till operation inom 30 dagar"),
    ("läkarkontakt_inom_24h", "kontakt med läkare inom 24 timmar"),
    ("vårdgaranti_vid_försening", "vårdgaranti vid försening"),
    ("ersättning_vid_vårdgarantibrott", "ersättning vid vårdgarantibrott"),
    ("eu_ees", "vård inom EU/EES"),
    ("norden", "vård inom Norden"),
    ("usa", "vård i USA"),
    ("asien", "vård i Asien"),
    ("australien", "vård i Australien"),
    ("utan_hälsodeklaration", "teckning utan hälsodeklaration"),
    ("bindningstid_1år", "en bindningstid på 1 år"),
    ("teckna_efter_65år", "tecknas efter 65 år"),
    ("ersättning_förlorad_arbetsinkomst", "ersättning för förlorad arbetsinkomst"),
    ("second_opinion", "möjlighet till second opinion"),
    ("privatläkare", "privatläkarkontakt"),
    ("digital_vård", "digital vård"),
    ("separat_barnförsäkring", "en separat barnförsäkring"),
    ("täcker_vaccinationer", "vaccinationer"),
    ("täcker_hjälpmedel_funktionsnedsättning", "hjälpmedel vid funktionsnedsättning"),
    ("karenstid", "en karenstid"),
];

/// Key that names the insurance product in an extracted record.
pub const INSURER_KEY: &str = "försäkring";

pub fn label_for(key: &str) -> Option<&'static str> {
    COVERAGE_KEYS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| *label)
}

/// Known coverage flags of a record, split by what the record asserts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoverageSummary {
    pub insurer: Option<String>,
    pub covered: Vec<&'static str>,
    pub not_covered: Vec<&'static str>,
    pub not_mentioned: Vec<&'static str>,
    /// Boolean fields outside the known catalog.
    pub unknown_flags: Vec<String>,
}

impl CoverageSummary {
    pub fn from_record(record: &Record) -> Self {
        let mut summary = Self {
            insurer: record
                .get(INSURER_KEY)
                .and_then(Value::as_str)
                .map(str::to_string),
            ..Self::default()
        };

        for (key, _) in COVERAGE_KEYS {
            match record.get(*key) {
                Some(Value::Bool(true)) => summary.covered.push(*key),
                Some(Value::Bool(false)) => summary.not_covered.push(*key),
                _ => summary.not_mentioned.push(*key),
            }
        }

        summary.unknown_flags = record
            .iter()
            .filter(|(key, value)| value.is_boolean() && label_for(key).is_none())
            .map(|(key, _)| key.clone())
            .collect();

        summary
    }
}
