/// Marker written over a reading that was measured but failed the range check.
/// Never survives normalization.
pub const SENTINEL: f32 = -2.0;

/// Readings must satisfy `MIN_EXCLUSIVE < value <= MAX_INCLUSIVE` (mg/dL).
pub const READING_MIN_EXCLUSIVE: f32 = 0.0;
pub const READING_MAX_INCLUSIVE: f32 = 999.0;

// Glucose level thresholds on the rounded mean. The gaps at exactly 140 and
// over [199, 200] are part of the published policy and are kept as-is.
pub const NORMAL_BELOW: f64 = 140.0;
pub const PREDIABETES_ABOVE: f64 = 140.0;
pub const PREDIABETES_BELOW: f64 = 199.0;
pub const DIABETES_ABOVE: f64 = 200.0;

/// Decimal places kept on `glucose_mean`.
pub const MEAN_DECIMALS: i32 = 1;

/// Input/output naming, parameterized by the batch date (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const INPUT_FILE_SUFFIX: &str = "_patient_data.csv";
pub const COMPLETE_DATASET_SUFFIX: &str = "_without_missed_readings";
pub const INCOMPLETE_DATASET_SUFFIX: &str = "_with_missed_readings";

pub const PART_FILE_NAME: &str = "part-00000.json";
pub const MANIFEST_FILE_NAME: &str = "_manifest.json";
pub const SUCCESS_MARKER_NAME: &str = "_SUCCESS";

/// Column names of the fixed input schema, in positional order.
pub const INPUT_COLUMNS: [&str; 10] = [
    "patient_id",
    "first_name",
    "last_name",
    "email",
    "address",
    "glucose_mg/dl_t1",
    "glucose_mg/dl_t2",
    "glucose_mg/dl_t3",
    "cancerPresent",
    "atrophy_present",
];

/// Build the input file name for a batch date
pub fn input_file_name(date: &str) -> String {
    format!("{}{}", date, INPUT_FILE_SUFFIX)
}
