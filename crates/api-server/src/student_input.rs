use risk_core::RawFeatures;
use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};

/// Request body shared by `/predict`, `/uncertainty` and `/recommend`.
///
/// The engineered numeric features are required; one-hot categorical flags
/// default to 0 (and `internet_access` to 1). Integer fields also accept
/// whole floats such as `17.0`. Unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct StudentInput {
    // numeric engineered features (student-level)
    pub study_hours_sum: f64,
    pub study_hours_mean: f64,
    pub clicks_sum: f64,
    pub resources_sum: f64,
    pub forum_posts_sum: f64,
    pub attendance_mean: f64,
    pub sleep_mean: f64,
    pub study_habits_index_mean: f64,
    pub consistency_score_mean: f64,
    pub cramming_indicator_mean: f64,
    #[serde(deserialize_with = "integral")]
    pub age: i64,

    // one-hot / categorical
    #[serde(default, rename = "gender_F", deserialize_with = "integral")]
    #[schema(default = 0)]
    pub gender_f: i64,
    #[serde(default, rename = "gender_M", deserialize_with = "integral")]
    #[schema(default = 0)]
    pub gender_m: i64,
    #[serde(default, rename = "gender_Other", deserialize_with = "integral")]
    #[schema(default = 0)]
    pub gender_other: i64,

    #[serde(default, deserialize_with = "integral")]
    #[schema(default = 0)]
    pub socio_econ_low: i64,
    #[serde(default, deserialize_with = "integral")]
    #[schema(default = 0)]
    pub socio_econ_middle: i64,
    #[serde(default, deserialize_with = "integral")]
    #[schema(default = 0)]
    pub socio_econ_high: i64,

    #[serde(default, deserialize_with = "integral")]
    #[schema(default = 0)]
    pub school_type_public: i64,
    #[serde(default, deserialize_with = "integral")]
    #[schema(default = 0)]
    pub school_type_private: i64,

    #[serde(default, deserialize_with = "integral")]
    #[schema(default = 0)]
    pub parent_education_none: i64,
    #[serde(default, deserialize_with = "integral")]
    #[schema(default = 0)]
    pub parent_education_primary: i64,
    #[serde(default, deserialize_with = "integral")]
    #[schema(default = 0)]
    pub parent_education_secondary: i64,
    #[serde(default, deserialize_with = "integral")]
    #[schema(default = 0)]
    pub parent_education_bachelor: i64,
    #[serde(default, deserialize_with = "integral")]
    #[schema(default = 0)]
    pub parent_education_master_: i64,

    #[serde(default = "default_internet_access", deserialize_with = "integral")]
    #[schema(default = 1)]
    pub internet_access: i64,
    #[serde(default, deserialize_with = "integral")]
    #[schema(default = 0)]
    pub tutoring: i64,
}

fn default_internet_access() -> i64 {
    1
}

/// Largest magnitude at which every integer is exactly representable in f64.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn integral<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value.fract() != 0.0 || value.abs() > MAX_EXACT_INTEGER {
        return Err(de::Error::invalid_value(
            Unexpected::Float(value),
            &"an integer",
        ));
    }
    Ok(value as i64)
}

impl StudentInput {
    /// Flatten into the raw name → value record the engine aligns against
    /// its schema. Names match the wire names.
    pub fn to_raw_features(&self) -> RawFeatures {
        let fields = [
            ("study_hours_sum", self.study_hours_sum),
            ("study_hours_mean", self.study_hours_mean),
            ("clicks_sum", self.clicks_sum),
            ("resources_sum", self.resources_sum),
            ("forum_posts_sum", self.forum_posts_sum),
            ("attendance_mean", self.attendance_mean),
            ("sleep_mean", self.sleep_mean),
            ("study_habits_index_mean", self.study_habits_index_mean),
            ("consistency_score_mean", self.consistency_score_mean),
            ("cramming_indicator_mean", self.cramming_indicator_mean),
            ("age", self.age as f64),
            ("gender_F", self.gender_f as f64),
            ("gender_M", self.gender_m as f64),
            ("gender_Other", self.gender_other as f64),
            ("socio_econ_low", self.socio_econ_low as f64),
            ("socio_econ_middle", self.socio_econ_middle as f64),
            ("socio_econ_high", self.socio_econ_high as f64),
            ("school_type_public", self.school_type_public as f64),
            ("school_type_private", self.school_type_private as f64),
            ("parent_education_none", self.parent_education_none as f64),
            ("parent_education_primary", self.parent_education_primary as f64),
            ("parent_education_secondary", self.parent_education_secondary as f64),
            ("parent_education_bachelor", self.parent_education_bachelor as f64),
            ("parent_education_master_", self.parent_education_master_ as f64),
            ("internet_access", self.internet_access as f64),
            ("tutoring", self.tutoring as f64),
        ];

        fields
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }
}
