//! Profile entity and scoring.
//!
//! Completion percentage and verification status are pure functions of
//! the current field set. They are cached on the entity but recomputed
//! on every merge — never advanced independently of a field write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::FieldWeights;
use crate::profile::quality;

/// Verification status derived from completion and data quality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Unverified,
    Partial,
    Verified,
}

impl VerificationStatus {
    /// Evaluate thresholds, verified check first.
    pub fn evaluate(completion: u8, data_quality: u8) -> Self {
        if completion >= 80 && data_quality >= 80 {
            Self::Verified
        } else if completion >= 50 || data_quality >= 60 {
            Self::Partial
        } else {
            Self::Unverified
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::Partial => "partial",
            Self::Verified => "verified",
        }
    }
}

/// Fields tracked by `missing_fields`, in fixed priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    FirstName,
    LastName,
    DateOfBirth,
    StreetAddress,
    City,
    State,
    ZipCode,
    EmergencyContactName,
    EmergencyContactPhone,
}

impl ProfileField {
    /// Priority order used by `Profile::missing_fields`.
    pub const PRIORITY: [ProfileField; 9] = [
        Self::FirstName,
        Self::LastName,
        Self::DateOfBirth,
        Self::StreetAddress,
        Self::City,
        Self::State,
        Self::ZipCode,
        Self::EmergencyContactName,
        Self::EmergencyContactPhone,
    ];

    /// The question the conversation asks to fill this field.
    pub fn question(&self) -> &'static str {
        match self {
            Self::FirstName => "What is your first name?",
            Self::LastName => "What is your last name?",
            Self::DateOfBirth => "What is your date of birth?",
            Self::StreetAddress => "What is your street address?",
            Self::City => "What city do you live in?",
            Self::State => "What state do you live in?",
            Self::ZipCode => "What is your ZIP code?",
            Self::EmergencyContactName => {
                "Who should we contact in case of an emergency? Please share their name."
            }
            Self::EmergencyContactPhone => "What is your emergency contact's phone number?",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::DateOfBirth => "date_of_birth",
            Self::StreetAddress => "street_address",
            Self::City => "city",
            Self::State => "state",
            Self::ZipCode => "zip_code",
            Self::EmergencyContactName => "emergency_contact_name",
            Self::EmergencyContactPhone => "emergency_contact_phone",
        }
    }
}

/// Sparse set of profile fields recognized in a single message.
/// Absent keys mean "not found", never "cleared".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileFragment {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<u32>,
    pub date_of_birth: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub medicaid_id: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

impl ProfileFragment {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Name or Medicaid ID — enough to anchor an intake conversation.
    pub fn has_identity(&self) -> bool {
        self.first_name.is_some() || self.last_name.is_some() || self.medicaid_id.is_some()
    }

    /// Any address component present.
    pub fn has_address(&self) -> bool {
        self.street_address.is_some()
            || self.city.is_some()
            || self.state.is_some()
            || self.zip_code.is_some()
    }
}

/// One prospective or enrolled client. Created on the first inbound
/// message from an unknown phone number; never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub id: Uuid,
    /// Owning phone number — the unique key for inbound matching.
    pub phone_number: String,

    // Demographics
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub preferred_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,

    // Contact
    pub secondary_phone: Option<String>,
    pub email: Option<String>,
    pub street_address: Option<String>,
    pub unit: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub county: Option<String>,

    // Program
    pub medicaid_id: Option<String>,
    pub medicare_id: Option<String>,
    pub insurance_provider: Option<String>,

    // Care
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub emergency_contact_relationship: Option<String>,
    pub primary_care_physician: Option<String>,
    pub medical_conditions: Option<String>,
    pub medications: Option<String>,
    pub allergies: Option<String>,
    pub mobility_needs: Option<String>,
    pub dietary_restrictions: Option<String>,
    pub caregiver_gender_preference: Option<String>,
    pub language_preference: Option<String>,

    // Derived/meta — cached, recomputed on every merge
    pub completion_pct: u8,
    pub data_quality_score: u8,
    pub verification: VerificationStatus,
    pub interaction_count: u32,
    pub last_interaction_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Default for Profile {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl Profile {
    /// Blank profile for a phone number.
    pub fn new(phone_number: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            phone_number,
            first_name: None,
            middle_name: None,
            last_name: None,
            preferred_name: None,
            date_of_birth: None,
            age: None,
            gender: None,
            secondary_phone: None,
            email: None,
            street_address: None,
            unit: None,
            city: None,
            state: None,
            zip_code: None,
            county: None,
            medicaid_id: None,
            medicare_id: None,
            insurance_provider: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
            emergency_contact_relationship: None,
            primary_care_physician: None,
            medical_conditions: None,
            medications: None,
            allergies: None,
            mobility_needs: None,
            dietary_restrictions: None,
            caregiver_gender_preference: None,
            language_preference: None,
            completion_pct: 0,
            data_quality_score: 0,
            verification: VerificationStatus::Unverified,
            interaction_count: 0,
            last_interaction_at: None,
            created_at: Utc::now(),
        }
    }

    /// Merge a fragment: every present key overwrites the corresponding
    /// field (last write wins). Bumps the interaction count, stamps the
    /// last-interaction time, and rescores.
    pub fn merge(&mut self, fragment: &ProfileFragment, weights: &FieldWeights) {
        overwrite(&mut self.first_name, &fragment.first_name);
        overwrite(&mut self.middle_name, &fragment.middle_name);
        overwrite(&mut self.last_name, &fragment.last_name);
        overwrite(&mut self.date_of_birth, &fragment.date_of_birth);
        overwrite(&mut self.email, &fragment.email);
        overwrite(&mut self.street_address, &fragment.street_address);
        overwrite(&mut self.city, &fragment.city);
        overwrite(&mut self.state, &fragment.state);
        overwrite(&mut self.zip_code, &fragment.zip_code);
        overwrite(&mut self.medicaid_id, &fragment.medicaid_id);
        overwrite(&mut self.emergency_contact_name, &fragment.emergency_contact_name);
        overwrite(
            &mut self.emergency_contact_phone,
            &fragment.emergency_contact_phone,
        );
        if let Some(age) = fragment.age {
            self.age = Some(age);
        }
        // A phone mentioned in a message fills the owning number only if
        // we don't have one (blank profile); otherwise it's a secondary.
        if let Some(ref phone) = fragment.phone {
            if self.phone_number.trim().is_empty() {
                self.phone_number = phone.clone();
            } else {
                self.secondary_phone = Some(phone.clone());
            }
        }

        self.interaction_count += 1;
        self.last_interaction_at = Some(Utc::now());
        self.rescore(weights);
    }

    /// Recompute cached completion, quality, and verification from the
    /// current field set.
    pub fn rescore(&mut self, weights: &FieldWeights) {
        self.completion_pct = self.completion(weights);
        self.data_quality_score = quality::data_quality_score(self);
        self.verification =
            VerificationStatus::evaluate(self.completion_pct, self.data_quality_score);
    }

    /// Weighted completion percentage (0–100) over three field tiers.
    /// The name slot counts only when first and last name are both set.
    pub fn completion(&self, weights: &FieldWeights) -> u8 {
        let required = [
            present(&self.first_name) && present(&self.last_name),
            !self.phone_number.trim().is_empty(),
            present(&self.zip_code),
        ];
        let important = [
            present(&self.date_of_birth),
            present(&self.street_address),
            present(&self.city),
            present(&self.state),
            present(&self.emergency_contact_name),
            present(&self.emergency_contact_phone),
        ];
        let optional = [
            present(&self.email),
            present(&self.secondary_phone),
            present(&self.county),
            present(&self.medicaid_id),
            present(&self.medicare_id),
            present(&self.insurance_provider),
            present(&self.primary_care_physician),
            present(&self.language_preference),
            present(&self.gender),
            present(&self.preferred_name),
        ];

        let mut achieved: u32 = 0;
        let mut total: u32 = 0;
        for hit in required {
            total += weights.required;
            if hit {
                achieved += weights.required;
            }
        }
        for hit in important {
            total += weights.important;
            if hit {
                achieved += weights.important;
            }
        }
        for hit in optional {
            total += weights.optional;
            if hit {
                achieved += weights.optional;
            }
        }

        if total == 0 {
            return 0;
        }
        ((achieved * 100 + total / 2) / total) as u8
    }

    /// Still-missing tracked fields, in fixed priority order.
    pub fn missing_fields(&self) -> Vec<ProfileField> {
        ProfileField::PRIORITY
            .iter()
            .copied()
            .filter(|field| !self.has_field(*field))
            .collect()
    }

    fn has_field(&self, field: ProfileField) -> bool {
        match field {
            ProfileField::FirstName => present(&self.first_name),
            ProfileField::LastName => present(&self.last_name),
            ProfileField::DateOfBirth => present(&self.date_of_birth),
            ProfileField::StreetAddress => present(&self.street_address),
            ProfileField::City => present(&self.city),
            ProfileField::State => present(&self.state),
            ProfileField::ZipCode => present(&self.zip_code),
            ProfileField::EmergencyContactName => present(&self.emergency_contact_name),
            ProfileField::EmergencyContactPhone => present(&self.emergency_contact_phone),
        }
    }

    /// One-line summary for replies and logs.
    pub fn summary(&self) -> String {
        let name = match (&self.first_name, &self.last_name) {
            (Some(f), Some(l)) => format!("{f} {l}"),
            (Some(f), None) => f.clone(),
            _ => "unknown".to_string(),
        };
        format!(
            "{name} — {}% complete, {}",
            self.completion_pct,
            self.verification.label()
        )
    }
}

/// Non-empty after trimming.
pub(crate) fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

fn overwrite(dst: &mut Option<String>, src: &Option<String>) {
    if let Some(v) = src {
        *dst = Some(v.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights() -> FieldWeights {
        FieldWeights::default()
    }

    fn maria_fragment() -> ProfileFragment {
        ProfileFragment {
            first_name: Some("Maria".into()),
            last_name: Some("Lopez".into()),
            age: Some(34),
            zip_code: Some("89101".into()),
            ..Default::default()
        }
    }

    #[test]
    fn maria_scenario_scores_two_of_three_required() {
        let mut profile = Profile::new(String::new());
        profile.merge(&maria_fragment(), &weights());
        // name (40) + zip (40) out of 3*40 + 6*30 + 10*10 = 400
        assert_eq!(profile.completion_pct, 20);
        assert!(profile.missing_fields().contains(&ProfileField::DateOfBirth));
    }

    #[test]
    fn completion_counts_owning_phone_as_required() {
        let mut profile = Profile::new("7025551234".into());
        profile.merge(&maria_fragment(), &weights());
        // name + phone + zip = 120/400
        assert_eq!(profile.completion_pct, 30);
    }

    #[test]
    fn first_name_alone_does_not_fill_the_name_slot() {
        let mut profile = Profile::new(String::new());
        profile.merge(
            &ProfileFragment {
                first_name: Some("Maria".into()),
                ..Default::default()
            },
            &weights(),
        );
        assert_eq!(profile.completion_pct, 0);
    }

    #[test]
    fn fragments_compose_across_merges() {
        let mut profile = Profile::new(String::new());
        profile.merge(
            &ProfileFragment {
                first_name: Some("Ann".into()),
                ..Default::default()
            },
            &weights(),
        );
        profile.merge(
            &ProfileFragment {
                last_name: Some("Lee".into()),
                ..Default::default()
            },
            &weights(),
        );
        assert_eq!(profile.first_name.as_deref(), Some("Ann"));
        assert_eq!(profile.last_name.as_deref(), Some("Lee"));
        assert_eq!(profile.interaction_count, 2);
    }

    #[test]
    fn merge_is_last_write_wins() {
        let mut profile = Profile::new(String::new());
        profile.merge(
            &ProfileFragment {
                zip_code: Some("89101".into()),
                ..Default::default()
            },
            &weights(),
        );
        profile.merge(
            &ProfileFragment {
                zip_code: Some("89102".into()),
                ..Default::default()
            },
            &weights(),
        );
        assert_eq!(profile.zip_code.as_deref(), Some("89102"));
    }

    #[test]
    fn merge_is_idempotent_except_meta() {
        let mut once = Profile::new(String::new());
        once.merge(&maria_fragment(), &weights());
        let mut twice = once.clone();
        twice.merge(&maria_fragment(), &weights());

        assert_eq!(twice.first_name, once.first_name);
        assert_eq!(twice.last_name, once.last_name);
        assert_eq!(twice.zip_code, once.zip_code);
        assert_eq!(twice.completion_pct, once.completion_pct);
        assert_eq!(twice.verification, once.verification);
        assert_eq!(twice.interaction_count, once.interaction_count + 1);
    }

    #[test]
    fn completion_is_monotonic_under_additive_merges() {
        let fragments = [
            ProfileFragment {
                first_name: Some("Maria".into()),
                last_name: Some("Lopez".into()),
                ..Default::default()
            },
            ProfileFragment {
                zip_code: Some("89101".into()),
                ..Default::default()
            },
            ProfileFragment {
                street_address: Some("123 Oak St".into()),
                city: Some("Henderson".into()),
                ..Default::default()
            },
            ProfileFragment {
                phone: Some("7025551234".into()),
                ..Default::default()
            },
            ProfileFragment::default(),
        ];

        let mut profile = Profile::new(String::new());
        let mut last = 0;
        for fragment in &fragments {
            profile.merge(fragment, &weights());
            assert!(
                profile.completion_pct >= last,
                "completion dropped from {last} to {}",
                profile.completion_pct
            );
            last = profile.completion_pct;
        }
    }

    #[test]
    fn missing_fields_in_priority_order() {
        let profile = Profile::new(String::new());
        assert_eq!(profile.missing_fields(), ProfileField::PRIORITY.to_vec());
    }

    #[test]
    fn missing_fields_empty_iff_tracked_fields_present() {
        let mut profile = Profile::new("7025551234".into());
        profile.first_name = Some("Maria".into());
        profile.last_name = Some("Lopez".into());
        profile.date_of_birth = Some("3/14/1952".into());
        profile.street_address = Some("123 Oak St".into());
        profile.city = Some("Henderson".into());
        profile.state = Some("NV".into());
        profile.zip_code = Some("89101".into());
        profile.emergency_contact_name = Some("Luis Lopez".into());
        assert!(!profile.missing_fields().is_empty());

        profile.emergency_contact_phone = Some("7025559999".into());
        assert!(profile.missing_fields().is_empty());
    }

    #[test]
    fn whitespace_only_values_count_as_missing() {
        let mut profile = Profile::new(String::new());
        profile.first_name = Some("   ".into());
        assert!(profile.missing_fields().contains(&ProfileField::FirstName));
        assert_eq!(profile.completion(&weights()), 0);
    }

    #[test]
    fn extracted_phone_fills_blank_owning_number_then_secondary() {
        let mut profile = Profile::new(String::new());
        profile.merge(
            &ProfileFragment {
                phone: Some("7025551234".into()),
                ..Default::default()
            },
            &weights(),
        );
        assert_eq!(profile.phone_number, "7025551234");

        profile.merge(
            &ProfileFragment {
                phone: Some("7025550000".into()),
                ..Default::default()
            },
            &weights(),
        );
        assert_eq!(profile.phone_number, "7025551234");
        assert_eq!(profile.secondary_phone.as_deref(), Some("7025550000"));
    }

    #[test]
    fn verification_thresholds() {
        assert_eq!(
            VerificationStatus::evaluate(80, 80),
            VerificationStatus::Verified
        );
        assert_eq!(
            VerificationStatus::evaluate(79, 95),
            VerificationStatus::Partial
        );
        assert_eq!(
            VerificationStatus::evaluate(50, 0),
            VerificationStatus::Partial
        );
        assert_eq!(
            VerificationStatus::evaluate(0, 60),
            VerificationStatus::Partial
        );
        assert_eq!(
            VerificationStatus::evaluate(49, 59),
            VerificationStatus::Unverified
        );
    }

    #[test]
    fn fragment_emptiness_and_identity() {
        assert!(ProfileFragment::default().is_empty());
        let f = ProfileFragment {
            medicaid_id: Some("AB123".into()),
            ..Default::default()
        };
        assert!(!f.is_empty());
        assert!(f.has_identity());
        assert!(!f.has_address());
    }
}
