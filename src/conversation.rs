//! Conversation stage selection and next-question generation.
//!
//! Stateless by design: no "current stage" is persisted. Every turn the
//! stage is re-derived from message content plus the extracted fragment,
//! so out-of-order or repeated messages re-target correctly. The machine
//! only decides which slot to fill next — it is not open-ended dialogue.

use serde::{Deserialize, Serialize};

use crate::profile::{Profile, ProfileField, ProfileFragment};

/// Acknowledgment sent when nothing is missing.
const PROFILE_COMPLETE: &str =
    "Thanks — your profile looks complete! Is there anything you'd like to update?";

/// The topic the conversation is focused on for this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStage {
    Intake,
    Address,
    EmergencyContact,
    Medical,
    Verification,
    Update,
    General,
}

impl ConversationStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::Address => "address",
            Self::EmergencyContact => "emergency_contact",
            Self::Medical => "medical",
            Self::Verification => "verification",
            Self::Update => "update",
            Self::General => "general",
        }
    }

    /// Fields this stage is responsible for filling, in ask order.
    fn relevant_fields(&self) -> &'static [ProfileField] {
        match self {
            Self::Address => &[
                ProfileField::StreetAddress,
                ProfileField::City,
                ProfileField::State,
                ProfileField::ZipCode,
            ],
            Self::EmergencyContact => &[
                ProfileField::EmergencyContactName,
                ProfileField::EmergencyContactPhone,
            ],
            Self::Intake => &[
                ProfileField::FirstName,
                ProfileField::LastName,
                ProfileField::DateOfBirth,
            ],
            _ => &[],
        }
    }
}

/// Stateless stage machine.
pub struct ConversationStateMachine;

impl ConversationStateMachine {
    /// Derive the stage for this turn from content and fragment.
    /// Checks run in precedence order; the first hit wins.
    pub fn next_stage(message: &str, fragment: &ProfileFragment) -> ConversationStage {
        let text = message.to_lowercase();

        // A bare zip (or city/state) alongside a name is an identity
        // introduction, not an address turn; an explicit street or an
        // address keyword still wins.
        let address_turn = fragment.street_address.is_some()
            || contains_any(&text, &["address", "street", "live at", "moved"])
            || (fragment.has_address() && !fragment.has_identity());
        if address_turn {
            return ConversationStage::Address;
        }
        if contains_any(
            &text,
            &["emergency contact", "next of kin", "in case of emergency", "contact person"],
        ) {
            return ConversationStage::EmergencyContact;
        }
        if contains_any(
            &text,
            &["medical", "condition", "medication", "diagnos", "allerg", "health"],
        ) {
            return ConversationStage::Medical;
        }
        if contains_any(&text, &["verify", "confirm"]) {
            return ConversationStage::Verification;
        }
        if contains_any(&text, &["update", "change", "correct"]) {
            return ConversationStage::Update;
        }
        if fragment.has_identity() {
            return ConversationStage::Intake;
        }
        ConversationStage::General
    }

    /// Produce the next question(s) for the stage.
    ///
    /// A complete profile gets a single closing acknowledgment. Otherwise
    /// ask for the first stage-relevant missing field, falling back to
    /// the highest-priority globally missing field.
    pub fn next_questions(profile: &Profile, stage: ConversationStage) -> Vec<String> {
        let missing = profile.missing_fields();
        if missing.is_empty() {
            return vec![PROFILE_COMPLETE.to_string()];
        }

        let target = stage
            .relevant_fields()
            .iter()
            .find(|f| missing.contains(f))
            .or_else(|| missing.first())
            .copied();

        match target {
            Some(field) => vec![field.question().to_string()],
            None => vec![PROFILE_COMPLETE.to_string()],
        }
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment() -> ProfileFragment {
        ProfileFragment::default()
    }

    #[test]
    fn address_keywords_select_address_stage() {
        let stage = ConversationStateMachine::next_stage("I moved to a new address", &fragment());
        assert_eq!(stage, ConversationStage::Address);
    }

    #[test]
    fn address_fragment_selects_address_stage() {
        let f = ProfileFragment {
            zip_code: Some("89101".into()),
            ..Default::default()
        };
        let stage = ConversationStateMachine::next_stage("89101", &f);
        assert_eq!(stage, ConversationStage::Address);
    }

    #[test]
    fn emergency_contact_keywords_select_that_stage() {
        let stage =
            ConversationStateMachine::next_stage("my emergency contact is my son", &fragment());
        assert_eq!(stage, ConversationStage::EmergencyContact);
    }

    #[test]
    fn medical_keywords_select_medical_stage() {
        let stage =
            ConversationStateMachine::next_stage("I take blood pressure medication", &fragment());
        assert_eq!(stage, ConversationStage::Medical);
    }

    #[test]
    fn identity_fragment_selects_intake() {
        let f = ProfileFragment {
            first_name: Some("Maria".into()),
            last_name: Some("Lopez".into()),
            ..Default::default()
        };
        let stage = ConversationStateMachine::next_stage("My name is Maria Lopez", &f);
        assert_eq!(stage, ConversationStage::Intake);
    }

    #[test]
    fn street_beats_identity_when_both_present() {
        let f = ProfileFragment {
            first_name: Some("Maria".into()),
            street_address: Some("123 Oak Blvd".into()),
            ..Default::default()
        };
        let stage = ConversationStateMachine::next_stage("I'm Maria, 123 Oak Blvd", &f);
        assert_eq!(stage, ConversationStage::Address);
    }

    #[test]
    fn name_with_bare_zip_stays_in_intake() {
        let f = ProfileFragment {
            first_name: Some("Maria".into()),
            last_name: Some("Lopez".into()),
            age: Some(34),
            zip_code: Some("89101".into()),
            ..Default::default()
        };
        let stage = ConversationStateMachine::next_stage(
            "My name is Maria Lopez, I'm 34 years old, zip 89101",
            &f,
        );
        assert_eq!(stage, ConversationStage::Intake);
    }

    #[test]
    fn verify_keyword_selects_verification() {
        let stage = ConversationStateMachine::next_stage(
            "can you confirm what you have on file",
            &fragment(),
        );
        assert_eq!(stage, ConversationStage::Verification);
    }

    #[test]
    fn plain_message_falls_back_to_general() {
        let stage = ConversationStateMachine::next_stage("hello there", &fragment());
        assert_eq!(stage, ConversationStage::General);
    }

    #[test]
    fn address_stage_asks_street_first() {
        let profile = Profile::new("7025551234".into());
        let qs =
            ConversationStateMachine::next_questions(&profile, ConversationStage::Address);
        assert_eq!(qs, vec![ProfileField::StreetAddress.question().to_string()]);
    }

    #[test]
    fn address_stage_advances_to_city_once_street_known() {
        let mut profile = Profile::new("7025551234".into());
        profile.street_address = Some("123 Oak St".into());
        let qs =
            ConversationStateMachine::next_questions(&profile, ConversationStage::Address);
        assert_eq!(qs, vec![ProfileField::City.question().to_string()]);
    }

    #[test]
    fn stage_without_relevant_missing_falls_back_to_global_priority() {
        // Medical stage tracks no profile fields; fall back to the
        // highest-priority missing field (first name).
        let profile = Profile::new("7025551234".into());
        let qs =
            ConversationStateMachine::next_questions(&profile, ConversationStage::Medical);
        assert_eq!(qs, vec![ProfileField::FirstName.question().to_string()]);
    }

    #[test]
    fn general_stage_asks_highest_priority_missing_field() {
        let profile = Profile::new(String::new());
        let qs =
            ConversationStateMachine::next_questions(&profile, ConversationStage::General);
        assert_eq!(qs, vec![ProfileField::FirstName.question().to_string()]);
    }

    #[test]
    fn complete_profile_gets_closing_acknowledgment() {
        let mut profile = Profile::new("7025551234".into());
        profile.first_name = Some("Maria".into());
        profile.last_name = Some("Lopez".into());
        profile.date_of_birth = Some("3/14/1952".into());
        profile.street_address = Some("123 Oak St".into());
        profile.city = Some("Henderson".into());
        profile.state = Some("NV".into());
        profile.zip_code = Some("89101".into());
        profile.emergency_contact_name = Some("Luis Lopez".into());
        profile.emergency_contact_phone = Some("7025559999".into());

        let qs =
            ConversationStateMachine::next_questions(&profile, ConversationStage::General);
        assert_eq!(qs.len(), 1);
        assert!(qs[0].contains("complete"));
    }
}
