//! Data quality scoring.
//!
//! The score is the percentage of non-empty profile fields that pass a
//! format check. Free-text fields (conditions, medications, city names)
//! pass whenever non-empty; shaped fields (phones, zip, email, DOB) must
//! parse. A profile with no fields at all scores 0.

use chrono::NaiveDate;

use crate::profile::model::Profile;

/// Compute the data quality score (0–100) for a profile.
pub fn data_quality_score(profile: &Profile) -> u8 {
    let mut checked: u32 = 0;
    let mut passed: u32 = 0;

    let mut check = |value: Option<&str>, valid: fn(&str) -> bool| {
        if let Some(v) = value {
            let v = v.trim();
            if !v.is_empty() {
                checked += 1;
                if valid(v) {
                    passed += 1;
                }
            }
        }
    };

    check(Some(&profile.phone_number), is_phone);
    check(profile.secondary_phone.as_deref(), is_phone);
    check(profile.emergency_contact_phone.as_deref(), is_phone);
    check(profile.zip_code.as_deref(), is_zip);
    check(profile.email.as_deref(), is_email);
    check(profile.date_of_birth.as_deref(), is_date);
    check(profile.first_name.as_deref(), is_name);
    check(profile.middle_name.as_deref(), is_name);
    check(profile.last_name.as_deref(), is_name);
    check(profile.preferred_name.as_deref(), is_name);
    check(profile.emergency_contact_name.as_deref(), is_name);
    check(profile.state.as_deref(), is_name);
    check(profile.medicaid_id.as_deref(), is_alphanumeric);
    check(profile.medicare_id.as_deref(), is_alphanumeric);

    // Free-text fields: non-empty is good enough
    for value in [
        profile.street_address.as_deref(),
        profile.unit.as_deref(),
        profile.city.as_deref(),
        profile.county.as_deref(),
        profile.insurance_provider.as_deref(),
        profile.emergency_contact_relationship.as_deref(),
        profile.primary_care_physician.as_deref(),
        profile.medical_conditions.as_deref(),
        profile.medications.as_deref(),
        profile.allergies.as_deref(),
        profile.mobility_needs.as_deref(),
        profile.dietary_restrictions.as_deref(),
        profile.caregiver_gender_preference.as_deref(),
        profile.language_preference.as_deref(),
        profile.gender.as_deref(),
    ] {
        check(value, |_| true);
    }

    if let Some(age) = profile.age {
        checked += 1;
        if (1..120).contains(&age) {
            passed += 1;
        }
    }

    if checked == 0 {
        return 0;
    }
    ((passed * 100 + checked / 2) / checked) as u8
}

fn is_phone(v: &str) -> bool {
    let digits = v.chars().filter(|c| c.is_ascii_digit()).count();
    (10..=11).contains(&digits) && v.chars().all(|c| c.is_ascii_digit() || "-. ()".contains(c))
}

fn is_zip(v: &str) -> bool {
    v.len() == 5 && v.chars().all(|c| c.is_ascii_digit())
}

fn is_email(v: &str) -> bool {
    match v.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

fn is_date(v: &str) -> bool {
    NaiveDate::parse_from_str(v, "%m/%d/%Y").is_ok()
        || NaiveDate::parse_from_str(v, "%Y-%m-%d").is_ok()
}

fn is_name(v: &str) -> bool {
    !v.is_empty()
        && v.chars()
            .all(|c| c.is_alphabetic() || c == ' ' || c == '\'' || c == '-' || c == '.')
}

fn is_alphanumeric(v: &str) -> bool {
    !v.is_empty() && v.chars().all(|c| c.is_ascii_alphanumeric())
}
