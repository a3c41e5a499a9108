use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    #[serde(rename = "Under Review")]
    #[sqlx(rename = "Under Review")]
    UnderReview,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniversityPreference {
    pub preference: i32,
    pub university: String,
    pub course: String,
    pub subject: String,
}

// serialized names follow the public form fields
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub student_photo: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub place_of_birth: Option<String>,
    pub mobile_number: Option<String>,
    pub whatsapp_number: Option<String>,
    pub email: Option<String>,
    pub passport: Option<String>,
    pub passport_country: Option<String>,
    pub passport_issue_date: Option<NaiveDate>,
    pub passport_expiry_date: Option<NaiveDate>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub address_country: Option<String>,
    pub zipcode: Option<String>,
    pub father_name: Option<String>,
    pub father_phone: Option<String>,
    pub father_email: Option<String>,
    pub mother_name: Option<String>,
    pub mother_phone: Option<String>,
    pub mother_email: Option<String>,
    pub academic_year: Option<String>,
    pub level_of_course: Option<String>,
    pub course_main_stream: Option<String>,
    pub university_preferences: Option<Json<Vec<UniversityPreference>>>,
    pub travelled_in_india: Option<String>,
    pub residence_in_india: Option<String>,
    pub married_to_indian: Option<String>,
    pub international_driving_licence: Option<String>,
    pub other_information: Option<String>,
    pub date_of_application: Option<NaiveDate>,
    pub place_of_application: Option<String>,
    pub signature: Option<String>,
    pub permanent_unique_id: Option<String>,
    pub passport_copy: Option<String>,
    pub grade_x_marksheet: Option<String>,
    #[serde(rename = "gradeXIIMarksheet")]
    pub grade_xii_marksheet: Option<String>,
    pub medical_fitness_certificate: Option<String>,
    pub english_translation_of_documents: Option<String>,
    pub english_as_subject_document: Option<String>,
    pub any_other_document: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ApplicationInsert {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub student_photo: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub place_of_birth: Option<String>,
    pub mobile_number: Option<String>,
    pub whatsapp_number: Option<String>,
    pub email: Option<String>,
    pub passport: Option<String>,
    pub passport_country: Option<String>,
    pub passport_issue_date: Option<NaiveDate>,
    pub passport_expiry_date: Option<NaiveDate>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub address_country: Option<String>,
    pub zipcode: Option<String>,
    pub father_name: Option<String>,
    pub father_phone: Option<String>,
    pub father_email: Option<String>,
    pub mother_name: Option<String>,
    pub mother_phone: Option<String>,
    pub mother_email: Option<String>,
    pub academic_year: Option<String>,
    pub level_of_course: Option<String>,
    pub course_main_stream: Option<String>,
    pub university_preferences: Option<Json<Vec<UniversityPreference>>>,
    pub travelled_in_india: Option<String>,
    pub residence_in_india: Option<String>,
    pub married_to_indian: Option<String>,
    pub international_driving_licence: Option<String>,
    pub other_information: Option<String>,
    pub date_of_application: Option<NaiveDate>,
    pub place_of_application: Option<String>,
    pub signature: Option<String>,
    pub permanent_unique_id: Option<String>,
    pub passport_copy: Option<String>,
    pub grade_x_marksheet: Option<String>,
    pub grade_xii_marksheet: Option<String>,
    pub medical_fitness_certificate: Option<String>,
    pub english_translation_of_documents: Option<String>,
    pub english_as_subject_document: Option<String>,
    pub any_other_document: Option<String>,
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationFormV1 {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub country_code: Option<String>,
    pub mobile_number: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub last_qualification: Option<String>,
    pub course: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormV1Submission {
    pub full_name: Option<String>,
    pub country_code: Option<String>,
    pub mobile_number: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub last_qualification: Option<String>,
    pub course: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&ApplicationStatus::Pending).unwrap(), "\"Pending\"");
        assert_eq!(
            serde_json::to_string(&ApplicationStatus::UnderReview).unwrap(),
            "\"Under Review\""
        );
        assert_eq!(
            serde_json::from_str::<ApplicationStatus>("\"Under Review\"").unwrap(),
            ApplicationStatus::UnderReview
        );
    }

    #[test]
    fn test_application_field_names_follow_the_form() {
        let app = Application {
            id: Uuid::new_v4(),
            full_name: Some("Asha Rao".into()),
            student_photo: None,
            date_of_birth: None,
            gender: None,
            place_of_birth: None,
            mobile_number: None,
            whatsapp_number: None,
            email: None,
            passport: None,
            passport_country: None,
            passport_issue_date: None,
            passport_expiry_date: None,
            address_line: None,
            city: None,
            state: None,
            address_country: None,
            zipcode: None,
            father_name: None,
            father_phone: None,
            father_email: None,
            mother_name: None,
            mother_phone: None,
            mother_email: None,
            academic_year: None,
            level_of_course: None,
            course_main_stream: None,
            university_preferences: Some(Json(vec![UniversityPreference {
                preference: 1,
                university: "AIIMS".into(),
                course: "MBBS".into(),
                subject: "".into(),
            }])),
            travelled_in_india: None,
            residence_in_india: None,
            married_to_indian: None,
            international_driving_licence: None,
            other_information: None,
            date_of_application: None,
            place_of_application: None,
            signature: None,
            permanent_unique_id: None,
            passport_copy: None,
            grade_x_marksheet: Some("uploads/iccr/files/gradeXMarksheet-1.pdf".into()),
            grade_xii_marksheet: Some("uploads/iccr/files/gradeXIIMarksheet-1.pdf".into()),
            medical_fitness_certificate: None,
            english_translation_of_documents: None,
            english_as_subject_document: None,
            any_other_document: None,
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&app).unwrap();
        assert_eq!(json["fullName"], "Asha Rao");
        assert_eq!(json["gradeXMarksheet"], "uploads/iccr/files/gradeXMarksheet-1.pdf");
        assert_eq!(json["gradeXIIMarksheet"], "uploads/iccr/files/gradeXIIMarksheet-1.pdf");
        assert_eq!(json["universityPreferences"][0]["university"], "AIIMS");
        assert_eq!(json["status"], "Pending");
    }
}
