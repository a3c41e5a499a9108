use actix_multipart::Multipart;
use actix_web::web::{Data, Json, Path};
use actix_web::HttpResponse;
use chrono::NaiveDate;
use log::error;
use serde::Serialize;
use sqlx::{query, query_as, PgPool};
use uuid::Uuid;

use super::{clip, parse_date};
use crate::error::Error;
use crate::models::application::{
    Application, ApplicationFormV1, ApplicationInsert, ApplicationStatus, FormV1Submission,
    UniversityPreference,
};
use crate::response::Envelope;
use crate::retention;
use crate::uploads::{FieldRule, FileNaming, SubmittedForm, UploadSpec, UploadStore, DOCUMENTS};

const DOCUMENT_RULES: &[FieldRule] = &[
    FieldRule { name: "studentPhoto", max_count: 1, subdir: "files" },
    FieldRule { name: "permanentUniqueId", max_count: 1, subdir: "files" },
    FieldRule { name: "passportCopy", max_count: 1, subdir: "files" },
    FieldRule { name: "gradeXMarksheet", max_count: 1, subdir: "files" },
    FieldRule { name: "gradeXIIMarksheet", max_count: 1, subdir: "files" },
    FieldRule { name: "medicalFitnessCertificate", max_count: 1, subdir: "files" },
    FieldRule { name: "englishTranslationOfDocuments", max_count: 1, subdir: "files" },
    FieldRule { name: "englishAsSubjectDocument", max_count: 1, subdir: "files" },
    FieldRule { name: "anyOtherDocument", max_count: 1, subdir: "files" },
    FieldRule { name: "signature", max_count: 1, subdir: "files" },
];

const APPLICATION_UPLOADS: UploadSpec = UploadSpec {
    category: "iccr",
    policy: DOCUMENTS,
    fields: DOCUMENT_RULES,
    open: false,
    default_subdir: "files",
    naming: FileNaming::Compact,
};

#[derive(Debug, Serialize)]
struct SubmissionReceipt {
    id: Uuid,
    name: Option<String>,
    email: Option<String>,
    status: ApplicationStatus,
}

pub async fn submit(store: Data<UploadStore>, db: Data<PgPool>, mut payload: Multipart) -> Result<HttpResponse, Error> {
    let form = store.receive(&APPLICATION_UPLOADS, &mut payload).await?;
    let application = assemble(&form);
    let receipt = SubmissionReceipt {
        id: application.id,
        name: application.full_name.clone(),
        email: application.email.clone(),
        status: application.status,
    };
    insert_application(db.get_ref(), application)
        .await
        .map_err(|e| Error::ApplicationFailure {
            message: "Error submitting application",
            detail: e.to_string(),
        })?;
    retention::maybe_sweep(db.get_ref()).await;
    Ok(HttpResponse::Created().json(Envelope::submitted("Application submitted successfully", receipt)))
}

pub async fn list(db: Data<PgPool>) -> Result<HttpResponse, Error> {
    let applications: Vec<Application> = query_as("SELECT * FROM applications ORDER BY created_at DESC")
        .fetch_all(db.get_ref())
        .await
        .map_err(|e| Error::ApplicationFailure {
            message: "Error fetching applications",
            detail: e.to_string(),
        })?;
    Ok(HttpResponse::Ok().json(Envelope::data(applications)))
}

pub async fn detail(path: Path<(String,)>, db: Data<PgPool>) -> Result<HttpResponse, Error> {
    let id = parse_application_id(&path.into_inner().0)?;
    let application: Option<Application> = query_as("SELECT * FROM applications WHERE id = $1")
        .bind(id)
        .fetch_optional(db.get_ref())
        .await
        .map_err(|e| Error::ApplicationFailure {
            message: "Error fetching application",
            detail: e.to_string(),
        })?;
    match application {
        Some(application) => Ok(HttpResponse::Ok().json(Envelope::data(application))),
        None => Ok(HttpResponse::NotFound().json(Envelope::failure("Application not found"))),
    }
}

pub async fn submit_form_v1(db: Data<PgPool>, Json(form): Json<FormV1Submission>) -> Result<HttpResponse, Error> {
    let date_of_birth = form
        .date_of_birth
        .as_deref()
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| lenient_date("dateOfBirth", raw));
    let saved: ApplicationFormV1 = query_as(
        "INSERT INTO application_form_v1 (
            id, full_name, country_code, mobile_number, email, date_of_birth, gender,
            last_qualification, course
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(bounded(form.full_name.as_deref(), 100))
    .bind(bounded(form.country_code.as_deref(), 10))
    .bind(bounded(form.mobile_number.as_deref(), 20))
    .bind(bounded(form.email.as_deref(), 100))
    .bind(date_of_birth)
    .bind(bounded(form.gender.as_deref(), 10))
    .bind(bounded(form.last_qualification.as_deref(), 100))
    .bind(bounded(form.course.as_deref(), 100))
    .fetch_one(db.get_ref())
    .await
    .map_err(|e| Error::ApplicationFailure {
        message: "Error submitting form",
        detail: e.to_string(),
    })?;
    Ok(HttpResponse::Created().json(Envelope::submitted("Form submitted successfully", saved)))
}

pub async fn list_form_v1(db: Data<PgPool>) -> Result<HttpResponse, Error> {
    let forms: Vec<ApplicationFormV1> = query_as("SELECT * FROM application_form_v1 ORDER BY created_at DESC")
        .fetch_all(db.get_ref())
        .await
        .map_err(|e| Error::ApplicationFailure {
            message: "Error fetching forms",
            detail: e.to_string(),
        })?;
    Ok(HttpResponse::Ok().json(Envelope::data(forms)))
}

fn parse_application_id(raw: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(raw).map_err(|_| Error::MalformedId { resource: "application" })
}

// empty values count as absent and the status is always reset
fn assemble(form: &SubmittedForm) -> ApplicationInsert {
    let mut app = ApplicationInsert {
        id: Uuid::new_v4(),
        ..ApplicationInsert::default()
    };

    app.full_name = bounded(form.value("fullName"), 500);
    app.gender = bounded(form.value("gender"), 10);
    app.place_of_birth = bounded(form.value("placeOfBirth"), 100);
    app.mobile_number = bounded(form.value("mobileNumber"), 20);
    app.whatsapp_number = bounded(form.value("whatsappNumber"), 20);
    app.email = bounded(form.value("email"), 100);
    app.passport = bounded(form.value("passport"), 50);
    app.passport_country = bounded(form.value("passportCountry"), 50);
    app.address_line = bounded(form.value("addressLine"), 255);
    app.city = bounded(form.value("city"), 100);
    app.state = bounded(form.value("state"), 100);
    app.address_country = bounded(form.value("addressCountry"), 50);
    app.zipcode = bounded(form.value("zipcode"), 20);
    app.father_name = bounded(form.value("fatherName"), 100);
    app.father_phone = bounded(form.value("fatherPhone"), 20);
    app.father_email = bounded(form.value("fatherEmail"), 100);
    app.mother_name = bounded(form.value("motherName"), 100);
    app.mother_phone = bounded(form.value("motherPhone"), 20);
    app.mother_email = bounded(form.value("motherEmail"), 100);
    app.academic_year = bounded(form.value("academicYear"), 20);
    app.level_of_course = bounded(form.value("levelOfCourse"), 50);
    app.course_main_stream = bounded(form.value("courseMainStream"), 50);
    app.travelled_in_india = bounded(form.value("travelledInIndia"), 5);
    app.residence_in_india = bounded(form.value("residenceInIndia"), 5);
    app.married_to_indian = bounded(form.value("marriedToIndian"), 5);
    app.international_driving_licence = bounded(form.value("internationalDrivingLicence"), 5);
    app.other_information = bounded(form.value("otherInformation"), 500);
    app.place_of_application = bounded(form.value("placeOfApplication"), 100);

    app.date_of_birth = date_field(form, "dateOfBirth");
    app.passport_issue_date = date_field(form, "passportIssueDate");
    app.passport_expiry_date = date_field(form, "passportExpiryDate");
    app.date_of_application = date_field(form, "dateOfApplication");

    app.university_preferences = university_preferences(form);

    app.student_photo = document_path(form, "studentPhoto");
    app.signature = document_path(form, "signature");
    app.permanent_unique_id = document_path(form, "permanentUniqueId");
    app.passport_copy = document_path(form, "passportCopy");
    app.grade_x_marksheet = document_path(form, "gradeXMarksheet");
    app.grade_xii_marksheet = document_path(form, "gradeXIIMarksheet");
    app.medical_fitness_certificate = document_path(form, "medicalFitnessCertificate");
    app.english_translation_of_documents = document_path(form, "englishTranslationOfDocuments");
    app.english_as_subject_document = document_path(form, "englishAsSubjectDocument");
    app.any_other_document = document_path(form, "anyOtherDocument");

    app.status = ApplicationStatus::Pending;
    app
}

fn bounded(value: Option<&str>, max: usize) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(|v| clip(v, max))
}

fn lenient_date(field: &str, raw: &str) -> Option<NaiveDate> {
    let parsed = parse_date(raw);
    if parsed.is_none() {
        error!("Error parsing date for field {}: {:?}", field, raw);
    }
    parsed
}

fn date_field(form: &SubmittedForm, field: &str) -> Option<NaiveDate> {
    form.value(field).and_then(|raw| lenient_date(field, raw))
}

// universityPreferences[i][...] entries, scanned from index zero up to the
// first missing university
fn university_preferences(form: &SubmittedForm) -> Option<sqlx::types::Json<Vec<UniversityPreference>>> {
    form.value("universityPreferences[0][university]")?;
    let mut preferences = Vec::new();
    let mut index = 0;
    while let Some(university) = form.value(&format!("universityPreferences[{}][university]", index)) {
        preferences.push(UniversityPreference {
            preference: index as i32 + 1,
            university: clip(university, 100),
            course: clip(
                form.value(&format!("universityPreferences[{}][course]", index)).unwrap_or(""),
                100,
            ),
            subject: clip(
                form.value(&format!("universityPreferences[{}][subject]", index)).unwrap_or(""),
                100,
            ),
        });
        index += 1;
    }
    Some(sqlx::types::Json(preferences))
}

fn document_path(form: &SubmittedForm, field: &str) -> Option<String> {
    form.first_file(field)
        .map(|file| clip(&file.stored_path.replace('\\', "/"), 255))
}

async fn insert_application(db: &PgPool, app: ApplicationInsert) -> Result<(), sqlx::Error> {
    query(
        "INSERT INTO applications (
            id, full_name, student_photo, date_of_birth, gender, place_of_birth,
            mobile_number, whatsapp_number, email, passport, passport_country,
            passport_issue_date, passport_expiry_date, address_line, city, state,
            address_country, zipcode, father_name, father_phone, father_email,
            mother_name, mother_phone, mother_email, academic_year, level_of_course,
            course_main_stream, university_preferences, travelled_in_india,
            residence_in_india, married_to_indian, international_driving_licence,
            other_information, date_of_application, place_of_application, signature,
            permanent_unique_id, passport_copy, grade_x_marksheet, grade_xii_marksheet,
            medical_fitness_certificate, english_translation_of_documents,
            english_as_subject_document, any_other_document, status
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
            $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30,
            $31, $32, $33, $34, $35, $36, $37, $38, $39, $40, $41, $42, $43, $44, $45
        )",
    )
    .bind(app.id)
    .bind(app.full_name)
    .bind(app.student_photo)
    .bind(app.date_of_birth)
    .bind(app.gender)
    .bind(app.place_of_birth)
    .bind(app.mobile_number)
    .bind(app.whatsapp_number)
    .bind(app.email)
    .bind(app.passport)
    .bind(app.passport_country)
    .bind(app.passport_issue_date)
    .bind(app.passport_expiry_date)
    .bind(app.address_line)
    .bind(app.city)
    .bind(app.state)
    .bind(app.address_country)
    .bind(app.zipcode)
    .bind(app.father_name)
    .bind(app.father_phone)
    .bind(app.father_email)
    .bind(app.mother_name)
    .bind(app.mother_phone)
    .bind(app.mother_email)
    .bind(app.academic_year)
    .bind(app.level_of_course)
    .bind(app.course_main_stream)
    .bind(app.university_preferences)
    .bind(app.travelled_in_india)
    .bind(app.residence_in_india)
    .bind(app.married_to_indian)
    .bind(app.international_driving_licence)
    .bind(app.other_information)
    .bind(app.date_of_application)
    .bind(app.place_of_application)
    .bind(app.signature)
    .bind(app.permanent_unique_id)
    .bind(app.passport_copy)
    .bind(app.grade_x_marksheet)
    .bind(app.grade_xii_marksheet)
    .bind(app.medical_fitness_certificate)
    .bind(app.english_translation_of_documents)
    .bind(app.english_as_subject_document)
    .bind(app.any_other_document)
    .bind(app.status)
    .execute(db)
    .await?;
    Ok(())
}
