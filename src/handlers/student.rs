use actix_multipart::Multipart;
use actix_web::web::{Data, Json, Path};
use actix_web::HttpResponse;
use chrono::NaiveDate;
use log::error;
use serde::Deserialize;
use sqlx::{query, query_as, query_scalar, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::parse_date;
use crate::context::{Claim, StudentInfo};
use crate::core::mailer::Mailer;
use crate::core::tokener::Tokener;
use crate::error::Error;
use crate::impls::tokener::jwt::JWT;
use crate::models::student::{BankDetails, Loan, Student};
use crate::notify;
use crate::response::{LoginResponse, Msg, StudentCount};
use crate::uploads::{FieldRule, FileNaming, SubmittedForm, UploadSpec, UploadStore, GENERAL};

const STUDENT_FILE_RULES: &[FieldRule] = &[
    FieldRule { name: "studentImage", max_count: 1, subdir: "images" },
    FieldRule { name: "studentIdImage", max_count: 1, subdir: "id-images" },
    FieldRule { name: "qrCode", max_count: 1, subdir: "qr" },
    FieldRule { name: "admissionDocs", max_count: 5, subdir: "admission" },
    FieldRule { name: "scholarshipDocs", max_count: 5, subdir: "scholarship" },
    FieldRule { name: "leaveApplicationDocs", max_count: 5, subdir: "leave" },
    FieldRule { name: "certificateDocs", max_count: 5, subdir: "certificates" },
    FieldRule { name: "profileImage", max_count: 1, subdir: "" },
    FieldRule { name: "image", max_count: 1, subdir: "" },
    FieldRule { name: "photo", max_count: 1, subdir: "" },
];

const STUDENT_UPLOADS: UploadSpec = UploadSpec {
    category: "student",
    policy: GENERAL,
    fields: STUDENT_FILE_RULES,
    open: false,
    default_subdir: "",
    naming: FileNaming::Timestamped,
};

// Updates accept arbitrary file field names; known roles keep their folders.
const STUDENT_UPLOADS_ANY: UploadSpec = UploadSpec {
    category: "student",
    policy: GENERAL,
    fields: STUDENT_FILE_RULES,
    open: true,
    default_subdir: "",
    naming: FileNaming::Timestamped,
};

pub async fn create<M>(
    store: Data<UploadStore>,
    db: Data<PgPool>,
    mailer: Data<M>,
    mut payload: Multipart,
) -> Result<HttpResponse, Error>
where
    M: Mailer + Clone + Send + Sync + 'static,
{
    let form = store.receive(&STUDENT_UPLOADS, &mut payload).await?;
    let draft = StudentDraft::from_form(&form, store.root())?;
    let student = insert_student(db.get_ref(), draft)
        .await
        .map_err(|e| Error::ValidationError(e.to_string()))?;
    let _ = notify::deliver_welcome(mailer.get_ref().clone(), student.clone());
    Ok(HttpResponse::Created().json(student))
}

pub async fn list(db: Data<PgPool>) -> Result<Json<Vec<Student>>, Error> {
    let students = query_as("SELECT * FROM students").fetch_all(db.get_ref()).await?;
    Ok(Json(students))
}

pub async fn total(db: Data<PgPool>) -> Result<Json<StudentCount>, Error> {
    let total_students = query_scalar("SELECT COUNT(*) FROM students")
        .fetch_one(db.get_ref())
        .await?;
    Ok(Json(StudentCount { total_students }))
}

pub async fn detail(path: Path<(String,)>, db: Data<PgPool>) -> Result<Json<Student>, Error> {
    let id = parse_student_id(&path.into_inner().0)?;
    let student: Option<Student> = query_as("SELECT * FROM students WHERE id = $1")
        .bind(id)
        .fetch_optional(db.get_ref())
        .await?;
    student.map(Json).ok_or(Error::NotFound { resource: "Student" })
}

pub async fn update(
    path: Path<(String,)>,
    store: Data<UploadStore>,
    db: Data<PgPool>,
    mut payload: Multipart,
) -> Result<Json<Student>, Error> {
    let id = parse_student_id(&path.into_inner().0)?;
    let form = store.receive(&STUDENT_UPLOADS_ANY, &mut payload).await?;
    let existing: Option<Student> = query_as("SELECT * FROM students WHERE id = $1")
        .bind(id)
        .fetch_optional(db.get_ref())
        .await?;
    let existing = existing.ok_or(Error::NotFound { resource: "Student" })?;
    let patch = StudentPatch::from_form(&form, store.root(), &existing)?;
    let updated = apply_patch(db.get_ref(), id, patch)
        .await
        .map_err(|e| Error::ValidationError(e.to_string()))?;
    updated.map(Json).ok_or(Error::NotFound { resource: "Student" })
}

pub async fn delete_student(path: Path<(String,)>, db: Data<PgPool>) -> Result<Json<Msg>, Error> {
    let id = parse_student_id(&path.into_inner().0)?;
    let deleted = query("DELETE FROM students WHERE id = $1")
        .bind(id)
        .execute(db.get_ref())
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(Error::NotFound { resource: "Student" });
    }
    Ok(Json(Msg::new("Student deleted successfully")))
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    email: Option<String>,
    password: Option<String>,
}

pub async fn login(db: Data<PgPool>, tokener: Data<JWT>, Json(credentials): Json<Credentials>) -> Result<HttpResponse, Error> {
    let (email, password) = match (credentials.email.as_deref(), credentials.password.as_deref()) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => (email, password),
        _ => return Err(Error::ValidationError("Email and password are required.".into())),
    };
    let student: Option<Student> = query_as("SELECT * FROM students WHERE emailid = $1 AND password = $2")
        .bind(email)
        .bind(password)
        .fetch_optional(db.get_ref())
        .await
        .map_err(|e| {
            error!("Error during student login: {}", e);
            Error::ServerError("Internal server error".into())
        })?;
    // One answer for both an unknown email and a wrong password.
    let student = student.ok_or_else(|| Error::ValidationError("User not found or invalid credentials".into()))?;
    let token = tokener
        .gen_token(&Claim { sub: student.id.to_string() })
        .map_err(|e| {
            error!("Error signing login token: {}", e);
            Error::ServerError("Internal server error".into())
        })?;
    Ok(HttpResponse::Ok().json(LoginResponse {
        status: 200,
        message: "Login success".to_owned(),
        user: student,
        token,
    }))
}

pub async fn profile(student: StudentInfo, db: Data<PgPool>) -> Result<Json<Student>, Error> {
    let found: Option<Student> = query_as("SELECT * FROM students WHERE id = $1")
        .bind(student.id)
        .fetch_optional(db.get_ref())
        .await?;
    found.map(Json).ok_or(Error::NotFound { resource: "Student" })
}

fn parse_student_id(raw: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(raw).map_err(|_| Error::MalformedId { resource: "student" })
}

#[derive(Debug, Default)]
struct StudentDraft {
    student_name: String,
    student_image: Option<String>,
    student_id_image: Option<String>,
    student_id: Option<String>,
    joining_date: Option<NaiveDate>,
    password: String,
    email_id: String,
    phone: String,
    alternate_phone: Option<String>,
    course: Option<String>,
    university: Option<String>,
    batch: Option<String>,
    description: Option<String>,
    bank_details: BankDetails,
}

impl StudentDraft {
    fn from_form(form: &SubmittedForm, upload_root: &str) -> Result<Self, Error> {
        let mut draft = StudentDraft {
            student_name: required(form, "studentName")?,
            password: required(form, "password")?,
            email_id: required(form, "emailid")?,
            phone: required(form, "phone")?,
            ..StudentDraft::default()
        };
        draft.student_id = form.text("studentId").map(str::to_owned);
        draft.joining_date = strict_date(form, "joiningDate")?;
        draft.alternate_phone = form.text("alternatePhone").map(str::to_owned);
        draft.course = form.text("course").map(str::to_owned);
        draft.university = form.text("university").map(str::to_owned);
        draft.batch = form.text("batch").map(str::to_owned);
        draft.description = form.text("description").map(str::to_owned);
        // an uploaded file beats an image path sent as plain text
        draft.student_image = relative_upload(form, "studentImage", upload_root)
            .or_else(|| form.text("studentImage").map(str::to_owned));
        draft.student_id_image = relative_upload(form, "studentIdImage", upload_root)
            .or_else(|| form.text("studentIdImage").map(str::to_owned));
        draft.bank_details = BankDetails {
            bank_name: flat(form, "bankName"),
            account_holder_name: flat(form, "accountHolderName"),
            account_number: flat(form, "accountNumber"),
            ifsc_code: flat(form, "ifscCode"),
            account_type: flat(form, "accountType"),
            upi_id: flat(form, "upiId"),
            payment_app: flat(form, "paymentApp"),
            qr_code: relative_upload(form, "qrCode", upload_root),
        };
        Ok(draft)
    }
}

// only the fields the form actually carried are touched
#[derive(Debug, Default)]
struct StudentPatch {
    student_name: Option<String>,
    student_id: Option<String>,
    joining_date: Option<NaiveDate>,
    password: Option<String>,
    email_id: Option<String>,
    phone: Option<String>,
    alternate_phone: Option<String>,
    course: Option<String>,
    university: Option<String>,
    batch: Option<String>,
    description: Option<String>,
    student_image: Option<String>,
    student_id_image: Option<String>,
    bank_details: Option<BankDetails>,
    loans: Option<Vec<Loan>>,
}

impl StudentPatch {
    fn from_form(form: &SubmittedForm, upload_root: &str, existing: &Student) -> Result<Self, Error> {
        let mut patch = StudentPatch::default();
        patch.student_name = form.text("studentName").map(str::to_owned);
        patch.student_id = form.text("studentId").map(str::to_owned);
        patch.joining_date = strict_date(form, "joiningDate")?;
        patch.password = form.text("password").map(str::to_owned);
        patch.email_id = form.text("emailid").map(str::to_owned);
        patch.phone = form.text("phone").map(str::to_owned);
        patch.alternate_phone = form.text("alternatePhone").map(str::to_owned);
        patch.course = form.text("course").map(str::to_owned);
        patch.university = form.text("university").map(str::to_owned);
        patch.batch = form.text("batch").map(str::to_owned);
        patch.description = form.text("description").map(str::to_owned);
        patch.student_image = relative_upload(form, "studentImage", upload_root)
            .or_else(|| form.text("studentImage").map(str::to_owned));
        patch.student_id_image = relative_upload(form, "studentIdImage", upload_root)
            .or_else(|| form.text("studentIdImage").map(str::to_owned));
        patch.loans = form.text("loans").and_then(parse_loans);
        patch.bank_details = merge_bank_details(
            existing.bank_details.as_ref().map(|json| json.0.clone()),
            &BankFlatFields::from_form(form),
            relative_upload(form, "qrCode", upload_root),
        );
        Ok(patch)
    }
}

fn required(form: &SubmittedForm, field: &str) -> Result<String, Error> {
    form.value(field)
        .map(str::to_owned)
        .ok_or_else(|| Error::ValidationError(format!("{} is required", field)))
}

fn strict_date(form: &SubmittedForm, field: &str) -> Result<Option<NaiveDate>, Error> {
    match form.text(field) {
        None => Ok(None),
        Some(raw) => parse_date(raw).map(Some).ok_or_else(|| {
            Error::ValidationError(format!("Cast to Date failed for value {:?} at path {}", raw, field))
        }),
    }
}

fn flat(form: &SubmittedForm, field: &str) -> String {
    form.text(field).unwrap_or("").to_owned()
}

// recorded relative to the upload root so the static mount serves it directly
fn relative_upload(form: &SubmittedForm, field: &str, root: &str) -> Option<String> {
    form.first_file(field).map(|file| strip_root(&file.stored_path, root))
}

fn strip_root(path: &str, root: &str) -> String {
    let normalized = path.replace('\\', "/");
    let prefix = format!("{}/", root);
    normalized.strip_prefix(&prefix).map(str::to_owned).unwrap_or(normalized)
}

// the seven flat bank text fields, empty values do not count as input
#[derive(Debug, Default)]
struct BankFlatFields {
    bank_name: Option<String>,
    account_holder_name: Option<String>,
    account_number: Option<String>,
    ifsc_code: Option<String>,
    account_type: Option<String>,
    upi_id: Option<String>,
    payment_app: Option<String>,
}

impl BankFlatFields {
    fn from_form(form: &SubmittedForm) -> Self {
        BankFlatFields {
            bank_name: form.value("bankName").map(str::to_owned),
            account_holder_name: form.value("accountHolderName").map(str::to_owned),
            account_number: form.value("accountNumber").map(str::to_owned),
            ifsc_code: form.value("ifscCode").map(str::to_owned),
            account_type: form.value("accountType").map(str::to_owned),
            upi_id: form.value("upiId").map(str::to_owned),
            payment_app: form.value("paymentApp").map(str::to_owned),
        }
    }

    fn is_empty(&self) -> bool {
        self.bank_name.is_none()
            && self.account_holder_name.is_none()
            && self.account_number.is_none()
            && self.ifsc_code.is_none()
            && self.account_type.is_none()
            && self.upi_id.is_none()
            && self.payment_app.is_none()
    }
}

// any flat field present rewrites all seven text fields with absent ones
// reset to empty; a new qr path lands last
fn merge_bank_details(existing: Option<BankDetails>, flat: &BankFlatFields, qr_code: Option<String>) -> Option<BankDetails> {
    if flat.is_empty() && qr_code.is_none() {
        return None;
    }
    let mut bank = existing.unwrap_or_default();
    if !flat.is_empty() {
        bank.bank_name = flat.bank_name.clone().unwrap_or_default();
        bank.account_holder_name = flat.account_holder_name.clone().unwrap_or_default();
        bank.account_number = flat.account_number.clone().unwrap_or_default();
        bank.ifsc_code = flat.ifsc_code.clone().unwrap_or_default();
        bank.account_type = flat.account_type.clone().unwrap_or_default();
        bank.upi_id = flat.upi_id.clone().unwrap_or_default();
        bank.payment_app = flat.payment_app.clone().unwrap_or_default();
    }
    if let Some(qr) = qr_code {
        bank.qr_code = Some(qr);
    }
    Some(bank)
}

fn parse_loans(raw: &str) -> Option<Vec<Loan>> {
    if !(raw.starts_with('{') || raw.starts_with('[')) {
        return None;
    }
    match serde_json::from_str(raw) {
        Ok(loans) => Some(loans),
        Err(e) => {
            error!("Error parsing loans data: {}", e);
            None
        }
    }
}

async fn insert_student(db: &PgPool, draft: StudentDraft) -> Result<Student, sqlx::Error> {
    query_as(
        "INSERT INTO students (
            id, student_name, student_image, student_id_image, student_id, joining_date,
            password, emailid, phone, alternate_phone, course, university, batch,
            description, bank_details, loans
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(draft.student_name)
    .bind(draft.student_image.unwrap_or_else(|| "default.jpeg".to_owned()))
    .bind(draft.student_id_image)
    .bind(draft.student_id)
    .bind(draft.joining_date)
    .bind(draft.password)
    .bind(draft.email_id)
    .bind(draft.phone)
    .bind(draft.alternate_phone)
    .bind(draft.course)
    .bind(draft.university)
    .bind(draft.batch)
    .bind(draft.description)
    .bind(sqlx::types::Json(draft.bank_details))
    .bind(sqlx::types::Json(Vec::<Loan>::new()))
    .fetch_one(db)
    .await
}

async fn apply_patch(db: &PgPool, id: Uuid, patch: StudentPatch) -> Result<Option<Student>, sqlx::Error> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE students SET updated_at = now()");
    if let Some(value) = patch.student_name {
        builder.push(", student_name = ").push_bind(value);
    }
    if let Some(value) = patch.student_id {
        builder.push(", student_id = ").push_bind(value);
    }
    if let Some(value) = patch.joining_date {
        builder.push(", joining_date = ").push_bind(value);
    }
    if let Some(value) = patch.password {
        builder.push(", password = ").push_bind(value);
    }
    if let Some(value) = patch.email_id {
        builder.push(", emailid = ").push_bind(value);
    }
    if let Some(value) = patch.phone {
        builder.push(", phone = ").push_bind(value);
    }
    if let Some(value) = patch.alternate_phone {
        builder.push(", alternate_phone = ").push_bind(value);
    }
    if let Some(value) = patch.course {
        builder.push(", course = ").push_bind(value);
    }
    if let Some(value) = patch.university {
        builder.push(", university = ").push_bind(value);
    }
    if let Some(value) = patch.batch {
        builder.push(", batch = ").push_bind(value);
    }
    if let Some(value) = patch.description {
        builder.push(", description = ").push_bind(value);
    }
    if let Some(value) = patch.student_image {
        builder.push(", student_image = ").push_bind(value);
    }
    if let Some(value) = patch.student_id_image {
        builder.push(", student_id_image = ").push_bind(value);
    }
    if let Some(value) = patch.bank_details {
        builder.push(", bank_details = ").push_bind(sqlx::types::Json(value));
    }
    if let Some(value) = patch.loans {
        builder.push(", loans = ").push_bind(sqlx::types::Json(value));
    }
    builder.push(" WHERE id = ").push_bind(id).push(" RETURNING *");
    builder.build_query_as().fetch_optional(db).await
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::student::LoanStatus;
    use crate::uploads::StoredFile;
    use chrono::Utc;

    fn form(entries: &[(&str, &str)]) -> SubmittedForm {
        let mut form = SubmittedForm::default();
        for (name, value) in entries {
            form.push_text(*name, *value);
        }
        form
    }

    fn stored(path: &str) -> StoredFile {
        StoredFile {
            original_name: "file.png".into(),
            stored_path: path.into(),
            mime_type: "image/png".into(),
            size_bytes: 4,
        }
    }

    fn sample_student() -> Student {
        Student {
            id: Uuid::new_v4(),
            student_name: "Asha Rao".into(),
            student_image: "default.jpeg".into(),
            student_id_image: None,
            student_id: None,
            joining_date: None,
            password: "s3cret".into(),
            email_id: "asha@example.com".into(),
            phone: "9000000000".into(),
            alternate_phone: None,
            course: None,
            university: None,
            batch: None,
            description: None,
            bank_details: None,
            loans: sqlx::types::Json(Vec::new()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_loans_text_must_look_structured() {
        assert!(parse_loans("not json").is_none());
        assert!(parse_loans("[broken").is_none());
        // An object is not the loans array either.
        assert!(parse_loans("{\"amount\": 1}").is_none());
    }

    #[test]
    fn test_loans_array_parses() {
        let loans = parse_loans(
            r#"[{"amount": 1200.0, "description": "hostel", "dueDate": "2025-09-01T00:00:00Z"}]"#,
        )
        .unwrap();
        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0].status, LoanStatus::Pending);
    }

    #[test]
    fn test_bank_merge_untriggered_without_input() {
        assert!(merge_bank_details(Some(BankDetails::default()), &BankFlatFields::default(), None).is_none());
        assert!(merge_bank_details(None, &BankFlatFields::default(), None).is_none());
    }

    #[test]
    fn test_bank_merge_rewrites_all_flat_fields() {
        let existing = BankDetails {
            bank_name: "HDFC".into(),
            upi_id: "old@upi".into(),
            qr_code: Some("student/qr/old.png".into()),
            ..BankDetails::default()
        };
        let flat = BankFlatFields {
            bank_name: Some("SBI".into()),
            ..BankFlatFields::default()
        };
        let bank = merge_bank_details(Some(existing), &flat, None).unwrap();
        assert_eq!(bank.bank_name, "SBI");
        assert_eq!(bank.upi_id, "");
        assert_eq!(bank.qr_code.as_deref(), Some("student/qr/old.png"));
    }

    #[test]
    fn test_bank_merge_qr_only_keeps_existing_fields() {
        let existing = BankDetails {
            account_number: "1234567890".into(),
            ..BankDetails::default()
        };
        let bank = merge_bank_details(Some(existing), &BankFlatFields::default(), Some("student/qr/new.png".into())).unwrap();
        assert_eq!(bank.account_number, "1234567890");
        assert_eq!(bank.qr_code.as_deref(), Some("student/qr/new.png"));
    }

    #[test]
    fn test_empty_flat_fields_do_not_count_as_input() {
        let flat = BankFlatFields::from_form(&form(&[("bankName", ""), ("upiId", "")]));
        assert!(flat.is_empty());
    }

    #[test]
    fn test_draft_requires_identity_fields() {
        let err = StudentDraft::from_form(&form(&[("studentName", "Asha")]), "uploads").unwrap_err();
        match err {
            Error::ValidationError(message) => assert_eq!(message, "password is required"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_draft_collapses_bank_fields() {
        let mut f = form(&[
            ("studentName", "Asha Rao"),
            ("password", "s3cret"),
            ("emailid", "asha@example.com"),
            ("phone", "9000000000"),
            ("bankName", "SBI"),
            ("upiId", "asha@upi"),
        ]);
        f.push_file("qrCode", stored("uploads/student/qr/qrCode-1-2.png"));
        let draft = StudentDraft::from_form(&f, "uploads").unwrap();
        assert_eq!(draft.bank_details.bank_name, "SBI");
        assert_eq!(draft.bank_details.upi_id, "asha@upi");
        assert_eq!(draft.bank_details.account_number, "");
        assert_eq!(draft.bank_details.qr_code.as_deref(), Some("student/qr/qrCode-1-2.png"));
    }

    #[test]
    fn test_draft_strips_upload_root_from_image_paths() {
        let mut f = form(&[
            ("studentName", "Asha Rao"),
            ("password", "s3cret"),
            ("emailid", "asha@example.com"),
            ("phone", "9000000000"),
        ]);
        f.push_file("studentImage", stored("uploads/student/images/studentImage-1-2.png"));
        let draft = StudentDraft::from_form(&f, "uploads").unwrap();
        assert_eq!(draft.student_image.as_deref(), Some("student/images/studentImage-1-2.png"));
    }

    #[test]
    fn test_draft_accepts_image_path_sent_as_text() {
        let f = form(&[
            ("studentName", "Asha Rao"),
            ("password", "s3cret"),
            ("emailid", "asha@example.com"),
            ("phone", "9000000000"),
            ("studentImage", "student/images/existing.png"),
        ]);
        let draft = StudentDraft::from_form(&f, "uploads").unwrap();
        assert_eq!(draft.student_image.as_deref(), Some("student/images/existing.png"));
    }

    #[test]
    fn test_draft_rejects_unparseable_joining_date() {
        let f = form(&[
            ("studentName", "Asha Rao"),
            ("password", "s3cret"),
            ("emailid", "asha@example.com"),
            ("phone", "9000000000"),
            ("joiningDate", "soon"),
        ]);
        assert!(StudentDraft::from_form(&f, "uploads").is_err());
    }

    #[test]
    fn test_patch_only_touches_supplied_fields() {
        let patch = StudentPatch::from_form(&form(&[("course", "BSc")]), "uploads", &sample_student()).unwrap();
        assert_eq!(patch.course.as_deref(), Some("BSc"));
        assert!(patch.student_name.is_none());
        assert!(patch.bank_details.is_none());
        assert!(patch.loans.is_none());
    }

    #[test]
    fn test_patch_applies_empty_strings() {
        let patch = StudentPatch::from_form(&form(&[("description", "")]), "uploads", &sample_student()).unwrap();
        assert_eq!(patch.description.as_deref(), Some(""));
    }

    #[test]
    fn test_patch_accepts_image_paths_sent_as_text() {
        let patch = StudentPatch::from_form(
            &form(&[
                ("studentImage", "student/images/kept.png"),
                ("studentIdImage", "student/id-images/kept.png"),
            ]),
            "uploads",
            &sample_student(),
        )
        .unwrap();
        assert_eq!(patch.student_image.as_deref(), Some("student/images/kept.png"));
        assert_eq!(patch.student_id_image.as_deref(), Some("student/id-images/kept.png"));
    }

    #[test]
    fn test_uploaded_image_beats_the_text_path() {
        let mut f = form(&[("studentImage", "stale.png")]);
        f.push_file("studentImage", stored("uploads/student/images/studentImage-1-2.png"));
        let patch = StudentPatch::from_form(&f, "uploads", &sample_student()).unwrap();
        assert_eq!(patch.student_image.as_deref(), Some("student/images/studentImage-1-2.png"));
    }

    #[test]
    fn test_patch_drops_unparseable_loans() {
        let patch = StudentPatch::from_form(&form(&[("loans", "not json")]), "uploads", &sample_student()).unwrap();
        assert!(patch.loans.is_none());
    }

    #[test]
    fn test_patch_parses_loan_arrays() {
        let patch = StudentPatch::from_form(
            &form(&[(
                "loans",
                r#"[{"amount": 900.0, "description": "books", "dueDate": "2025-12-01T00:00:00Z", "status": "PARTIALLY_PAID"}]"#,
            )]),
            "uploads",
            &sample_student(),
        )
        .unwrap();
        let loans = patch.loans.unwrap();
        assert_eq!(loans[0].status, LoanStatus::PartiallyPaid);
    }

    #[test]
    fn test_patch_merges_bank_over_existing() {
        let mut existing = sample_student();
        existing.bank_details = Some(sqlx::types::Json(BankDetails {
            bank_name: "HDFC".into(),
            account_number: "111".into(),
            qr_code: Some("student/qr/old.png".into()),
            ..BankDetails::default()
        }));
        let patch = StudentPatch::from_form(&form(&[("accountNumber", "222")]), "uploads", &existing).unwrap();
        let bank = patch.bank_details.unwrap();
        assert_eq!(bank.account_number, "222");
        assert_eq!(bank.bank_name, "");
        assert_eq!(bank.qr_code.as_deref(), Some("student/qr/old.png"));
    }
}
