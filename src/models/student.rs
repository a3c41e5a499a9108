use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

// the password is stored and echoed back as received
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub student_name: String,
    pub student_image: String,
    pub student_id_image: Option<String>,
    pub student_id: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub password: String,
    #[serde(rename = "emailid")]
    #[sqlx(rename = "emailid")]
    pub email_id: String,
    pub phone: String,
    pub alternate_phone: Option<String>,
    pub course: Option<String>,
    pub university: Option<String>,
    pub batch: Option<String>,
    pub description: Option<String>,
    pub bank_details: Option<Json<BankDetails>>,
    pub loans: Json<Vec<Loan>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BankDetails {
    pub account_number: String,
    pub account_type: String,
    pub account_holder_name: String,
    pub ifsc_code: String,
    pub bank_name: String,
    pub upi_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    pub payment_app: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    #[default]
    Pending,
    PartiallyPaid,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Upi,
    BankTransfer,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub amount: f64,
    #[serde(default = "Utc::now")]
    pub date: DateTime<Utc>,
    pub description: String,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub status: LoanStatus,
    #[serde(default)]
    pub interest_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub payment_history: Vec<LoanPayment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanPayment {
    pub amount: f64,
    #[serde(default = "Utc::now")]
    pub date: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
