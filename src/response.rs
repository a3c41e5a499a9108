use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn data(data: T) -> Self {
        Envelope {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn submitted(message: &str, data: T) -> Self {
        Envelope {
            success: true,
            message: Some(message.to_owned()),
            data: Some(data),
        }
    }
}

impl Envelope<()> {
    pub fn failure(message: &str) -> Self {
        Envelope {
            success: false,
            message: Some(message.to_owned()),
            data: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Msg {
    pub message: String,
}

impl Msg {
    pub fn new(message: &str) -> Self {
        Msg {
            message: message.to_owned(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse<T> {
    pub status: u16,
    pub message: String,
    pub user: T,
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentCount {
    pub total_students: i64,
}
