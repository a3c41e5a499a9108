use std::future::{ready, Ready};

use actix_web::http::header::AUTHORIZATION;
use actix_web::web::Data;
use actix_web::{FromRequest, HttpRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::tokener::{Payload, Tokener};
use crate::error::Error;
use crate::impls::tokener::jwt::JWT;

#[derive(Debug, Deserialize, Serialize)]
pub struct Claim {
    pub sub: String,
}

impl Payload for Claim {
    fn subject(&self) -> &str {
        &self.sub
    }
}

#[derive(Debug, Clone)]
pub struct StudentInfo {
    pub id: Uuid,
}

impl FromRequest for StudentInfo {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;
    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(student_from_request(req))
    }
}

fn student_from_request(req: &HttpRequest) -> Result<StudentInfo, Error> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::Unauthorized("No token provided".into()))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::Unauthorized("No token provided".into()))?;
    let tokener = req
        .app_data::<Data<JWT>>()
        .ok_or_else(|| Error::ServerError("token signer is not configured".into()))?;
    let claim: Claim = tokener.verify_token(token)?;
    let id = Uuid::parse_str(&claim.sub).map_err(|_| Error::Unauthorized("Invalid token".into()))?;
    Ok(StudentInfo { id })
}

#[cfg(test)]
mod test {
    use super::*;
    use actix_web::test::TestRequest;

    fn signer() -> JWT {
        JWT::new(b"test-secret".to_vec())
    }

    fn bearer_for(sub: &str) -> String {
        let token = signer().gen_token(&Claim { sub: sub.into() }).unwrap();
        format!("Bearer {}", token)
    }

    #[test]
    fn test_missing_header_is_unauthorized() {
        let req = TestRequest::default()
            .app_data(Data::new(signer()))
            .to_http_request();
        match student_from_request(&req).unwrap_err() {
            Error::Unauthorized(message) => assert_eq!(message, "No token provided"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_header_without_bearer_prefix_is_unauthorized() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Token abc"))
            .app_data(Data::new(signer()))
            .to_http_request();
        match student_from_request(&req).unwrap_err() {
            Error::Unauthorized(message) => assert_eq!(message, "No token provided"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer not-a-jwt"))
            .app_data(Data::new(signer()))
            .to_http_request();
        match student_from_request(&req).unwrap_err() {
            Error::JWTError(_) => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_non_uuid_subject_is_rejected() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, bearer_for("admin")))
            .app_data(Data::new(signer()))
            .to_http_request();
        match student_from_request(&req).unwrap_err() {
            Error::Unauthorized(message) => assert_eq!(message, "Invalid token"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_valid_token_resolves_the_student() {
        let id = Uuid::new_v4();
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, bearer_for(&id.to_string())))
            .app_data(Data::new(signer()))
            .to_http_request();
        let info = student_from_request(&req).unwrap();
        assert_eq!(info.id, id);
    }
}
