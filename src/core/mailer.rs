use std::future::Future;

use crate::error::Error;

#[derive(Debug, Clone)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

pub trait Mailer {
    fn send(&self, mail: Mail) -> impl Future<Output = Result<(), Error>> + Send;
}
