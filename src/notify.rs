use log::error;
use tokio::task::JoinHandle;

use crate::core::mailer::{Mail, Mailer};
use crate::models::student::Student;

const SIGNIN_URL: &str = "https://yourwebsite.com/student-signin";

// the outcome only ever reaches the log, account creation has already succeeded
pub fn deliver_welcome<M>(mailer: M, student: Student) -> JoinHandle<()>
where
    M: Mailer + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = mailer.send(welcome_mail(&student)).await {
            error!("Error sending email: {}", e);
        }
    })
}

fn welcome_mail(student: &Student) -> Mail {
    Mail {
        to: student.email_id.clone(),
        subject: "Your Student Account Details".to_owned(),
        html: format!(
            "<h1>Hello {},</h1>\
             <p>Welcome! Your student account has been created. Here are your login details:</p>\
             <ul>\
                 <li><strong>Email:</strong> {}</li>\
                 <li><strong>Password:</strong> {}</li>\
             </ul>\
             <p><a href=\"{}\">Click here to login</a></p>\
             <p>If you have any questions, please contact our support team.</p>\
             <p>Thank you!</p>",
            student.student_name, student.email_id, student.password, SIGNIN_URL
        ),
    }
}
