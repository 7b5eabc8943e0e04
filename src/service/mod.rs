pub mod image_upload;
pub mod mailer;
pub mod seed;
