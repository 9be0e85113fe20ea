// Services module - Business logic

pub mod batch_file;
pub mod card_service;
pub mod codec;
pub mod validation;
