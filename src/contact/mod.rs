pub mod whatsapp;

pub use whatsapp::{vendor_inquiry, WhatsAppLink};
