pub mod chat;
pub mod form;
pub mod leads;
pub mod settings;
