pub mod form;
pub mod lead;
