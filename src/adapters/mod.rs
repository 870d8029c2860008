pub mod airtable;
pub mod mail;
