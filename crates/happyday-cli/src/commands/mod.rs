pub mod reminder;
pub mod run;
