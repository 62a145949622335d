pub mod balanz;
pub mod elprisen;
