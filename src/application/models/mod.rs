pub mod artifact;
pub mod catalog;
pub mod like;
pub mod user;
