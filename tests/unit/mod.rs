mod common;

mod client_tests;
mod session_tests;
