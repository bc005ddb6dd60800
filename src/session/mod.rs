pub mod interface;

pub mod session;

pub mod store;
