pub mod headers;

pub mod http_client;
