/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Client core for the historical artifacts catalog: session tracking, the liked
//! artifacts registry and confirm-then-mutate like toggling over the REST API.

pub mod config;

pub mod constants;

pub mod error;

pub mod client;

pub mod application;

pub mod presentation;

pub mod session;

pub mod storage;

pub mod transport;

pub mod utils;
