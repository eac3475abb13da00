pub mod auth;
pub mod cep;
pub mod clients;
pub mod dashboard;
pub mod init;
pub mod portal;
pub mod users;
