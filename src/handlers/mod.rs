pub mod auth;
pub mod books;
pub mod isbn_api;
pub mod users;
