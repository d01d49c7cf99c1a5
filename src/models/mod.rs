pub mod health;
pub mod quota;
pub mod response;
pub mod template;
pub mod user;
