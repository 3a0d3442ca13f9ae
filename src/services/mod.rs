pub mod security;

pub use security::PasswordHasher;
