pub mod program;
pub mod user;

#[allow(unused_imports)]
pub mod prelude {
    pub use super::program::{self, Entity as Program};
    pub use super::user::{self, Entity as User};
}
