pub mod jwt;
pub mod site_key;
pub mod validation;

pub use jwt::*;
pub use site_key::*;
pub use validation::*;
