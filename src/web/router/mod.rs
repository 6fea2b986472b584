pub mod logout;

pub use logout::{Logout, LogoutParams};
