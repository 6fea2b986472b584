mod user;
pub use user::User;

pub trait Identifiable<Id> {
    fn id(&self) -> Id;
}
