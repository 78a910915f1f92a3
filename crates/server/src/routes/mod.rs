pub mod invites;
pub mod join;
