//! Domain models backed by the local database.

pub mod customer;

pub use customer::{Customer, CustomerDetail, NewCustomer};
