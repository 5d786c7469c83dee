pub mod booking;
pub mod customer;
pub mod equipment;
pub mod period;
