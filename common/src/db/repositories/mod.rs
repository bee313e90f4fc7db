// Repository layer for database operations

pub mod customer;
pub mod license;
pub mod product;
pub mod reminder_log;

pub use customer::CustomerRepository;
pub use license::LicenseRepository;
pub use product::ProductRepository;
pub use reminder_log::ReminderLogRepository;
