pub mod disk;
pub mod memory;

pub use disk::DiskFundStore;
pub use memory::MemoryFundStore;
