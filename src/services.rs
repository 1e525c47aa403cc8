pub mod allocator;
pub mod reputation;

pub use allocator::AliasAllocator;
pub use reputation::ReputationGuard;
