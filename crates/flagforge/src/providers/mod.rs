mod in_memory;

pub use in_memory::InMemoryProvider;
pub use flagforge_core::NoopProvider;
