pub mod agenda;
pub mod dates;
pub mod markdown;
pub mod priority;
pub mod sections;

pub use priority::Priority;
pub use sections::Sections;
