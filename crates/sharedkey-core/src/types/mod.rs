mod derived;
mod reference;

pub use derived::DerivedKey;
pub use reference::{Handle, Ref, RefTarget, SlotId};
