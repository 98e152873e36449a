mod codec;
mod rule;

pub use codec::*;
pub use rule::*;
