//! Controls embedded into a host form.

pub mod forward_to;
pub mod lookup;
pub mod report;

pub use self::lookup::Control;
