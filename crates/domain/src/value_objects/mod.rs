//! Value objects - immutable, validated-by-construction domain values.

mod calendar;
mod evidence;
mod geo;
mod reference;
mod resources;
mod role;
mod short_code;
mod threshold;

pub use calendar::GameCalendar;
pub use evidence::Evidence;
pub use geo::{within_radius, MapPoint};
pub use reference::{CastReference, CastSource};
pub use resources::{ResourceDelta, Vitals};
pub use role::Role;
pub use short_code::{ShortCode, SHORT_CODE_ATTEMPTS, SHORT_CODE_LETTERS};
pub use threshold::{SuccessThreshold, CAST_DIE_FACES};
