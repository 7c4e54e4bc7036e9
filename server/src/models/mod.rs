pub mod attendance;
pub mod event;
pub mod location;
pub mod profile;
pub mod user;

pub use attendance::Attendance;
pub use event::{Event, EventFields};
pub use location::{Coordinates, Located};
pub use profile::{MemberSummary, Profile, ProfileFields};
pub use user::{Session, User};
