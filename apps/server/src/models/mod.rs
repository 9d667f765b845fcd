pub mod bible_study;
pub mod event;
pub mod fellowship_event;
pub mod group;
pub mod prayer;
pub mod profile;

pub use bible_study::{BibleStudySession, CreateBibleStudySession};
pub use event::{CreateEvent, Event, EventFilter};
pub use fellowship_event::{
    CreateFellowshipEvent, FellowshipEvent, FellowshipEventFilter, FellowshipParticipant,
};
pub use group::{CreateGroup, FellowshipGroup, GroupFilter, GroupMember};
pub use prayer::{CreatePrayerRequest, PrayerFilter, PrayerRequest};
pub use profile::{default_fellowship_preferences, NewProfile, Profile, ProfileResponse};
