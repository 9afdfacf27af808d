//! Providers: host collaborator traits, their in-memory implementations,
//! and the clock used for delays.

mod clock;
mod collaborators;
mod memory;

pub use clock::{ClockProvider, ImmediateClock, RealClock, SleepFuture};
pub use collaborators::{
    DataFetcher, ElementStore, FetchFuture, FetchRequest, Navigator, NoFetcher, TemplateStore,
};
pub use memory::{
    InMemoryElements, InMemoryPlayout, PlayoutCall, RecordingNavigator, StaticFetcher,
};
