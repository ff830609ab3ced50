//! Events Module
//!
//! Process-wide invalidation signals and the broadcast bus carrying them.

mod bus;

pub use bus::EventBus;

// == Cache Event ==
/// Identity-only signals that drive cache invalidation.
///
/// Events carry no payload; scopes registered for an event react to its
/// identity alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheEvent {
    /// The signed-in user's profile data changed
    UserChanged,
    /// The authentication session was replaced or ended
    SessionChanged,
    /// User preferences were updated
    PreferencesChanged,
    /// A background synchronization with the backend finished
    DataSynced,
}
