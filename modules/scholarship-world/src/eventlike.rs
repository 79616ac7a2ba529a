/// Trait shared by every event layer: factory events, scholarship events and
/// the `ChainEvent` wrapper.
///
/// Lets the engine log and count events generically without matching on
/// every variant.
pub trait Eventlike: std::fmt::Debug + Send + Sync {
    /// The event name exactly as the contract ABI declares it.
    fn event_type(&self) -> &'static str;
}
