/// Identifier for an agent in a [`crate::world::World`] collection.
///
/// This is an index into the owning `Vec` (starlings or predators), and is
/// only meaningful within a single simulation tick: the reap phase compacts
/// the starling collection, so ids must not be held across ticks.
pub type AgentId = usize;
