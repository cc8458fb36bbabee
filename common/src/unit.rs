//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing an entity update.
#[derive(Clone, Copy, Debug)]
pub struct Update;

/// Marker type describing an order pickup.
#[derive(Clone, Copy, Debug)]
pub struct Pickup;
