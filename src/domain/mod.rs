//! Domain layer: value objects, aggregates and change tracking.
pub mod value_objects;
pub mod aggregates;
pub mod changes;
