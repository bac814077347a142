//! Domain models for the family tree.

mod dataset;
mod id;
mod layout;
mod person;

pub use dataset::{Dataset, InitialData};
pub use id::PersonId;
pub use layout::{Bounds, Path, Point, PositionedNode, Side, TreeLayout, UnionConnector};
pub use person::{LinkRecord, Person, RawPerson, Sex};
