//! Tangle statement graph.
//!
//! One [`Statement`] is built per detected marker from a [`Catalog`] entry.
//! The [`resolver`] then matches connector zones geometrically, turning the
//! unordered marker set into a traversable program graph stored in a
//! [`Collection`] arena. Connectors refer to their targets by
//! [`StatementId`], never by reference.

pub mod catalog;
pub mod collection;
pub mod connector;
pub mod error;
pub mod report;
pub mod resolver;
pub mod statement;

pub use catalog::{Catalog, StatementTemplate};
pub use collection::Collection;
pub use connector::{Connector, ConnectorTemplate, Direction, Zone};
pub use error::{GraphError, GraphResult};
pub use report::{LayoutHint, LayoutReport};
pub use resolver::resolve;
pub use statement::{ParamValue, Statement, StatementId, StatementKind};
