//! Catalog-side collaborators that write the snapshot: recipe cost rollup and sales cost
//! locking. `seed` holds the demo menu used to bootstrap an empty snapshot.

pub mod costing;
pub mod ingest;
pub mod seed;
