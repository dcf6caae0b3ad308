//! `pickstack-perception` – the camera-to-cube pipeline.
//!
//! Turns a raw colored point cloud into a list of cube descriptors the scan
//! orchestrator can aggregate: filter, remove the table plane, cluster, and
//! describe.
//!
//! # Modules
//!
//! - [`cloud`] – [`PointCloud`][cloud::PointCloud]: structure-of-arrays
//!   colored cloud tagged with its reference frame.
//! - [`spatial`] – [`KdTree`][spatial::KdTree]: k-d tree index for radius
//!   and k-nearest-neighbour queries.
//! - [`filters`] – voxel downsampling, mat pass-through, floor and color
//!   conditional removal.
//! - [`normals`] – per-point surface normals via k-NN covariance analysis.
//! - [`plane`] – normal-aware RANSAC table-plane segmentation and removal.
//! - [`cluster`] – Euclidean connected-component cluster extraction.
//! - [`descriptor`] – [`CubeDescriptor`][descriptor::CubeDescriptor]:
//!   centroid, extents, averaged color, and yaw per cluster.

pub mod cloud;
pub mod cluster;
pub mod descriptor;
pub mod filters;
pub mod normals;
pub mod plane;
pub mod spatial;

pub use cloud::PointCloud;
pub use cluster::extract_clusters;
pub use descriptor::{describe_cube, wrap_yaw, CubeDescriptor};
pub use filters::{color_filter, floor_filter, pass_through, voxel_downsample};
pub use normals::estimate_normals;
pub use plane::{remove_plane, segment_plane, PlaneModel, PlaneParams};
pub use spatial::KdTree;
