// Economy Report Module
//
// CSV export of simulation results for external analysis and plotting.

pub mod csv_export;

pub use csv_export::{export_nodes_csv, export_series_csv, export_stakeholders_csv};
