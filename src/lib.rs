pub mod api;
pub mod citibike;
pub mod config;
pub mod error;
pub mod fetch;
pub mod mta;
pub mod parser;
pub mod scheduler;
pub mod snapshot;
pub mod tidbyt;
pub mod weather;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
